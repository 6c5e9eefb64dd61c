//! In-memory activity ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use patisserie_core::{MemberId, RoleGroup, StaffActivityRecord};
use patisserie_error::PatisserieResult;
use patisserie_interface::ActivityLedger;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Activity records keyed by member.
#[derive(Debug, Clone, Default)]
pub struct InMemoryActivityLedger {
    records: Arc<RwLock<HashMap<MemberId, StaffActivityRecord>>>,
}

impl InMemoryActivityLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record, for seeding fixtures.
    pub async fn seed(&self, record: StaffActivityRecord) {
        self.records
            .write()
            .await
            .insert(*record.member_id(), record);
    }

    async fn update<T: Send>(
        &self,
        member: MemberId,
        f: impl FnOnce(&mut StaffActivityRecord) -> T + Send,
    ) -> T {
        let mut records = self.records.write().await;
        let record = records
            .entry(member)
            .or_insert_with(|| StaffActivityRecord::new(member));
        f(record)
    }
}

#[async_trait]
impl ActivityLedger for InMemoryActivityLedger {
    async fn get(&self, member: MemberId) -> PatisserieResult<Option<StaffActivityRecord>> {
        Ok(self.records.read().await.get(&member).cloned())
    }

    async fn increment(&self, member: MemberId, group: RoleGroup) -> PatisserieResult<()> {
        self.update(member, |r| r.increment(group)).await;
        Ok(())
    }

    async fn add_warning(&self, member: MemberId) -> PatisserieResult<u32> {
        Ok(self.update(member, |r| r.add_warning()).await)
    }

    async fn suspend_until(
        &self,
        member: MemberId,
        until: DateTime<Utc>,
    ) -> PatisserieResult<()> {
        self.update(member, |r| r.suspend_until(until)).await;
        Ok(())
    }

    async fn ban(&self, member: MemberId) -> PatisserieResult<()> {
        self.update(member, |r| r.ban()).await;
        Ok(())
    }

    async fn lift_ban(&self, member: MemberId) -> PatisserieResult<()> {
        self.update(member, |r| r.lift_ban()).await;
        Ok(())
    }

    async fn clear_lapsed_suspension(
        &self,
        member: MemberId,
        now: DateTime<Utc>,
    ) -> PatisserieResult<bool> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&member) else {
            return Ok(false);
        };
        if !record.has_lapsed_suspension(now) {
            return Ok(false);
        }
        record.clear_suspension();
        Ok(true)
    }

    async fn close_week(
        &self,
        member: MemberId,
        group: RoleGroup,
        quota_fails: u32,
    ) -> PatisserieResult<()> {
        self.update(member, |r| r.close_week(group, quota_fails))
            .await;
        Ok(())
    }
}
