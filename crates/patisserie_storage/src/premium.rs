//! In-memory premium store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use patisserie_core::{CodeStatus, MemberId, PremiumCode, PremiumGrant};
use patisserie_error::{
    ActionError, ActionErrorKind, PatisserieResult, StoreError, StoreErrorKind,
};
use patisserie_interface::PremiumStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Codes keyed by text, grants keyed by member.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPremiumStore {
    codes: Arc<RwLock<HashMap<String, PremiumCode>>>,
    grants: Arc<RwLock<HashMap<MemberId, PremiumGrant>>>,
}

impl InMemoryPremiumStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a code by text.
    pub async fn code(&self, code: &str) -> Option<PremiumCode> {
        self.codes.read().await.get(code).cloned()
    }
}

#[async_trait]
impl PremiumStore for InMemoryPremiumStore {
    async fn insert_codes(&self, new_codes: &[PremiumCode]) -> PatisserieResult<()> {
        let mut codes = self.codes.write().await;
        if let Some(dup) = new_codes.iter().find(|c| codes.contains_key(c.code())) {
            return Err(StoreError::new(StoreErrorKind::Query(format!(
                "duplicate code {}",
                dup.code()
            )))
            .into());
        }
        for code in new_codes {
            codes.insert(code.code().clone(), code.clone());
        }
        Ok(())
    }

    async fn redeem(
        &self,
        code: &str,
        member: MemberId,
        now: DateTime<Utc>,
    ) -> PatisserieResult<(PremiumCode, PremiumGrant)> {
        let mut codes = self.codes.write().await;
        let mut grants = self.grants.write().await;
        let Some(stored) = codes.get_mut(code) else {
            return Err(ActionError::new(ActionErrorKind::NotFound(format!("code {code}"))).into());
        };
        if *stored.status() != CodeStatus::Unused {
            return Err(ActionError::new(ActionErrorKind::DuplicateRedemption(code.to_string()))
                .into());
        }
        *stored = stored.redeemed(member, now);
        let grant = PremiumGrant::after_redeeming(member, grants.get(&member), stored, now);
        grants.insert(member, grant.clone());
        Ok((stored.clone(), grant))
    }

    async fn grant(&self, member: MemberId) -> PatisserieResult<Option<PremiumGrant>> {
        Ok(self.grants.read().await.get(&member).cloned())
    }

    async fn put_grant(&self, grant: &PremiumGrant) -> PatisserieResult<()> {
        self.grants
            .write()
            .await
            .insert(*grant.member_id(), grant.clone());
        Ok(())
    }

    async fn lapsed_grants(&self, now: DateTime<Utc>) -> PatisserieResult<Vec<PremiumGrant>> {
        Ok(self
            .grants
            .read()
            .await
            .values()
            .filter(|g| g.is_lapsed(now))
            .cloned()
            .collect())
    }

    async fn revoke_if_lapsed(
        &self,
        member: MemberId,
        now: DateTime<Utc>,
    ) -> PatisserieResult<bool> {
        let mut grants = self.grants.write().await;
        match grants.get_mut(&member) {
            Some(grant) if grant.is_lapsed(now) => {
                *grant = PremiumGrant::revoked(member);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
