//! Staff activity ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use patisserie_core::{MemberId, RoleGroup, StaffActivityRecord};
use patisserie_error::PatisserieResult;

/// Per-member counters, strikes and bans.
///
/// Records are created on first write. Every mutation is a single-key atomic
/// update; callers never read-modify-write a whole record.
#[async_trait]
pub trait ActivityLedger: Send + Sync {
    /// Loads a member's record.
    async fn get(&self, member: MemberId) -> PatisserieResult<Option<StaffActivityRecord>>;

    /// Adds one to the weekly and lifetime counters of `group`.
    async fn increment(&self, member: MemberId, group: RoleGroup) -> PatisserieResult<()>;

    /// Adds a strike and returns the post-increment total.
    async fn add_warning(&self, member: MemberId) -> PatisserieResult<u32>;

    /// Starts or overwrites a temporary suspension.
    async fn suspend_until(&self, member: MemberId, until: DateTime<Utc>)
    -> PatisserieResult<()>;

    /// Sets the permanent ban flag.
    async fn ban(&self, member: MemberId) -> PatisserieResult<()>;

    /// Clears the permanent ban flag and any suspension.
    async fn lift_ban(&self, member: MemberId) -> PatisserieResult<()>;

    /// Clears a temporary suspension that ended at or before `now`.
    ///
    /// Leaves the permanent ban flag alone. Returns whether anything changed.
    async fn clear_lapsed_suspension(
        &self,
        member: MemberId,
        now: DateTime<Utc>,
    ) -> PatisserieResult<bool>;

    /// Zeroes the weekly counter of `group` and stores its miss counter.
    async fn close_week(
        &self,
        member: MemberId,
        group: RoleGroup,
        quota_fails: u32,
    ) -> PatisserieResult<()>;
}
