//! Premium code and grant persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use patisserie_core::{MemberId, PremiumCode, PremiumGrant};
use patisserie_error::PatisserieResult;

/// Premium codes and VIP grants.
#[async_trait]
pub trait PremiumStore: Send + Sync {
    /// Stores freshly issued codes.
    async fn insert_codes(&self, codes: &[PremiumCode]) -> PatisserieResult<()>;

    /// Atomically moves `code` from unused to redeemed by `member` and
    /// stores the member's grant in the same step.
    ///
    /// The grant follows [`PremiumGrant::after_redeeming`], so an active
    /// grant is never shortened.
    ///
    /// # Errors
    ///
    /// `ActionErrorKind::NotFound` for unknown codes and
    /// `ActionErrorKind::DuplicateRedemption` for spent ones.
    async fn redeem(
        &self,
        code: &str,
        member: MemberId,
        now: DateTime<Utc>,
    ) -> PatisserieResult<(PremiumCode, PremiumGrant)>;

    /// A member's grant, if any was ever stored.
    async fn grant(&self, member: MemberId) -> PatisserieResult<Option<PremiumGrant>>;

    /// Inserts or replaces a member's grant.
    async fn put_grant(&self, grant: &PremiumGrant) -> PatisserieResult<()>;

    /// Grants still flagged VIP whose expiry is before `now`.
    async fn lapsed_grants(&self, now: DateTime<Utc>) -> PatisserieResult<Vec<PremiumGrant>>;

    /// Revokes a grant only while it is still lapsed at `now`.
    ///
    /// Returns whether the grant was revoked.
    async fn revoke_if_lapsed(&self, member: MemberId, now: DateTime<Utc>)
    -> PatisserieResult<bool>;
}
