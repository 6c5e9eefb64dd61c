//! Premium codes and VIP grants.

use crate::KitchenSettings;
use patisserie_core::{MemberId, PremiumCode, PremiumGrant, StaffRole, generate_code};
use patisserie_error::{ActionError, ActionErrorKind, PatisserieResult};
use patisserie_interface::{Backends, Recipient, notify_best_effort};
use tracing::{info, instrument, warn};

/// Issues, redeems, grants and expires VIP status.
#[derive(Debug, Clone)]
pub struct PremiumService {
    backends: Backends,
    settings: KitchenSettings,
}

impl PremiumService {
    /// Create a service over `backends`.
    pub fn new(backends: Backends, settings: KitchenSettings) -> Self {
        Self { backends, settings }
    }

    /// Issues `amount` fresh codes.
    ///
    /// # Errors
    ///
    /// `OutOfRange` unless `amount` is within 1 and the batch limit.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn generate_codes(&self, owner: MemberId, amount: i64) -> PatisserieResult<Vec<String>> {
        let max = *self.settings.max_codes_per_batch();
        if !(1..=max).contains(&amount) {
            return Err(ActionError::new(ActionErrorKind::out_of_range("amount", amount, 1, max)).into());
        }

        let now = self.backends.clock.now();
        let codes: Vec<PremiumCode> = {
            let mut rng = rand::thread_rng();
            (0..amount)
                .map(|_| {
                    PremiumCode::issue(
                        generate_code(&mut rng),
                        *self.settings.premium_days(),
                        owner,
                        now,
                    )
                })
                .collect()
        };
        self.backends.premium.insert_codes(&codes).await?;
        info!(count = codes.len(), "Premium codes issued");

        Ok(codes.iter().map(|c| c.code().clone()).collect())
    }

    /// Spends `code` for `member` and starts or extends their grant.
    ///
    /// An active grant that lasts longer, or never lapses, is kept.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown codes, `DuplicateRedemption` for spent ones.
    #[instrument(skip(self, code), fields(member = %member))]
    pub async fn redeem(&self, member: MemberId, code: &str) -> PatisserieResult<PremiumGrant> {
        let now = self.backends.clock.now();
        let code = code.trim().to_uppercase();
        let (redeemed, grant) = self.backends.premium.redeem(&code, member, now).await?;
        info!(expires_at = ?grant.expires_at(), "Premium code redeemed");

        self.grant_role_best_effort(member).await;
        notify_best_effort(
            self.backends.sink.as_ref(),
            &Recipient::Member(member),
            &format!(
                "💎 **VIP Activated!** Your orders jump the queue for {} days.",
                redeemed.duration_days()
            ),
        )
        .await;
        Ok(grant)
    }

    /// Owner-granted VIP without expiry.
    #[instrument(skip(self), fields(member = %member))]
    pub async fn add_vip(&self, member: MemberId) -> PatisserieResult<PremiumGrant> {
        let grant = PremiumGrant::permanent(member);
        self.backends.premium.put_grant(&grant).await?;
        info!("VIP granted");
        self.grant_role_best_effort(member).await;
        Ok(grant)
    }

    /// Revokes VIP regardless of expiry.
    #[instrument(skip(self), fields(member = %member))]
    pub async fn remove_vip(&self, member: MemberId) -> PatisserieResult<()> {
        self.backends
            .premium
            .put_grant(&PremiumGrant::revoked(member))
            .await?;
        info!("VIP removed");
        self.revoke_role_best_effort(member).await;
        Ok(())
    }

    /// Whether `member` holds an active grant now.
    pub async fn is_vip(&self, member: MemberId) -> PatisserieResult<bool> {
        let now = self.backends.clock.now();
        Ok(self
            .backends
            .premium
            .grant(member)
            .await?
            .is_some_and(|g| g.is_active(now)))
    }

    /// Revokes every grant whose expiry has passed.
    ///
    /// Per-member failures are logged and skipped. Returns the number revoked.
    #[instrument(skip(self))]
    pub async fn expire_lapsed(&self) -> PatisserieResult<usize> {
        let now = self.backends.clock.now();
        let lapsed = self.backends.premium.lapsed_grants(now).await?;

        let mut revoked = 0;
        for grant in lapsed {
            let member = *grant.member_id();
            match self.backends.premium.revoke_if_lapsed(member, now).await {
                Ok(true) => {
                    revoked += 1;
                    info!(member = %member, "VIP grant expired");
                    self.revoke_role_best_effort(member).await;
                }
                Ok(false) => {}
                Err(e) => warn!(member = %member, error = %e, "Failed to expire VIP grant"),
            }
        }
        Ok(revoked)
    }

    async fn grant_role_best_effort(&self, member: MemberId) {
        if let Err(e) = self.backends.roles.grant_role(member, StaffRole::Vip).await {
            warn!(member = %member, error = %e, "Failed to grant VIP role");
        }
    }

    async fn revoke_role_best_effort(&self, member: MemberId) {
        if let Err(e) = self.backends.roles.revoke_role(member, StaffRole::Vip).await {
            warn!(member = %member, error = %e, "Failed to revoke VIP role");
        }
    }
}
