//! Staff vacation workflow.

use patisserie_core::{MemberId, StaffRole, VacationRequest, VacationStatus};
use patisserie_error::{ActionError, ActionErrorKind, PatisserieResult};
use patisserie_interface::{Backends, Recipient, StaffChannel, notify_best_effort};
use tracing::{info, instrument, warn};

/// Request, approve, deny and expire vacations.
///
/// An active vacation carries the quota-bypass role.
#[derive(Debug, Clone)]
pub struct VacationService {
    backends: Backends,
}

impl VacationService {
    /// Create a service over `backends`.
    pub fn new(backends: Backends) -> Self {
        Self { backends }
    }

    /// Files a request for management.
    ///
    /// # Errors
    ///
    /// `OutOfRange` outside 1 to 14 days, `AlreadyActive` when a request is
    /// pending or running.
    #[instrument(skip(self, reason), fields(member = %member))]
    pub async fn request(
        &self,
        member: MemberId,
        days: i64,
        reason: &str,
    ) -> PatisserieResult<VacationRequest> {
        let request = VacationRequest::request(member, days, reason, self.backends.clock.now())?;
        self.backends.vacations.submit(&request).await?;
        info!(days, "Vacation requested");

        self.notify(
            Recipient::Staff(StaffChannel::Vacation),
            &format!(
                "🌴 **Vacation Request** from {}\nDuration: {} days\nReason: {}\nUse `/vacation approve`, `/vacation edit` or `/vacation deny`.",
                member.mention(),
                days,
                reason
            ),
        )
        .await;
        Ok(request)
    }

    /// Approves the pending request, optionally with a different length.
    ///
    /// # Errors
    ///
    /// `NotFound` without a request, `InvalidState` when it is not pending,
    /// `OutOfRange` for a bad edited length.
    #[instrument(skip(self), fields(member = %member, approver = %approver))]
    pub async fn approve(
        &self,
        member: MemberId,
        approver: MemberId,
        edited_days: Option<i64>,
    ) -> PatisserieResult<VacationRequest> {
        let current = self.load(member).await?;
        let now = self.backends.clock.now();
        let active = current.approve(edited_days, now)?;
        self.commit(VacationStatus::Pending, &active).await?;
        info!(days = active.days(), "Vacation approved");

        if let Err(e) = self
            .backends
            .roles
            .grant_role(member, StaffRole::QuotaBypass)
            .await
        {
            warn!(error = %e, "Failed to grant quota bypass role");
        }

        let ends = active
            .end_date()
            .as_ref()
            .map(|end| end.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_default();
        let edited = if edited_days.is_some() { " (Modified)" } else { "" };
        self.notify(
            Recipient::Member(member),
            &format!(
                "🌴 **Vacation Approved{}!**\nDuration: {} days\nEnds: {}",
                edited,
                active.days(),
                ends
            ),
        )
        .await;
        self.notify(
            Recipient::Staff(StaffChannel::Vacation),
            &format!(
                "✅ Vacation for {} approved by {} ({} days).",
                member.mention(),
                approver.mention(),
                active.days()
            ),
        )
        .await;
        Ok(active)
    }

    /// Refuses the pending request.
    ///
    /// # Errors
    ///
    /// `NotFound` or `InvalidState`.
    #[instrument(skip(self, reason), fields(member = %member, approver = %approver))]
    pub async fn deny(
        &self,
        member: MemberId,
        approver: MemberId,
        reason: &str,
    ) -> PatisserieResult<VacationRequest> {
        let current = self.load(member).await?;
        let denied = current.deny(reason)?;
        self.commit(VacationStatus::Pending, &denied).await?;
        info!("Vacation denied");

        self.notify(
            Recipient::Member(member),
            &format!("❌ **Vacation Request Denied**\n**Reason:** {}", reason),
        )
        .await;
        self.notify(
            Recipient::Staff(StaffChannel::Vacation),
            &format!(
                "❌ Vacation for {} denied by {}.",
                member.mention(),
                approver.mention()
            ),
        )
        .await;
        Ok(denied)
    }

    /// Whether `member` is currently on an approved vacation.
    pub async fn is_on_vacation(&self, member: MemberId) -> PatisserieResult<bool> {
        let now = self.backends.clock.now();
        Ok(self
            .backends
            .vacations
            .get(member)
            .await?
            .is_some_and(|v| *v.status() == VacationStatus::Active && !v.is_overdue(now)))
    }

    /// Ends every active vacation past its end date.
    ///
    /// Per-member failures are logged and skipped. Returns the number ended.
    #[instrument(skip(self))]
    pub async fn expire_overdue(&self) -> PatisserieResult<usize> {
        let now = self.backends.clock.now();
        let active = self
            .backends
            .vacations
            .list_by_status(VacationStatus::Active)
            .await?;

        let mut ended = 0;
        for vacation in active.into_iter().filter(|v| v.is_overdue(now)) {
            let member = *vacation.staff_id();
            match self
                .backends
                .vacations
                .update_if_status(VacationStatus::Active, &vacation.expire())
                .await
            {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(member = %member, error = %e, "Failed to expire vacation");
                    continue;
                }
            }
            ended += 1;
            info!(member = %member, "Vacation ended");

            if let Err(e) = self
                .backends
                .roles
                .revoke_role(member, StaffRole::QuotaBypass)
                .await
            {
                warn!(member = %member, error = %e, "Failed to revoke quota bypass role");
            }
            self.notify(
                Recipient::Member(member),
                "👋 **Welcome Back!** Your vacation has ended.",
            )
            .await;
        }
        Ok(ended)
    }

    async fn load(&self, member: MemberId) -> PatisserieResult<VacationRequest> {
        self.backends.vacations.get(member).await?.ok_or_else(|| {
            ActionError::new(ActionErrorKind::NotFound(format!(
                "vacation request for {}",
                member
            )))
            .into()
        })
    }

    async fn commit(
        &self,
        expected: VacationStatus,
        next: &VacationRequest,
    ) -> PatisserieResult<()> {
        if self
            .backends
            .vacations
            .update_if_status(expected, next)
            .await?
        {
            Ok(())
        } else {
            Err(ActionError::new(ActionErrorKind::InvalidState(format!(
                "vacation request is no longer {}",
                expected
            )))
            .into())
        }
    }

    async fn notify(&self, to: Recipient, message: &str) {
        notify_best_effort(self.backends.sink.as_ref(), &to, message).await;
    }
}
