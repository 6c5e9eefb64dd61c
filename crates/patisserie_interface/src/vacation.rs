//! Vacation persistence.

use async_trait::async_trait;
use patisserie_core::{MemberId, VacationRequest, VacationStatus};
use patisserie_error::PatisserieResult;

/// The latest vacation request of each staff member.
#[async_trait]
pub trait VacationStore: Send + Sync {
    /// Latest request of `member`.
    async fn get(&self, member: MemberId) -> PatisserieResult<Option<VacationRequest>>;

    /// Stores a new pending request, replacing any finished one.
    ///
    /// # Errors
    ///
    /// `ActionErrorKind::AlreadyActive` when the member is on vacation or
    /// already waiting for a decision.
    async fn submit(&self, request: &VacationRequest) -> PatisserieResult<()>;

    /// Replaces the member's request when its stored status is still
    /// `expected`. Returns whether the write happened.
    async fn update_if_status(
        &self,
        expected: VacationStatus,
        next: &VacationRequest,
    ) -> PatisserieResult<bool>;

    /// Requests currently in `status`.
    async fn list_by_status(&self, status: VacationStatus)
    -> PatisserieResult<Vec<VacationRequest>>;
}
