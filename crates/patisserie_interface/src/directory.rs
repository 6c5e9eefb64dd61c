//! Role and identity lookups.

use async_trait::async_trait;
use patisserie_core::{MemberId, StaffRole};
use patisserie_error::PatisserieResult;

/// Read-only view of community roles and display names.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Current holders of `role`.
    async fn members_with_role(&self, role: StaffRole) -> PatisserieResult<Vec<MemberId>>;

    /// Whether `member` holds `role`.
    async fn has_role(&self, member: MemberId, role: StaffRole) -> PatisserieResult<bool>;

    /// Name shown for `member`.
    async fn display_name(&self, member: MemberId) -> PatisserieResult<String>;
}

/// Grants and revokes community roles.
#[async_trait]
pub trait RoleAdministrator: Send + Sync {
    /// Gives `role` to `member`.
    async fn grant_role(&self, member: MemberId, role: StaffRole) -> PatisserieResult<()>;

    /// Takes `role` from `member`.
    async fn revoke_role(&self, member: MemberId, role: StaffRole) -> PatisserieResult<()>;
}
