//! In-memory directory and role administration.

use async_trait::async_trait;
use patisserie_core::{MemberId, StaffRole};
use patisserie_error::PatisserieResult;
use patisserie_interface::{DirectoryService, RoleAdministrator};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Roles and names held in memory.
///
/// Implements both [`DirectoryService`] and [`RoleAdministrator`], so role
/// changes are visible to later lookups.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    roles: Arc<RwLock<HashMap<StaffRole, BTreeSet<MemberId>>>>,
    names: Arc<RwLock<HashMap<MemberId, String>>>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a member's display name.
    pub async fn add_member(&self, member: MemberId, name: impl Into<String>) {
        self.names.write().await.insert(member, name.into());
    }

    /// Gives `member` each of `roles`.
    pub async fn assign(&self, member: MemberId, roles: &[StaffRole]) {
        let mut held = self.roles.write().await;
        for role in roles {
            held.entry(*role).or_default().insert(member);
        }
    }
}

#[async_trait]
impl DirectoryService for InMemoryDirectory {
    async fn members_with_role(&self, role: StaffRole) -> PatisserieResult<Vec<MemberId>> {
        Ok(self
            .roles
            .read()
            .await
            .get(&role)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn has_role(&self, member: MemberId, role: StaffRole) -> PatisserieResult<bool> {
        Ok(self
            .roles
            .read()
            .await
            .get(&role)
            .is_some_and(|members| members.contains(&member)))
    }

    async fn display_name(&self, member: MemberId) -> PatisserieResult<String> {
        Ok(self
            .names
            .read()
            .await
            .get(&member)
            .cloned()
            .unwrap_or_else(|| format!("member {member}")))
    }
}

#[async_trait]
impl RoleAdministrator for InMemoryDirectory {
    async fn grant_role(&self, member: MemberId, role: StaffRole) -> PatisserieResult<()> {
        self.roles.write().await.entry(role).or_default().insert(member);
        Ok(())
    }

    async fn revoke_role(&self, member: MemberId, role: StaffRole) -> PatisserieResult<()> {
        if let Some(members) = self.roles.write().await.get_mut(&role) {
            members.remove(&member);
        }
        Ok(())
    }
}
