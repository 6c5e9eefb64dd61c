//! In-memory vacation store.

use async_trait::async_trait;
use patisserie_core::{MemberId, VacationRequest, VacationStatus};
use patisserie_error::{ActionError, ActionErrorKind, PatisserieResult};
use patisserie_interface::VacationStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Latest vacation request per member.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVacationStore {
    requests: Arc<RwLock<HashMap<MemberId, VacationRequest>>>,
}

impl InMemoryVacationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VacationStore for InMemoryVacationStore {
    async fn get(&self, member: MemberId) -> PatisserieResult<Option<VacationRequest>> {
        Ok(self.requests.read().await.get(&member).cloned())
    }

    async fn submit(&self, request: &VacationRequest) -> PatisserieResult<()> {
        let mut requests = self.requests.write().await;
        if let Some(existing) = requests.get(request.staff_id())
            && matches!(
                existing.status(),
                VacationStatus::Active | VacationStatus::Pending
            )
        {
            return Err(ActionError::new(ActionErrorKind::AlreadyActive(format!(
                "vacation request is {}",
                existing.status()
            )))
            .into());
        }
        requests.insert(*request.staff_id(), request.clone());
        Ok(())
    }

    async fn update_if_status(
        &self,
        expected: VacationStatus,
        next: &VacationRequest,
    ) -> PatisserieResult<bool> {
        let mut requests = self.requests.write().await;
        match requests.get_mut(next.staff_id()) {
            Some(current) if *current.status() == expected => {
                *current = next.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_status(
        &self,
        status: VacationStatus,
    ) -> PatisserieResult<Vec<VacationRequest>> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|r| *r.status() == status)
            .cloned()
            .collect())
    }
}
