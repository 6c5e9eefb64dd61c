//! In-memory audit log.

use async_trait::async_trait;
use patisserie_core::{Order, OrderId};
use patisserie_error::PatisserieResult;
use patisserie_interface::AuditLog;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Latest order snapshot per order id, plus a write counter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<HashMap<OrderId, Order>>>,
    writes: Arc<RwLock<u64>>,
}

impl InMemoryAuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot stored for `id`.
    pub async fn entry(&self, id: &OrderId) -> Option<Order> {
        self.entries.read().await.get(id).cloned()
    }

    /// Number of distinct orders logged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when nothing was logged.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Total number of accepted writes, including overwrites.
    pub async fn writes(&self) -> u64 {
        *self.writes.read().await
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, order: &Order) -> PatisserieResult<()> {
        let mut entries = self.entries.write().await;
        if let Some(current) = entries.get(order.order_id())
            && current.revision() >= order.revision()
        {
            debug!(order_id = %order.order_id(), "Dropping stale audit entry");
            return Ok(());
        }
        entries.insert(order.order_id().clone(), order.clone());
        *self.writes.write().await += 1;
        Ok(())
    }
}
