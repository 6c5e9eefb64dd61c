//! In-memory order store.

use async_trait::async_trait;
use patisserie_core::{Order, OrderId};
use patisserie_error::{
    ActionError, ActionErrorKind, PatisserieResult, StoreError, StoreErrorKind,
};
use patisserie_interface::{OrderFilter, OrderStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Orders in a `HashMap` keyed by order id.
///
/// The write lock makes the active-order check and conditional updates atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// True when no order is stored.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Inserts or replaces a record without any guard, for seeding fixtures.
    ///
    /// # Errors
    ///
    /// Refuses records that fail [`Order::validate`].
    pub async fn seed(&self, order: Order) -> PatisserieResult<()> {
        check(&order)?;
        self.orders
            .write()
            .await
            .insert(order.order_id().clone(), order);
        Ok(())
    }
}

fn check(order: &Order) -> Result<(), StoreError> {
    order
        .validate()
        .map_err(|reason| StoreError::new(StoreErrorKind::Corrupt(reason)))
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_if_no_active(&self, order: &Order) -> PatisserieResult<()> {
        check(order)?;
        let mut orders = self.orders.write().await;

        if let Some(active) = orders
            .values()
            .find(|o| o.customer_id() == order.customer_id() && o.status().is_active())
        {
            return Err(ActionError::new(ActionErrorKind::AlreadyActive(format!(
                "order {} is still {}",
                active.order_id(),
                active.status()
            )))
            .into());
        }
        if orders.contains_key(order.order_id()) {
            return Err(StoreError::new(StoreErrorKind::DuplicateKey(format!(
                "order id {}",
                order.order_id()
            )))
            .into());
        }

        orders.insert(order.order_id().clone(), order.clone());
        debug!(order_id = %order.order_id(), "Inserted order");
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> PatisserieResult<Option<Order>> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn compare_and_set(&self, expected: &Order, next: &Order) -> PatisserieResult<bool> {
        check(next)?;
        let mut orders = self.orders.write().await;

        let Some(current) = orders.get_mut(expected.order_id()) else {
            return Err(StoreError::new(StoreErrorKind::NotFound).into());
        };
        if current.status() != expected.status() || current.revision() != expected.revision() {
            debug!(
                order_id = %expected.order_id(),
                expected_revision = expected.revision(),
                actual_revision = current.revision(),
                "Conditional update lost"
            );
            return Ok(false);
        }

        *current = next.clone();
        Ok(true)
    }

    async fn list(&self, filter: &OrderFilter) -> PatisserieResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut results: Vec<Order> = orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        results.sort_by_key(|o| *o.created_at());
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        Ok(results)
    }
}
