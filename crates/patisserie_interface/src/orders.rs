//! Order persistence.

use async_trait::async_trait;
use patisserie_core::{MemberId, Order, OrderId, OrderStatus};
use patisserie_error::PatisserieResult;
use serde::{Deserialize, Serialize};

/// Persistent order records with conditional updates.
///
/// Every transition goes through [`OrderStore::compare_and_set`], so two
/// writers racing on one order cannot both succeed.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order unless its customer already holds an active one.
    ///
    /// The check and the insert are atomic.
    ///
    /// # Errors
    ///
    /// `ActionErrorKind::AlreadyActive` when an active order exists and
    /// `StoreErrorKind::DuplicateKey` when the order id is already taken.
    async fn insert_if_no_active(&self, order: &Order) -> PatisserieResult<()>;

    /// Loads one order.
    async fn get(&self, id: &OrderId) -> PatisserieResult<Option<Order>>;

    /// Replaces `expected` with `next` when the stored record still has the
    /// same status and revision as `expected`.
    ///
    /// Returns `false` when the guard fails, leaving the store untouched.
    async fn compare_and_set(&self, expected: &Order, next: &Order) -> PatisserieResult<bool>;

    /// Orders matching `filter`, oldest first.
    async fn list(&self, filter: &OrderFilter) -> PatisserieResult<Vec<Order>>;
}

/// Filter criteria for listing orders.
///
/// Empty criteria match everything; set criteria combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    /// Accepted statuses; empty accepts any.
    pub statuses: Vec<OrderStatus>,
    /// Ordering customer.
    pub customer_id: Option<MemberId>,
    /// Staff member who delivered.
    pub delivered_by: Option<MemberId>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl OrderFilter {
    /// Matches every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders in a non-terminal status.
    pub fn active() -> Self {
        Self::new().with_statuses(OrderStatus::ACTIVE)
    }

    /// Restricts to the given statuses.
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Restricts to one customer.
    pub fn with_customer(mut self, customer: MemberId) -> Self {
        self.customer_id = Some(customer);
        self
    }

    /// Restricts to orders a staff member delivered.
    pub fn with_deliverer(mut self, deliverer: MemberId) -> Self {
        self.delivered_by = Some(deliverer);
        self
    }

    /// Caps the number of results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when `order` satisfies every criterion except the limit.
    pub fn matches(&self, order: &Order) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(order.status()) {
            return false;
        }
        if let Some(customer) = self.customer_id
            && *order.customer_id() != customer
        {
            return false;
        }
        if let Some(deliverer) = self.delivered_by
            && order.deliverer().and_then(|d| d.member()) != Some(deliverer)
        {
            return false;
        }
        true
    }
}
