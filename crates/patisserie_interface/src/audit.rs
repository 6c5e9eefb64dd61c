//! Order backup log.

use async_trait::async_trait;
use patisserie_core::Order;
use patisserie_error::PatisserieResult;

/// Summary log of orders, keyed by order id.
///
/// Writing the same order twice leaves one entry holding the latest state.
/// Entries are ordered by the order's revision, not by arrival.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Inserts the summary of `order`, or replaces an entry with a lower
    /// revision. A stale write is dropped.
    async fn record(&self, order: &Order) -> PatisserieResult<()>;
}
