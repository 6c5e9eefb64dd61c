//! Read-only order views.

use crate::OrderService;
use patisserie_core::{MemberId, Order, OrderId, StaffActivityRecord};
use patisserie_error::PatisserieResult;
use patisserie_interface::OrderFilter;
use serde::Serialize;
use tracing::instrument;

/// Counters and rating average for one staff member.
#[derive(Debug, Clone, PartialEq, Serialize, derive_getters::Getters)]
pub struct StaffStats {
    /// Ledger record; zeroed when the member has none yet.
    record: StaffActivityRecord,
    /// Mean rating of the orders the member delivered.
    average_rating: Option<f64>,
    /// Number of rated orders behind the mean.
    rated_orders: usize,
}

impl OrderService {
    /// Active orders, VIP first, then oldest first.
    #[instrument(skip(self))]
    pub async fn queue(&self) -> PatisserieResult<Vec<Order>> {
        let mut orders = self.backends.orders.list(&OrderFilter::active()).await?;
        orders.sort_by(|a, b| {
            b.is_vip()
                .cmp(a.is_vip())
                .then_with(|| a.created_at().cmp(b.created_at()))
        });
        Ok(orders)
    }

    /// One order, for staff.
    ///
    /// # Errors
    ///
    /// `NotFound`.
    pub async fn info(&self, id: &OrderId) -> PatisserieResult<Order> {
        self.load(id).await
    }

    /// Weekly and lifetime counters plus average delivery rating.
    #[instrument(skip(self), fields(member = %member))]
    pub async fn stats(&self, member: MemberId) -> PatisserieResult<StaffStats> {
        let record = self
            .backends
            .ledger
            .get(member)
            .await?
            .unwrap_or_else(|| StaffActivityRecord::new(member));

        let ratings: Vec<u8> = self
            .backends
            .orders
            .list(&OrderFilter::new().with_deliverer(member))
            .await?
            .iter()
            .filter_map(|order| *order.rating())
            .collect();

        let average_rating = if ratings.is_empty() {
            None
        } else {
            let total: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
            Some(f64::from(total) / ratings.len() as f64)
        };

        Ok(StaffStats {
            record,
            average_rating,
            rated_orders: ratings.len(),
        })
    }

    /// Stores a deliverer's custom delivery message.
    #[instrument(skip(self, script), fields(member = %member))]
    pub async fn set_script(&self, member: MemberId, script: &str) -> PatisserieResult<()> {
        self.backends.scripts.set_script(member, script.trim()).await
    }
}
