//! PostgreSQL order store.

use crate::connection::{PgPool, with_conn};
use crate::models::{OrderRow, member_key};
use crate::schema::orders;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use patisserie_core::{Deliverer, MemberId, Order, OrderId};
use patisserie_error::{ActionError, ActionErrorKind, PatisserieResult, StoreError, StoreErrorKind};
use patisserie_interface::{OrderFilter, OrderStore};
use tracing::{debug, instrument};

/// Name of the partial unique index guarding one active order per customer.
const ONE_ACTIVE_INDEX: &str = "orders_one_active_per_customer";

/// Primary key constraint on `orders.order_id`.
const ORDER_KEY: &str = "orders_pkey";

/// Orders in the `orders` table.
///
/// Conditional updates filter on `order_id`, `status` and `revision`, so the
/// database serializes racing transitions.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

enum InsertOutcome {
    Inserted,
    CustomerBusy,
    IdTaken,
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(skip(self, order), fields(order_id = %order.order_id(), customer = %order.customer_id()))]
    async fn insert_if_no_active(&self, order: &Order) -> PatisserieResult<()> {
        let row = OrderRow::try_from(order)?;
        let customer = *order.customer_id();
        let order_id = order.order_id().clone();

        let outcome = with_conn(&self.pool, move |conn| {
            match diesel::insert_into(orders::table).values(&row).execute(conn) {
                Ok(_) => Ok(InsertOutcome::Inserted),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info))
                    if info.constraint_name() == Some(ONE_ACTIVE_INDEX) =>
                {
                    Ok(InsertOutcome::CustomerBusy)
                }
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info))
                    if info.constraint_name() == Some(ORDER_KEY) =>
                {
                    Ok(InsertOutcome::IdTaken)
                }
                Err(e) => Err(StoreError::from(e)),
            }
        })
        .await?;

        match outcome {
            InsertOutcome::Inserted => {
                debug!("Inserted order");
                Ok(())
            }
            InsertOutcome::CustomerBusy => Err(ActionError::new(ActionErrorKind::AlreadyActive(
                format!("{} already has an active order", customer.mention()),
            ))
            .into()),
            InsertOutcome::IdTaken => Err(StoreError::new(StoreErrorKind::DuplicateKey(format!(
                "order id {order_id}"
            )))
            .into()),
        }
    }

    async fn get(&self, id: &OrderId) -> PatisserieResult<Option<Order>> {
        let key = id.as_str().to_string();
        with_conn(&self.pool, move |conn| {
            orders::table
                .find(key)
                .select(OrderRow::as_select())
                .first(conn)
                .optional()?
                .map(Order::try_from)
                .transpose()
        })
        .await
    }

    #[instrument(skip(self, expected, next), fields(order_id = %expected.order_id(), revision = expected.revision()))]
    async fn compare_and_set(&self, expected: &Order, next: &Order) -> PatisserieResult<bool> {
        let row = OrderRow::try_from(next)?;
        let key = expected.order_id().as_str().to_string();
        let status = expected.status().to_string();
        let revision = i64::try_from(*expected.revision())
            .map_err(|_| StoreError::new(StoreErrorKind::Corrupt("revision overflows".into())))?;

        with_conn(&self.pool, move |conn| {
            let updated = diesel::update(
                orders::table
                    .filter(orders::order_id.eq(&key))
                    .filter(orders::status.eq(&status))
                    .filter(orders::revision.eq(revision)),
            )
            .set(&row)
            .execute(conn)?;
            if updated == 1 {
                return Ok(true);
            }

            let exists: i64 = orders::table
                .filter(orders::order_id.eq(&key))
                .count()
                .get_result(conn)?;
            if exists == 0 {
                return Err(StoreError::new(StoreErrorKind::NotFound));
            }
            debug!("Conditional update lost");
            Ok(false)
        })
        .await
    }

    async fn list(&self, filter: &OrderFilter) -> PatisserieResult<Vec<Order>> {
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.to_string()).collect();
        let customer = filter.customer_id.map(member_key);
        let deliverer = filter
            .delivered_by
            .map(|m: MemberId| Deliverer::Staff(m).to_storage());
        let limit = filter
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX));

        with_conn(&self.pool, move |conn| {
            let mut query = orders::table.select(OrderRow::as_select()).into_boxed();
            if !statuses.is_empty() {
                query = query.filter(orders::status.eq_any(statuses));
            }
            if let Some(customer) = customer {
                query = query.filter(orders::customer_id.eq(customer));
            }
            if let Some(deliverer) = deliverer {
                query = query.filter(orders::deliverer.eq(deliverer));
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }

            query
                .order(orders::created_at.asc())
                .load::<OrderRow>(conn)?
                .into_iter()
                .map(Order::try_from)
                .collect()
        })
        .await
    }
}
