//! PostgreSQL order backup log.

use crate::connection::{PgPool, with_conn};
use crate::models::AuditRow;
use crate::schema::order_audit;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::query_dsl::methods::FilterDsl;
use diesel::upsert::excluded;
use patisserie_core::{Order, OrderId};
use patisserie_error::{PatisserieResult, StoreError, StoreErrorKind};
use patisserie_interface::AuditLog;
use tracing::{debug, instrument};

/// Latest JSON snapshot of each order in `order_audit`.
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    /// Log on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Snapshot stored for `id`.
    pub async fn entry(&self, id: &OrderId) -> PatisserieResult<Option<Order>> {
        let key = id.as_str().to_string();
        with_conn(&self.pool, move |conn| {
            order_audit::table
                .find(key)
                .select(AuditRow::as_select())
                .first(conn)
                .optional()?
                .map(|row| serde_json::from_value(row.summary).map_err(StoreError::from))
                .transpose()
        })
        .await
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    #[instrument(skip(self, order), fields(order_id = %order.order_id(), status = %order.status()))]
    async fn record(&self, order: &Order) -> PatisserieResult<()> {
        let row = AuditRow {
            order_id: order.order_id().as_str().to_string(),
            revision: i64::try_from(*order.revision()).map_err(|_| {
                StoreError::new(StoreErrorKind::Corrupt("revision overflows".into()))
            })?,
            summary: serde_json::to_value(order).map_err(StoreError::from)?,
            updated_at: chrono::Utc::now(),
        };
        with_conn(&self.pool, move |conn| {
            let written = diesel::insert_into(order_audit::table)
                .values(&row)
                .on_conflict(order_audit::order_id)
                .do_update()
                .set((
                    order_audit::revision.eq(excluded(order_audit::revision)),
                    order_audit::summary.eq(excluded(order_audit::summary)),
                    order_audit::updated_at.eq(excluded(order_audit::updated_at)),
                ))
                .filter(order_audit::revision.lt(excluded(order_audit::revision)))
                .execute(conn)?;
            if written == 0 {
                debug!("Dropping stale audit entry");
            }
            Ok(())
        })
        .await
    }
}
