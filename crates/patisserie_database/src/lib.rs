//! PostgreSQL stores for Patisserie.
//!
//! Every interface trait from `patisserie_interface` has a diesel-backed
//! implementation here. Blocking diesel calls run on an r2d2 pool inside
//! `tokio::task::spawn_blocking`.
//!
//! # Example
//!
//! ```rust,ignore
//! use patisserie_database::{PostgresStores, connect_pool, run_migrations};
//!
//! let pool = connect_pool(&std::env::var("DATABASE_URL")?, 10)?;
//! run_migrations(&pool)?;
//! let stores = PostgresStores::new(pool);
//! let backends = stores.backends(sink, directory, roles, clock);
//! ```

#![forbid(unsafe_code)]

mod audit;
mod connection;
mod ledger;
mod models;
mod orders;
mod premium;
mod settings;
mod vacation;

pub mod schema;

pub use audit::PostgresAuditLog;
pub use connection::{PgPool, connect_pool, run_migrations};
pub use ledger::PostgresActivityLedger;
pub use models::{
    ActivityRow, AuditRow, OrderRow, PremiumCodeRow, PremiumGrantRow, VacationRow, member_key,
};
pub use orders::PostgresOrderStore;
pub use premium::PostgresPremiumStore;
pub use settings::{PostgresScriptStore, PostgresWatermarkStore};
pub use vacation::PostgresVacationStore;

use patisserie_core::Clock;
use patisserie_interface::{Backends, DirectoryService, NotificationSink, RoleAdministrator};
use std::sync::Arc;

/// One of every PostgreSQL store, sharing a pool.
#[derive(Debug, Clone)]
pub struct PostgresStores {
    /// Orders.
    pub orders: PostgresOrderStore,
    /// Activity ledger.
    pub ledger: PostgresActivityLedger,
    /// Vacation requests.
    pub vacations: PostgresVacationStore,
    /// Premium codes and grants.
    pub premium: PostgresPremiumStore,
    /// Delivery scripts.
    pub scripts: PostgresScriptStore,
    /// Weekly quota watermark.
    pub watermark: PostgresWatermarkStore,
    /// Order backup log.
    pub audit: PostgresAuditLog,
}

impl PostgresStores {
    /// Every store on `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            orders: PostgresOrderStore::new(pool.clone()),
            ledger: PostgresActivityLedger::new(pool.clone()),
            vacations: PostgresVacationStore::new(pool.clone()),
            premium: PostgresPremiumStore::new(pool.clone()),
            scripts: PostgresScriptStore::new(pool.clone()),
            watermark: PostgresWatermarkStore::new(pool.clone()),
            audit: PostgresAuditLog::new(pool),
        }
    }

    /// Combines the stores with the chat-side collaborators.
    pub fn backends(
        &self,
        sink: Arc<dyn NotificationSink>,
        directory: Arc<dyn DirectoryService>,
        roles: Arc<dyn RoleAdministrator>,
        clock: Arc<dyn Clock>,
    ) -> Backends {
        Backends {
            orders: Arc::new(self.orders.clone()),
            ledger: Arc::new(self.ledger.clone()),
            vacations: Arc::new(self.vacations.clone()),
            premium: Arc::new(self.premium.clone()),
            scripts: Arc::new(self.scripts.clone()),
            watermark: Arc::new(self.watermark.clone()),
            audit: Arc::new(self.audit.clone()),
            sink,
            directory,
            roles,
            clock,
        }
    }
}
