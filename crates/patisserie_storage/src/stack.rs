//! A complete in-memory backend.

use crate::{
    InMemoryActivityLedger, InMemoryAuditLog, InMemoryDirectory, InMemoryOrderStore,
    InMemoryPremiumStore, InMemoryScriptStore, InMemoryVacationStore, InMemoryWatermarkStore,
    RecordingSink,
};
use patisserie_core::Clock;
use patisserie_interface::Backends;
use std::sync::Arc;

/// One of every in-memory adapter.
///
/// Fields stay concrete so tests can seed and inspect them; [`Self::backends`]
/// hands out the trait-object view the services use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStack {
    /// Orders.
    pub orders: InMemoryOrderStore,
    /// Activity ledger.
    pub ledger: InMemoryActivityLedger,
    /// Vacation requests.
    pub vacations: InMemoryVacationStore,
    /// Premium codes and grants.
    pub premium: InMemoryPremiumStore,
    /// Delivery scripts.
    pub scripts: InMemoryScriptStore,
    /// Weekly quota watermark.
    pub watermark: InMemoryWatermarkStore,
    /// Order backup log.
    pub audit: InMemoryAuditLog,
    /// Recorded notifications.
    pub sink: RecordingSink,
    /// Roles and names.
    pub directory: InMemoryDirectory,
}

impl InMemoryStack {
    /// Empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trait-object view sharing this stack's state.
    pub fn backends(&self, clock: Arc<dyn Clock>) -> Backends {
        Backends {
            orders: Arc::new(self.orders.clone()),
            ledger: Arc::new(self.ledger.clone()),
            vacations: Arc::new(self.vacations.clone()),
            premium: Arc::new(self.premium.clone()),
            scripts: Arc::new(self.scripts.clone()),
            watermark: Arc::new(self.watermark.clone()),
            audit: Arc::new(self.audit.clone()),
            sink: Arc::new(self.sink.clone()),
            directory: Arc::new(self.directory.clone()),
            roles: Arc::new(self.directory.clone()),
            clock,
        }
    }
}
