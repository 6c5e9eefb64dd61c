//! The full set of collaborators a service runs against.

use crate::{
    ActivityLedger, AuditLog, DirectoryService, NotificationSink, OrderStore, PremiumStore,
    RoleAdministrator, ScriptStore, VacationStore, WatermarkStore,
};
use patisserie_core::Clock;
use std::sync::Arc;

/// Shared handles to every store, sink and directory.
///
/// Cloning is cheap; all services in one process share one `Backends`.
#[derive(Clone)]
pub struct Backends {
    /// Orders.
    pub orders: Arc<dyn OrderStore>,
    /// Activity ledger.
    pub ledger: Arc<dyn ActivityLedger>,
    /// Vacation requests.
    pub vacations: Arc<dyn VacationStore>,
    /// Premium codes and grants.
    pub premium: Arc<dyn PremiumStore>,
    /// Delivery scripts.
    pub scripts: Arc<dyn ScriptStore>,
    /// Weekly quota watermark.
    pub watermark: Arc<dyn WatermarkStore>,
    /// Order backup log.
    pub audit: Arc<dyn AuditLog>,
    /// Outbound notifications.
    pub sink: Arc<dyn NotificationSink>,
    /// Role and name lookups.
    pub directory: Arc<dyn DirectoryService>,
    /// Role changes.
    pub roles: Arc<dyn RoleAdministrator>,
    /// Wall time.
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
