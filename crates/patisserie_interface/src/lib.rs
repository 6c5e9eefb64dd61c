//! Trait definitions for the Patisserie engine.
//!
//! Services in `patisserie_kitchen`, `patisserie_quota` and
//! `patisserie_sweep` only see these traits. In-memory implementations live
//! in `patisserie_storage`, PostgreSQL ones in `patisserie_database`, and
//! chat adapters in `patisserie_bot`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audit;
mod backends;
mod directory;
mod ledger;
mod notify;
mod orders;
mod premium;
mod settings;
mod vacation;

pub use audit::AuditLog;
pub use backends::Backends;
pub use directory::{DirectoryService, RoleAdministrator};
pub use ledger::ActivityLedger;
pub use notify::{NotificationSink, Recipient, StaffChannel, notify_best_effort};
pub use orders::{OrderFilter, OrderStore};
pub use premium::PremiumStore;
pub use settings::{ScriptStore, WatermarkStore};
pub use vacation::VacationStore;
