//! In-memory adapters for every Patisserie interface trait.
//!
//! Each adapter keeps its data behind an `Arc<RwLock<..>>`, so clones share
//! state. Everything is lost on drop. Used by tests and single-process runs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audit;
mod directory;
mod ledger;
mod notify;
mod orders;
mod premium;
mod settings;
mod stack;
mod vacation;

pub use audit::InMemoryAuditLog;
pub use directory::InMemoryDirectory;
pub use ledger::InMemoryActivityLedger;
pub use notify::RecordingSink;
pub use orders::InMemoryOrderStore;
pub use premium::InMemoryPremiumStore;
pub use settings::{InMemoryScriptStore, InMemoryWatermarkStore};
pub use stack::InMemoryStack;
pub use vacation::InMemoryVacationStore;
