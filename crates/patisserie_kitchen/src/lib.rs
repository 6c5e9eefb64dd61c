//! Actor-facing services of the Patisserie engine.
//!
//! - [`OrderService`]: order lifecycle, cook timer, strikes and queries
//! - [`PremiumService`]: code issue and redemption, VIP grants
//! - [`VacationService`]: staff vacation workflow
//!
//! Services validate through `patisserie_core`, commit through the stores in
//! [`Backends`](patisserie_interface::Backends) and notify best-effort. A
//! failed notification never undoes a committed change.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod moderation;
mod orders;
mod premium;
mod queries;
mod settings;
mod vacation;

pub use moderation::WarningIssued;
pub use orders::{CookStarted, DeliveryTicket, OrderService};
pub use premium::PremiumService;
pub use queries::StaffStats;
pub use settings::{KitchenSettings, KitchenSettingsBuilder};
pub use vacation::VacationService;
