//! Error types for the Patisserie order fulfillment engine.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! [`ActionError`] is special: it is the rejection reported back to the actor
//! who issued a command, so its `Display` output is meant to be read by people.
//!
//! # Examples
//!
//! ```
//! use patisserie_error::{ActionError, ActionErrorKind, PatisserieResult};
//!
//! fn claim() -> PatisserieResult<()> {
//!     Err(ActionError::new(ActionErrorKind::InvalidState(
//!         "order is not pending".to_string(),
//!     )))?
//! }
//!
//! let err = claim().unwrap_err();
//! assert!(matches!(
//!     err.action_kind(),
//!     Some(ActionErrorKind::InvalidState(_))
//! ));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod config;
mod error;
mod notify;
mod schedule;
mod store;

pub use action::{ActionError, ActionErrorKind};
pub use config::ConfigError;
pub use error::{PatisserieError, PatisserieErrorKind, PatisserieResult};
pub use notify::{NotifyError, NotifyErrorKind};
pub use schedule::ScheduleError;
pub use store::{StoreError, StoreErrorKind};
