//! Periodic maintenance for the Patisserie engine.
//!
//! Five independent sweeps run on their own tickers:
//! - **unclaim**: stale claims go back to `pending`
//! - **delivery**: overdue `ready` orders are delivered by the system
//! - **premium expiry**: lapsed VIP grants are revoked
//! - **vacation expiry**: finished vacations end and drop the bypass role
//! - **quota**: the weekly quota run, when its boundary is due
//!
//! Each sweep is a [`SweepBot`] fed by a ticker over an `mpsc` channel.
//! Every sweep is safe to repeat; a second pass finds nothing left to do.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bot;
mod metrics;
mod settings;
mod sweeper;

pub use bot::{SweepBot, SweepMessage, SweepRunner};
pub use metrics::{MetricsSnapshot, SweepMetricSnapshot, SweepMetrics};
pub use settings::{SweepSettings, SweepSettingsBuilder};
pub use sweeper::{SweepKind, SweepOutcome, Sweeper};
