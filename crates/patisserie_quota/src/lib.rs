//! Weekly staff quota processing.
//!
//! Once per weekly boundary every cook and deliverer is measured against a
//! fair-share target derived from the whole group's volume. Repeated misses
//! cost the role. A persisted watermark keeps overlapping schedulers from
//! processing the same week twice.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod boundary;
mod engine;
mod report;
mod settings;

pub use boundary::WeeklyBoundary;
pub use engine::QuotaEngine;
pub use report::{GroupProgress, GroupReport, MemberLine, QuotaReport, QuotaStatus};
pub use settings::{QuotaSettings, QuotaSettingsBuilder};
