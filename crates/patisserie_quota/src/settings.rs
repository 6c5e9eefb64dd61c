//! Quota tunables.

use serde::{Deserialize, Serialize};

/// Quota tunables.
///
/// Missing TOML keys fall back to the defaults below.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[serde(default)]
#[builder(setter(into), default)]
pub struct QuotaSettings {
    /// Cron expression of the weekly boundary (seconds first).
    schedule: String,
    /// How long after the boundary an hourly check still counts as on time.
    check_window_minutes: i64,
    /// Minimum hours between two recorded runs.
    min_gap_hours: i64,
    /// Upper bound of the normal target.
    target_cap: u64,
    /// Group volume below which nobody is judged (with more than one member).
    min_volume: u64,
    /// Consecutive misses that cost the role.
    max_fails: u32,
    /// Longest report posted to the quota channel, in characters.
    report_limit: usize,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            schedule: "0 0 23 * * Sun".to_string(),
            check_window_minutes: 60,
            min_gap_hours: 12,
            target_cap: 30,
            min_volume: 5,
            max_fails: 2,
            report_limit: 2000,
        }
    }
}

impl QuotaSettings {
    /// Start a builder seeded with the defaults.
    pub fn builder() -> QuotaSettingsBuilder {
        QuotaSettingsBuilder::default()
    }
}
