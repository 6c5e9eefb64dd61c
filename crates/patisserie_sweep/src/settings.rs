//! Sweep cadence and thresholds.

use patisserie_core::{AUTO_DELIVER_AFTER, AUTO_UNCLAIM_AFTER, COOK_DURATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::SweepKind;

/// How often each sweep runs and when orders count as stale.
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
pub struct SweepSettings {
    /// Seconds between unclaim sweeps.
    unclaim_interval_secs: u64,
    /// Seconds between stale cooking sweeps.
    cooking_interval_secs: u64,
    /// Seconds between delivery sweeps.
    delivery_interval_secs: u64,
    /// Seconds between premium expiry sweeps.
    premium_interval_secs: u64,
    /// Seconds between vacation expiry sweeps.
    vacation_interval_secs: u64,
    /// Seconds between quota boundary checks.
    quota_interval_secs: u64,
    /// Age at which a claim is released.
    unclaim_after_secs: u64,
    /// Cooking age at which an order is made ready without its timer.
    cook_after_secs: u64,
    /// Age at which a ready order is auto-delivered.
    deliver_after_secs: u64,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            unclaim_interval_secs: 60,
            cooking_interval_secs: 60,
            delivery_interval_secs: 60,
            premium_interval_secs: 3600,
            vacation_interval_secs: 3600,
            quota_interval_secs: 3600,
            unclaim_after_secs: AUTO_UNCLAIM_AFTER.as_secs(),
            cook_after_secs: COOK_DURATION.as_secs(),
            deliver_after_secs: AUTO_DELIVER_AFTER.as_secs(),
        }
    }
}

impl SweepSettings {
    /// Start a builder seeded with the defaults.
    pub fn builder() -> SweepSettingsBuilder {
        SweepSettingsBuilder::default()
    }

    /// Ticker period for `kind`.
    pub fn interval(&self, kind: SweepKind) -> Duration {
        let secs = match kind {
            SweepKind::Unclaim => self.unclaim_interval_secs,
            SweepKind::Cooking => self.cooking_interval_secs,
            SweepKind::Delivery => self.delivery_interval_secs,
            SweepKind::PremiumExpiry => self.premium_interval_secs,
            SweepKind::VacationExpiry => self.vacation_interval_secs,
            SweepKind::Quota => self.quota_interval_secs,
        };
        Duration::from_secs(secs.max(1))
    }

    /// Claim age that triggers an unclaim.
    pub fn unclaim_after(&self) -> Duration {
        Duration::from_secs(self.unclaim_after_secs)
    }

    /// Cooking age that finishes an order whose timer was lost.
    pub fn cook_after(&self) -> Duration {
        Duration::from_secs(self.cook_after_secs)
    }

    /// Ready age that triggers an auto-delivery.
    pub fn deliver_after(&self) -> Duration {
        Duration::from_secs(self.deliver_after_secs)
    }
}
