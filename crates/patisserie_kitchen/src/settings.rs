//! Service tunables.

use patisserie_core::{COOK_DURATION, EscalationPolicy};
use std::time::Duration;

/// Tunables shared by the kitchen services.
///
/// # Examples
///
/// ```
/// use patisserie_kitchen::KitchenSettings;
/// use std::time::Duration;
///
/// let settings = KitchenSettings::builder()
///     .cook_duration(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// assert_eq!(*settings.premium_days(), 30);
/// ```
#[derive(Debug, Clone, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), default)]
pub struct KitchenSettings {
    /// How long an order stays in `cooking`.
    cook_duration: Duration,
    /// Strike escalation thresholds.
    escalation: EscalationPolicy,
    /// Appended to strike notices that carry a suspension.
    appeal_notice: Option<String>,
    /// Length of a redeemed premium grant.
    premium_days: u32,
    /// Most codes one `generate` call may issue.
    max_codes_per_batch: i64,
}

impl Default for KitchenSettings {
    fn default() -> Self {
        Self {
            cook_duration: COOK_DURATION,
            escalation: EscalationPolicy::default(),
            appeal_notice: None,
            premium_days: 30,
            max_codes_per_batch: 50,
        }
    }
}

impl KitchenSettings {
    /// Start a builder seeded with the defaults.
    pub fn builder() -> KitchenSettingsBuilder {
        KitchenSettingsBuilder::default()
    }
}
