//! Strike escalation policy.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What a new strike costs the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sanction {
    /// Notice only.
    Strike {
        /// Strike count after the increment.
        warnings: u32,
    },
    /// Temporary suspension.
    Suspended {
        /// Strike count after the increment.
        warnings: u32,
        /// End of the suspension.
        until: DateTime<Utc>,
    },
    /// Permanent ban.
    PermanentBan {
        /// Strike count after the increment.
        warnings: u32,
    },
}

impl Sanction {
    /// Strike count after the increment.
    pub fn warnings(&self) -> u32 {
        match self {
            Sanction::Strike { warnings }
            | Sanction::Suspended { warnings, .. }
            | Sanction::PermanentBan { warnings } => *warnings,
        }
    }
}

/// Maps lifetime strike counts to sanctions.
///
/// Suspensions trigger on exact counts; the permanent ban on any count at or
/// above its threshold.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use patisserie_core::{EscalationPolicy, Sanction};
///
/// let policy = EscalationPolicy::default();
/// let now = Utc::now();
/// assert!(matches!(policy.evaluate(2, now), Sanction::Strike { warnings: 2 }));
/// assert!(matches!(policy.evaluate(3, now), Sanction::Suspended { .. }));
/// assert!(matches!(policy.evaluate(10, now), Sanction::PermanentBan { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct EscalationPolicy {
    /// Strike count that triggers the short suspension.
    #[serde(default = "default_short_at")]
    short_suspension_at: u32,
    /// Length of the short suspension in days.
    #[serde(default = "default_short_days")]
    short_suspension_days: i64,
    /// Strike count that triggers the long suspension.
    #[serde(default = "default_long_at")]
    long_suspension_at: u32,
    /// Length of the long suspension in days.
    #[serde(default = "default_long_days")]
    long_suspension_days: i64,
    /// Strike count at and above which the ban is permanent.
    #[serde(default = "default_permanent_at")]
    permanent_ban_at: u32,
}

fn default_short_at() -> u32 {
    3
}

fn default_short_days() -> i64 {
    7
}

fn default_long_at() -> u32 {
    6
}

fn default_long_days() -> i64 {
    30
}

fn default_permanent_at() -> u32 {
    9
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            short_suspension_at: default_short_at(),
            short_suspension_days: default_short_days(),
            long_suspension_at: default_long_at(),
            long_suspension_days: default_long_days(),
            permanent_ban_at: default_permanent_at(),
        }
    }
}

impl EscalationPolicy {
    /// Sanction for a post-increment strike count.
    pub fn evaluate(&self, warnings: u32, now: DateTime<Utc>) -> Sanction {
        if warnings >= self.permanent_ban_at {
            Sanction::PermanentBan { warnings }
        } else if warnings == self.long_suspension_at {
            Sanction::Suspended {
                warnings,
                until: now + Duration::days(self.long_suspension_days),
            }
        } else if warnings == self.short_suspension_at {
            Sanction::Suspended {
                warnings,
                until: now + Duration::days(self.short_suspension_days),
            }
        } else {
            Sanction::Strike { warnings }
        }
    }

    /// Checks the thresholds are strictly increasing and the durations positive.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.short_suspension_at < self.long_suspension_at
            && self.long_suspension_at < self.permanent_ban_at)
        {
            return Err(format!(
                "escalation thresholds must increase, got {} / {} / {}",
                self.short_suspension_at, self.long_suspension_at, self.permanent_ban_at
            ));
        }
        if self.short_suspension_days <= 0 || self.long_suspension_days <= 0 {
            return Err("suspension lengths must be positive".to_string());
        }
        Ok(())
    }
}
