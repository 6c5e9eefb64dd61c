//! Weekly quota arithmetic.

use serde::{Deserialize, Serialize};

/// Which target applies to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuotaTier {
    /// Regular staff.
    Normal,
    /// Senior staff; half the normal target.
    Senior,
}

/// Targets derived from one role group's weekly volume.
///
/// # Examples
///
/// ```
/// use patisserie_core::QuotaTargets;
///
/// let targets = QuotaTargets::compute(12, 3, 30);
/// assert_eq!(*targets.normal(), 4);
/// assert_eq!(*targets.senior(), 2);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct QuotaTargets {
    /// Sum of the group's weekly counters.
    total_volume: u64,
    /// Number of role holders.
    staff_count: u64,
    /// Target for regular staff.
    normal: u64,
    /// Target for senior staff.
    senior: u64,
}

impl QuotaTargets {
    /// Fair-share targets, capped at `cap`, never below one while there was
    /// any volume at all.
    pub fn compute(total_volume: u64, staff_count: u64, cap: u64) -> Self {
        let (normal, senior) = if total_volume == 0 || staff_count == 0 {
            (0, 0)
        } else {
            let normal = total_volume.div_ceil(staff_count).min(cap).max(1);
            (normal, normal.div_ceil(2).max(1))
        };
        Self {
            total_volume,
            staff_count,
            normal,
            senior,
        }
    }

    /// Target for `tier`.
    pub fn target_for(&self, tier: QuotaTier) -> u64 {
        match tier {
            QuotaTier::Normal => self.normal,
            QuotaTier::Senior => self.senior,
        }
    }

    /// Too little volume spread over more than one member to judge anyone.
    pub fn is_low_traffic(&self, min_volume: u64) -> bool {
        self.total_volume < min_volume && self.staff_count > 1
    }
}

/// Result of evaluating one member for one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QuotaOutcome {
    /// Holds the bypass role or is on vacation.
    ExemptBypass,
    /// Group volume too low to judge.
    ExemptLowTraffic {
        /// Work done this week.
        done: u64,
    },
    /// Met the target; miss counter reset.
    Passed {
        /// Work done this week.
        done: u64,
        /// Applicable target.
        target: u64,
    },
    /// Missed the target.
    Strike {
        /// Work done this week.
        done: u64,
        /// Applicable target.
        target: u64,
        /// Consecutive misses including this one.
        strike: u32,
        /// Misses that cost the role.
        limit: u32,
    },
    /// Missed too many weeks in a row; role revoked and counters reset.
    RoleRemoved {
        /// Work done this week.
        done: u64,
        /// Applicable target.
        target: u64,
    },
}

impl QuotaOutcome {
    /// Miss counter to store after this outcome, given the stored value.
    pub fn fails_after(&self, fails_before: u32) -> u32 {
        match self {
            QuotaOutcome::ExemptBypass | QuotaOutcome::ExemptLowTraffic { .. } => fails_before,
            QuotaOutcome::Passed { .. } | QuotaOutcome::RoleRemoved { .. } => 0,
            QuotaOutcome::Strike { strike, .. } => *strike,
        }
    }
}

/// Evaluates one member.
///
/// `fails_before` is the stored consecutive-miss counter and `max_fails`
/// the number of misses that revokes the role.
pub fn evaluate_member(
    targets: &QuotaTargets,
    tier: QuotaTier,
    done: u64,
    bypass: bool,
    fails_before: u32,
    max_fails: u32,
    min_volume: u64,
) -> QuotaOutcome {
    if bypass {
        return QuotaOutcome::ExemptBypass;
    }
    if targets.is_low_traffic(min_volume) {
        return QuotaOutcome::ExemptLowTraffic { done };
    }

    let target = targets.target_for(tier);
    if done >= target {
        return QuotaOutcome::Passed { done, target };
    }

    let strike = fails_before + 1;
    if strike >= max_fails {
        QuotaOutcome::RoleRemoved { done, target }
    } else {
        QuotaOutcome::Strike {
            done,
            target,
            strike,
            limit: max_fails,
        }
    }
}
