//! Weekly boundary detection.

use chrono::{DateTime, Duration, Utc};
use patisserie_error::ScheduleError;
use std::str::FromStr;

/// A cron-defined instant that opens each quota week.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use patisserie_quota::WeeklyBoundary;
///
/// let boundary = WeeklyBoundary::parse("0 0 23 * * Sun").unwrap();
/// // 2025-05-04 is a Sunday.
/// let just_after = Utc.with_ymd_and_hms(2025, 5, 4, 23, 20, 0).unwrap();
/// assert!(boundary.is_due(just_after, Duration::hours(1)));
/// assert!(!boundary.is_due(just_after - Duration::days(1), Duration::hours(1)));
/// ```
#[derive(Debug, Clone)]
pub struct WeeklyBoundary {
    expression: String,
    schedule: cron::Schedule,
}

impl WeeklyBoundary {
    /// Parses a six or seven field cron expression.
    ///
    /// # Errors
    ///
    /// [`ScheduleError`] for malformed expressions.
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let schedule = cron::Schedule::from_str(expression).map_err(|e| {
            ScheduleError::new(format!("Invalid cron expression '{}': {}", expression, e))
        })?;
        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    /// The source expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Whether a boundary fell within `window` before `now` (inclusive).
    pub fn is_due(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.schedule
            .after(&(now - window))
            .next()
            .is_some_and(|boundary| boundary <= now)
    }

    /// First boundary strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&now).next()
    }
}
