//! Staff vacation requests.

use crate::MemberId;
use chrono::{DateTime, Duration, Utc};
use patisserie_error::{ActionError, ActionErrorKind};
use serde::{Deserialize, Serialize};

/// Vacation lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VacationStatus {
    /// Awaiting management.
    Pending,
    /// Approved and running.
    Active,
    /// Ran out.
    Expired,
    /// Refused.
    Denied,
}

/// One member's vacation request.
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
#[builder(setter(into))]
pub struct VacationRequest {
    /// Requesting member.
    staff_id: MemberId,
    /// Lifecycle status.
    status: VacationStatus,
    /// Requested or approved length.
    days: u32,
    /// Free-text reason.
    reason: String,
    /// When the request was filed.
    requested_at: DateTime<Utc>,
    /// End of the vacation, set on approval.
    #[builder(default)]
    end_date: Option<DateTime<Utc>>,
    /// Why management refused.
    #[builder(default)]
    denial_reason: Option<String>,
}

impl VacationRequest {
    /// Shortest allowed vacation.
    pub const MIN_DAYS: i64 = 1;
    /// Longest allowed vacation.
    pub const MAX_DAYS: i64 = 14;

    /// Files a pending request.
    ///
    /// # Errors
    ///
    /// [`ActionErrorKind::OutOfRange`] unless `days` is within 1 to 14.
    pub fn request(
        staff_id: MemberId,
        days: i64,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ActionError> {
        let days = Self::check_days(days)?;
        Ok(Self {
            staff_id,
            status: VacationStatus::Pending,
            days,
            reason: reason.into(),
            requested_at: now,
            end_date: None,
            denial_reason: None,
        })
    }

    /// Validates a duration in days.
    ///
    /// # Errors
    ///
    /// [`ActionErrorKind::OutOfRange`] outside 1 to 14.
    pub fn check_days(days: i64) -> Result<u32, ActionError> {
        if !(Self::MIN_DAYS..=Self::MAX_DAYS).contains(&days) {
            return Err(ActionError::new(ActionErrorKind::out_of_range(
                "days",
                days,
                Self::MIN_DAYS,
                Self::MAX_DAYS,
            )));
        }
        Ok(days as u32)
    }

    /// Activates the request, optionally with an edited length.
    ///
    /// # Errors
    ///
    /// [`ActionErrorKind::InvalidState`] unless pending, or
    /// [`ActionErrorKind::OutOfRange`] for a bad edited length.
    pub fn approve(&self, days: Option<i64>, now: DateTime<Utc>) -> Result<Self, ActionError> {
        if self.status != VacationStatus::Pending {
            return Err(ActionError::new(ActionErrorKind::InvalidState(format!(
                "vacation request is {}",
                self.status
            ))));
        }
        let days = match days {
            Some(edited) => Self::check_days(edited)?,
            None => self.days,
        };
        let mut next = self.clone();
        next.status = VacationStatus::Active;
        next.days = days;
        next.end_date = Some(now + Duration::days(i64::from(days)));
        Ok(next)
    }

    /// Refuses the request.
    ///
    /// # Errors
    ///
    /// [`ActionErrorKind::InvalidState`] unless pending.
    pub fn deny(&self, reason: impl Into<String>) -> Result<Self, ActionError> {
        if self.status != VacationStatus::Pending {
            return Err(ActionError::new(ActionErrorKind::InvalidState(format!(
                "vacation request is {}",
                self.status
            ))));
        }
        let mut next = self.clone();
        next.status = VacationStatus::Denied;
        next.denial_reason = Some(reason.into());
        Ok(next)
    }

    /// Active and past its end date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == VacationStatus::Active && self.end_date.is_some_and(|end| end < now)
    }

    /// Marks an active vacation as over.
    pub fn expire(&self) -> Self {
        let mut next = self.clone();
        next.status = VacationStatus::Expired;
        next
    }
}
