//! Per-member activity ledger records.

use crate::{MemberId, StaffRole};
use chrono::{DateTime, Utc};
use patisserie_error::{ActionError, ActionErrorKind};
use serde::{Deserialize, Serialize};

/// Staff role groups that carry weekly quotas and counters.
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
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoleGroup {
    /// Kitchen staff; counted on `cook`.
    Cook,
    /// Delivery staff; counted on `deliver`.
    Delivery,
}

impl RoleGroup {
    /// Role whose holders form the group.
    pub fn member_role(&self) -> StaffRole {
        match self {
            RoleGroup::Cook => StaffRole::Cook,
            RoleGroup::Delivery => StaffRole::Delivery,
        }
    }

    /// Role that earns the reduced target.
    pub fn senior_role(&self) -> StaffRole {
        match self {
            RoleGroup::Cook => StaffRole::SeniorCook,
            RoleGroup::Delivery => StaffRole::SeniorDelivery,
        }
    }

    /// Heading used in reports.
    pub fn title(&self) -> &'static str {
        match self {
            RoleGroup::Cook => "Kitchen Staff",
            RoleGroup::Delivery => "Delivery Staff",
        }
    }

    /// Past-tense verb used in member notices.
    pub fn verb(&self) -> &'static str {
        match self {
            RoleGroup::Cook => "cooked",
            RoleGroup::Delivery => "delivered",
        }
    }
}

/// Counters, strikes and ban state for one member.
///
/// Created lazily with all counters at zero.
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
pub struct StaffActivityRecord {
    /// Owner of the record.
    member_id: MemberId,
    /// Orders cooked this week.
    #[builder(default)]
    cook_count_week: u32,
    /// Orders cooked ever.
    #[builder(default)]
    cook_count_total: u32,
    /// Orders delivered this week.
    #[builder(default)]
    deliver_count_week: u32,
    /// Orders delivered ever.
    #[builder(default)]
    deliver_count_total: u32,
    /// Consecutive weekly cook quota misses.
    #[builder(default)]
    quota_fails_cook: u32,
    /// Consecutive weekly delivery quota misses.
    #[builder(default)]
    quota_fails_deliver: u32,
    /// Lifetime customer strikes.
    #[builder(default)]
    warnings: u32,
    /// End of a temporary suspension.
    #[builder(default)]
    ban_expires_at: Option<DateTime<Utc>>,
    /// Permanent ban flag.
    #[builder(default)]
    is_banned: bool,
}

impl StaffActivityRecord {
    /// Empty record for `member_id`.
    pub fn new(member_id: MemberId) -> Self {
        Self {
            member_id,
            cook_count_week: 0,
            cook_count_total: 0,
            deliver_count_week: 0,
            deliver_count_total: 0,
            quota_fails_cook: 0,
            quota_fails_deliver: 0,
            warnings: 0,
            ban_expires_at: None,
            is_banned: false,
        }
    }

    /// Weekly counter for `group`.
    pub fn weekly(&self, group: RoleGroup) -> u32 {
        match group {
            RoleGroup::Cook => self.cook_count_week,
            RoleGroup::Delivery => self.deliver_count_week,
        }
    }

    /// Lifetime counter for `group`.
    pub fn lifetime(&self, group: RoleGroup) -> u32 {
        match group {
            RoleGroup::Cook => self.cook_count_total,
            RoleGroup::Delivery => self.deliver_count_total,
        }
    }

    /// Consecutive quota misses for `group`.
    pub fn quota_fails(&self, group: RoleGroup) -> u32 {
        match group {
            RoleGroup::Cook => self.quota_fails_cook,
            RoleGroup::Delivery => self.quota_fails_deliver,
        }
    }

    /// Adds one to the weekly and lifetime counters of `group`.
    pub fn increment(&mut self, group: RoleGroup) {
        match group {
            RoleGroup::Cook => {
                self.cook_count_week += 1;
                self.cook_count_total += 1;
            }
            RoleGroup::Delivery => {
                self.deliver_count_week += 1;
                self.deliver_count_total += 1;
            }
        }
    }

    /// Stores the week's outcome: zeroes the weekly counter and sets the
    /// miss counter.
    pub fn close_week(&mut self, group: RoleGroup, quota_fails: u32) {
        match group {
            RoleGroup::Cook => {
                self.cook_count_week = 0;
                self.quota_fails_cook = quota_fails;
            }
            RoleGroup::Delivery => {
                self.deliver_count_week = 0;
                self.quota_fails_deliver = quota_fails;
            }
        }
    }

    /// Adds a strike and returns the new total.
    pub fn add_warning(&mut self) -> u32 {
        self.warnings += 1;
        self.warnings
    }

    /// Starts a temporary suspension.
    pub fn suspend_until(&mut self, until: DateTime<Utc>) {
        self.ban_expires_at = Some(until);
    }

    /// Sets the permanent ban flag.
    pub fn ban(&mut self) {
        self.is_banned = true;
    }

    /// Clears a temporary suspension, keeping any permanent ban.
    pub fn clear_suspension(&mut self) {
        self.ban_expires_at = None;
    }

    /// Clears both ban fields.
    pub fn lift_ban(&mut self) {
        self.is_banned = false;
        self.ban_expires_at = None;
    }

    /// True when a temporary suspension has run out but is still recorded.
    pub fn has_lapsed_suspension(&self, now: DateTime<Utc>) -> bool {
        self.ban_expires_at.is_some_and(|until| until <= now)
    }

    /// Refuses ordering while a ban is in effect.
    ///
    /// A lapsed temporary suspension does not refuse; callers clear it.
    ///
    /// # Errors
    ///
    /// [`ActionErrorKind::Banned`] or [`ActionErrorKind::TemporarilyBanned`].
    pub fn ensure_may_order(&self, now: DateTime<Utc>) -> Result<(), ActionError> {
        if self.is_banned {
            return Err(ActionError::new(ActionErrorKind::Banned));
        }
        if let Some(until) = self.ban_expires_at
            && until > now
        {
            return Err(ActionError::new(ActionErrorKind::TemporarilyBanned(until)));
        }
        Ok(())
    }
}
