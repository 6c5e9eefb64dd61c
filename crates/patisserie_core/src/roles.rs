//! Roles the engine reads or administers.

use serde::{Deserialize, Serialize};

/// Community roles with meaning to the engine.
///
/// Platform role ids are mapped to these in configuration.
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
pub enum StaffRole {
    /// Kitchen staff.
    Cook,
    /// Delivery staff.
    Delivery,
    /// Management; may override claims and run moderation.
    Manager,
    /// Kitchen staff with the reduced target.
    SeniorCook,
    /// Delivery staff with the reduced target.
    SeniorDelivery,
    /// Exempt from weekly quotas.
    QuotaBypass,
    /// Premium customer role in the support community.
    Vip,
}
