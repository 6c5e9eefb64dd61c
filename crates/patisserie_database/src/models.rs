//! Row types and their conversions to domain records.
//!
//! Discord snowflakes are stored bit-for-bit in `BIGINT` columns; counters
//! are `INTEGER` and are checked on the way back in.

use crate::schema::{
    order_audit, orders, premium_codes, premium_grants, staff_activity, vacation_requests,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use patisserie_core::{
    ChannelId, CodeStatus, Deliverer, GuildId, MemberId, Order, OrderBuilder, OrderId,
    OrderStatus, PremiumCode, PremiumCodeBuilder, PremiumGrant, PremiumGrantBuilder,
    StaffActivityRecord, StaffActivityRecordBuilder, VacationRequest, VacationRequestBuilder,
    VacationStatus,
};
use patisserie_error::{StoreError, StoreErrorKind};
use std::str::FromStr;

#[track_caller]
fn corrupt(reason: impl std::fmt::Display) -> StoreError {
    StoreError::new(StoreErrorKind::Corrupt(reason.to_string()))
}

/// Column form of a member id.
pub fn member_key(member: MemberId) -> i64 {
    member.0 as i64
}

fn member(raw: i64) -> MemberId {
    MemberId(raw as u64)
}

fn count(raw: i32) -> Result<u32, StoreError> {
    u32::try_from(raw).map_err(|_| corrupt(format!("negative counter {raw}")))
}

fn count_column(value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| corrupt(format!("counter {value} overflows")))
}

// ============================================================================
// Orders
// ============================================================================

/// One row of `orders`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = orders)]
#[diesel(primary_key(order_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub order_id: String,
    pub customer_id: i64,
    pub guild_id: i64,
    pub origin_channel_id: i64,
    pub item: String,
    pub status: String,
    pub is_vip: bool,
    pub chef_id: Option<i64>,
    pub chef_name: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub cooking_started_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub deliverer: Option<String>,
    pub images: Vec<String>,
    pub rating: Option<i16>,
    pub complaint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub revision: i64,
}

impl TryFrom<&Order> for OrderRow {
    type Error = StoreError;

    fn try_from(order: &Order) -> Result<Self, Self::Error> {
        order.validate().map_err(corrupt)?;
        Ok(Self {
            order_id: order.order_id().as_str().to_string(),
            customer_id: member_key(*order.customer_id()),
            guild_id: order.guild_id().0 as i64,
            origin_channel_id: order.origin_channel_id().0 as i64,
            item: order.item().clone(),
            status: order.status().to_string(),
            is_vip: *order.is_vip(),
            chef_id: order.chef_id().map(member_key),
            chef_name: order.chef_name().clone(),
            claimed_at: *order.claimed_at(),
            cooking_started_at: *order.cooking_started_at(),
            ready_at: *order.ready_at(),
            deliverer: order.deliverer().map(|d| d.to_storage()),
            images: order.images().clone(),
            rating: order.rating().map(i16::from),
            complaint: order.complaint().clone(),
            created_at: *order.created_at(),
            revision: i64::try_from(*order.revision())
                .map_err(|_| corrupt("revision overflows"))?,
        })
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&row.status)
            .map_err(|_| corrupt(format!("unknown order status {}", row.status)))?;
        let deliverer = row
            .deliverer
            .as_deref()
            .map(|raw| {
                Deliverer::from_storage(raw).ok_or_else(|| corrupt(format!("deliverer {raw}")))
            })
            .transpose()?;
        let rating = row
            .rating
            .map(|r| u8::try_from(r).map_err(|_| corrupt(format!("rating {r}"))))
            .transpose()?;

        let order = OrderBuilder::default()
            .order_id(OrderId::new(&row.order_id))
            .customer_id(member(row.customer_id))
            .guild_id(GuildId(row.guild_id as u64))
            .origin_channel_id(ChannelId(row.origin_channel_id as u64))
            .item(row.item)
            .status(status)
            .is_vip(row.is_vip)
            .chef_id(row.chef_id.map(member))
            .chef_name(row.chef_name)
            .claimed_at(row.claimed_at)
            .cooking_started_at(row.cooking_started_at)
            .ready_at(row.ready_at)
            .deliverer(deliverer)
            .images(row.images)
            .rating(rating)
            .complaint(row.complaint)
            .created_at(row.created_at)
            .revision(u64::try_from(row.revision).map_err(|_| corrupt("negative revision"))?)
            .build()
            .map_err(corrupt)?;
        order.validate().map_err(corrupt)?;
        Ok(order)
    }
}

// ============================================================================
// Activity ledger
// ============================================================================

/// One row of `staff_activity`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = staff_activity)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ActivityRow {
    pub member_id: i64,
    pub cook_count_week: i32,
    pub cook_count_total: i32,
    pub deliver_count_week: i32,
    pub deliver_count_total: i32,
    pub quota_fails_cook: i32,
    pub quota_fails_deliver: i32,
    pub warnings: i32,
    pub ban_expires_at: Option<DateTime<Utc>>,
    pub is_banned: bool,
}

impl ActivityRow {
    /// All-zero row, the starting point of every lazily created record.
    pub fn empty(member_id: MemberId) -> Self {
        Self {
            member_id: member_key(member_id),
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
}

impl TryFrom<ActivityRow> for StaffActivityRecord {
    type Error = StoreError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        StaffActivityRecordBuilder::default()
            .member_id(member(row.member_id))
            .cook_count_week(count(row.cook_count_week)?)
            .cook_count_total(count(row.cook_count_total)?)
            .deliver_count_week(count(row.deliver_count_week)?)
            .deliver_count_total(count(row.deliver_count_total)?)
            .quota_fails_cook(count(row.quota_fails_cook)?)
            .quota_fails_deliver(count(row.quota_fails_deliver)?)
            .warnings(count(row.warnings)?)
            .ban_expires_at(row.ban_expires_at)
            .is_banned(row.is_banned)
            .build()
            .map_err(corrupt)
    }
}

// ============================================================================
// Vacations
// ============================================================================

/// One row of `vacation_requests`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = vacation_requests)]
#[diesel(primary_key(staff_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VacationRow {
    pub staff_id: i64,
    pub status: String,
    pub days: i32,
    pub reason: String,
    pub requested_at: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub denial_reason: Option<String>,
}

impl TryFrom<&VacationRequest> for VacationRow {
    type Error = StoreError;

    fn try_from(request: &VacationRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            staff_id: member_key(*request.staff_id()),
            status: request.status().to_string(),
            days: count_column(*request.days())?,
            reason: request.reason().clone(),
            requested_at: *request.requested_at(),
            end_date: *request.end_date(),
            denial_reason: request.denial_reason().clone(),
        })
    }
}

impl TryFrom<VacationRow> for VacationRequest {
    type Error = StoreError;

    fn try_from(row: VacationRow) -> Result<Self, Self::Error> {
        let status = VacationStatus::from_str(&row.status)
            .map_err(|_| corrupt(format!("unknown vacation status {}", row.status)))?;
        VacationRequestBuilder::default()
            .staff_id(member(row.staff_id))
            .status(status)
            .days(count(row.days)?)
            .reason(row.reason)
            .requested_at(row.requested_at)
            .end_date(row.end_date)
            .denial_reason(row.denial_reason)
            .build()
            .map_err(corrupt)
    }
}

// ============================================================================
// Premium
// ============================================================================

/// One row of `premium_codes`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = premium_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PremiumCodeRow {
    pub code: String,
    pub status: String,
    pub duration_days: i32,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub redeemed_by: Option<i64>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl TryFrom<&PremiumCode> for PremiumCodeRow {
    type Error = StoreError;

    fn try_from(code: &PremiumCode) -> Result<Self, Self::Error> {
        Ok(Self {
            code: code.code().clone(),
            status: code.status().to_string(),
            duration_days: count_column(*code.duration_days())?,
            created_by: member_key(*code.created_by()),
            created_at: *code.created_at(),
            redeemed_by: code.redeemed_by().map(member_key),
            redeemed_at: *code.redeemed_at(),
        })
    }
}

impl TryFrom<PremiumCodeRow> for PremiumCode {
    type Error = StoreError;

    fn try_from(row: PremiumCodeRow) -> Result<Self, Self::Error> {
        let status = CodeStatus::from_str(&row.status)
            .map_err(|_| corrupt(format!("unknown code status {}", row.status)))?;
        PremiumCodeBuilder::default()
            .code(row.code)
            .status(status)
            .duration_days(count(row.duration_days)?)
            .created_by(member(row.created_by))
            .created_at(row.created_at)
            .redeemed_by(row.redeemed_by.map(member))
            .redeemed_at(row.redeemed_at)
            .build()
            .map_err(corrupt)
    }
}

/// One row of `premium_grants`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = premium_grants)]
#[diesel(primary_key(member_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PremiumGrantRow {
    pub member_id: i64,
    pub is_vip: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub redeemed_code: Option<String>,
}

impl From<&PremiumGrant> for PremiumGrantRow {
    fn from(grant: &PremiumGrant) -> Self {
        Self {
            member_id: member_key(*grant.member_id()),
            is_vip: *grant.is_vip(),
            expires_at: *grant.expires_at(),
            redeemed_code: grant.redeemed_code().clone(),
        }
    }
}

impl TryFrom<PremiumGrantRow> for PremiumGrant {
    type Error = StoreError;

    fn try_from(row: PremiumGrantRow) -> Result<Self, Self::Error> {
        PremiumGrantBuilder::default()
            .member_id(member(row.member_id))
            .is_vip(row.is_vip)
            .expires_at(row.expires_at)
            .redeemed_code(row.redeemed_code)
            .build()
            .map_err(corrupt)
    }
}

// ============================================================================
// Audit
// ============================================================================

/// One row of `order_audit`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = order_audit)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuditRow {
    pub order_id: String,
    pub revision: i64,
    pub summary: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
