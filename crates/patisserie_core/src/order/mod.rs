//! Order records and their lifecycle.

mod transition;

pub use transition::OrderAction;

use crate::{ChannelId, GuildId, MemberId, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a cook timer runs before the order becomes ready.
pub const COOK_DURATION: Duration = Duration::from_secs(3 * 60);

/// A claim older than this is reverted to `pending` by the unclaim sweep.
pub const AUTO_UNCLAIM_AFTER: Duration = Duration::from_secs(4 * 60);

/// A ready order older than this is delivered by the system.
pub const AUTO_DELIVER_AFTER: Duration = Duration::from_secs(20 * 60);

/// Most images a cook may attach.
pub const MAX_IMAGES: usize = 3;

/// Lifecycle status of an order.
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
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    /// Waiting for a cook.
    Pending,
    /// Claimed by a cook, not yet cooking.
    Claimed,
    /// On the stove.
    Cooking,
    /// Waiting for a deliverer.
    Ready,
    /// Handed to the customer.
    Delivered,
    /// Cancelled with a warning against the customer.
    CancelledWarn,
    /// Cancelled after it was ready or delivered.
    CancelledFdo,
}

impl OrderStatus {
    /// Statuses that hold the customer's single active slot.
    pub const ACTIVE: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Claimed,
        OrderStatus::Cooking,
        OrderStatus::Ready,
    ];

    /// True for `delivered`, `cancelled_warn` and `cancelled_fdo`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::CancelledWarn | OrderStatus::CancelledFdo
        )
    }

    /// Inverse of [`OrderStatus::is_terminal`].
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    fn has_chef(&self) -> bool {
        matches!(
            self,
            OrderStatus::Claimed
                | OrderStatus::Cooking
                | OrderStatus::Ready
                | OrderStatus::Delivered
                | OrderStatus::CancelledFdo
        )
    }

    fn has_images(&self) -> bool {
        matches!(
            self,
            OrderStatus::Cooking
                | OrderStatus::Ready
                | OrderStatus::Delivered
                | OrderStatus::CancelledFdo
        )
    }
}

/// Who delivered an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deliverer {
    /// A staff member.
    Staff(MemberId),
    /// The auto-delivery sweep.
    System,
}

impl Deliverer {
    /// Storage form of the system sentinel.
    pub const SYSTEM_SENTINEL: &'static str = "AUTO_BOT";

    /// The member, when a person delivered.
    pub fn member(&self) -> Option<MemberId> {
        match self {
            Deliverer::Staff(id) => Some(*id),
            Deliverer::System => None,
        }
    }

    /// Text form used by persistent stores.
    pub fn to_storage(&self) -> String {
        match self {
            Deliverer::Staff(id) => id.0.to_string(),
            Deliverer::System => Self::SYSTEM_SENTINEL.to_string(),
        }
    }

    /// Parses the storage form.
    pub fn from_storage(raw: &str) -> Option<Self> {
        if raw == Self::SYSTEM_SENTINEL {
            return Some(Deliverer::System);
        }
        raw.parse::<u64>().ok().map(|id| Deliverer::Staff(MemberId(id)))
    }
}

/// Input for creating an order.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters, derive_new::new)]
pub struct NewOrder {
    /// Ordering customer.
    customer_id: MemberId,
    /// Community the order was placed in.
    guild_id: GuildId,
    /// Channel the order was placed from.
    origin_channel_id: ChannelId,
    /// Free-text description.
    item: String,
}

/// A customer's order.
///
/// Fields are only changed through [`Order::apply`]. Stores rebuild records
/// with [`OrderBuilder`] and must run [`Order::validate`] on the result.
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
pub struct Order {
    /// Immutable identifier.
    order_id: OrderId,
    /// Ordering customer.
    customer_id: MemberId,
    /// Community the order came from.
    guild_id: GuildId,
    /// Channel the order came from.
    origin_channel_id: ChannelId,
    /// What was ordered.
    item: String,
    /// Lifecycle status.
    #[builder(default = "OrderStatus::Pending")]
    status: OrderStatus,
    /// Priority flag fixed at creation.
    #[builder(default)]
    is_vip: bool,
    /// Claiming cook.
    #[builder(default)]
    chef_id: Option<MemberId>,
    /// Claiming cook's display name.
    #[builder(default)]
    chef_name: Option<String>,
    /// When the current claim was taken.
    #[builder(default)]
    claimed_at: Option<DateTime<Utc>>,
    /// When cooking started.
    #[builder(default)]
    #[serde(default)]
    cooking_started_at: Option<DateTime<Utc>>,
    /// When cooking finished.
    #[builder(default)]
    ready_at: Option<DateTime<Utc>>,
    /// Who delivered.
    #[builder(default)]
    deliverer: Option<Deliverer>,
    /// Attachment references, in upload order.
    #[builder(default)]
    images: Vec<String>,
    /// Customer rating, 1 to 5.
    #[builder(default)]
    rating: Option<u8>,
    /// Customer complaint.
    #[builder(default)]
    complaint: Option<String>,
    /// Creation instant.
    created_at: DateTime<Utc>,
    /// Write counter used with `status` for conditional updates.
    #[builder(default)]
    revision: u64,
}

impl Order {
    /// A fresh `pending` order at revision 0.
    pub fn create(id: OrderId, new: NewOrder, is_vip: bool, now: DateTime<Utc>) -> Self {
        Self {
            order_id: id,
            customer_id: new.customer_id,
            guild_id: new.guild_id,
            origin_channel_id: new.origin_channel_id,
            item: new.item,
            status: OrderStatus::Pending,
            is_vip,
            chef_id: None,
            chef_name: None,
            claimed_at: None,
            cooking_started_at: None,
            ready_at: None,
            deliverer: None,
            images: Vec::new(),
            rating: None,
            complaint: None,
            created_at: now,
            revision: 0,
        }
    }

    /// True when the order is `claimed` and the claim is older than `after`.
    pub fn claim_expired(&self, now: DateTime<Utc>, after: Duration) -> bool {
        self.status == OrderStatus::Claimed
            && self
                .claimed_at
                .is_some_and(|at| now - at > chrono::Duration::seconds(after.as_secs() as i64))
    }

    /// True when the order is `cooking` and has been for at least `after`.
    ///
    /// Picks up orders whose cook timer was lost, for example across a
    /// restart.
    pub fn cooking_overdue(&self, now: DateTime<Utc>, after: Duration) -> bool {
        self.status == OrderStatus::Cooking
            && self
                .cooking_started_at
                .is_some_and(|at| now - at >= chrono::Duration::seconds(after.as_secs() as i64))
    }

    /// True when the order is `ready` and has waited longer than `after`.
    pub fn delivery_overdue(&self, now: DateTime<Utc>, after: Duration) -> bool {
        self.status == OrderStatus::Ready
            && self
                .ready_at
                .is_some_and(|at| now - at > chrono::Duration::seconds(after.as_secs() as i64))
    }

    /// Checks that the optional fields agree with `status`.
    ///
    /// # Errors
    ///
    /// Returns a description of the first inconsistency found.
    pub fn validate(&self) -> Result<(), String> {
        let chef_fields = [
            self.chef_id.is_some(),
            self.chef_name.is_some(),
            self.claimed_at.is_some(),
        ];
        let all_chef = chef_fields.iter().all(|set| *set);
        let no_chef = chef_fields.iter().all(|set| !*set);

        if !all_chef && !no_chef {
            return Err(format!(
                "order {}: chef id, name and claim time must be set together",
                self.order_id
            ));
        }
        if self.status.has_chef() && !all_chef {
            return Err(format!("order {}: {} requires a chef", self.order_id, self.status));
        }
        if self.status == OrderStatus::Pending && !no_chef {
            return Err(format!("order {}: pending order carries a chef", self.order_id));
        }

        if self.images.len() > MAX_IMAGES {
            return Err(format!(
                "order {}: {} images exceeds {}",
                self.order_id,
                self.images.len(),
                MAX_IMAGES
            ));
        }
        if self.status.has_images() && self.images.is_empty() {
            return Err(format!("order {}: {} requires images", self.order_id, self.status));
        }
        if matches!(self.status, OrderStatus::Pending | OrderStatus::Claimed)
            && !self.images.is_empty()
        {
            return Err(format!("order {}: {} carries images", self.order_id, self.status));
        }

        if self.cooking_started_at.is_some() == self.images.is_empty() {
            return Err(format!(
                "order {}: cook start time and images must be set together",
                self.order_id
            ));
        }

        let expects_ready_at = matches!(
            self.status,
            OrderStatus::Ready | OrderStatus::Delivered | OrderStatus::CancelledFdo
        );
        if expects_ready_at != self.ready_at.is_some() {
            return Err(format!(
                "order {}: ready time does not match {}",
                self.order_id, self.status
            ));
        }

        match self.status {
            OrderStatus::Delivered if self.deliverer.is_none() => {
                return Err(format!("order {}: delivered without deliverer", self.order_id));
            }
            OrderStatus::Delivered | OrderStatus::CancelledFdo => {}
            _ if self.deliverer.is_some() => {
                return Err(format!(
                    "order {}: {} carries a deliverer",
                    self.order_id, self.status
                ));
            }
            _ => {}
        }

        if let Some(stars) = self.rating {
            if !(1..=5).contains(&stars) {
                return Err(format!("order {}: rating {} out of range", self.order_id, stars));
            }
            if self.deliverer.is_none() {
                return Err(format!("order {}: rated before delivery", self.order_id));
            }
        }

        Ok(())
    }
}
