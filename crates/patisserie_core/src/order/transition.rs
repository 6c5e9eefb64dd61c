//! Pure order transitions.

use super::{Deliverer, MAX_IMAGES, Order, OrderStatus};
use crate::MemberId;
use chrono::{DateTime, Utc};
use patisserie_error::{ActionError, ActionErrorKind};

/// A requested change to one order.
///
/// `privileged` marks managers, who may act on another cook's claim.
#[derive(Debug, Clone, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum OrderAction {
    /// `pending → claimed`.
    Claim {
        /// Claiming cook.
        chef: MemberId,
        /// Cook's display name at claim time.
        chef_name: String,
    },
    /// `claimed → pending`, by the claimant.
    Unclaim {
        /// Acting member.
        actor: MemberId,
        /// Manager override.
        privileged: bool,
    },
    /// `claimed → cooking`, attaching images.
    Cook {
        /// Acting member.
        actor: MemberId,
        /// Manager override.
        privileged: bool,
        /// One to three attachment references.
        images: Vec<String>,
    },
    /// `cooking → ready`, when the cook timer elapses.
    FinishCooking,
    /// `ready → delivered` by staff.
    Deliver {
        /// Delivering member.
        deliverer: MemberId,
    },
    /// `claimed → pending` by the unclaim sweep.
    AutoUnclaim,
    /// `ready → delivered` by the delivery sweep.
    AutoDeliver,
    /// `pending | claimed | cooking → cancelled_warn`.
    Warn,
    /// `ready | delivered → cancelled_fdo`.
    ForceCancel,
    /// Sets the rating of a delivered order.
    Rate {
        /// Acting member; must be the customer.
        customer: MemberId,
        /// Requested stars, 1 to 5.
        stars: i64,
    },
    /// Records a complaint without changing status.
    Complain {
        /// Acting member; must be the customer.
        customer: MemberId,
        /// Complaint text.
        text: String,
    },
}

fn invalid(order: &Order, wanted: &str) -> ActionError {
    ActionError::new(ActionErrorKind::InvalidState(format!(
        "order {} is {}, expected {}",
        order.order_id, order.status, wanted
    )))
}

fn not_owner(order: &Order) -> ActionError {
    ActionError::new(ActionErrorKind::NotOwner(format!(
        "order {} belongs to someone else",
        order.order_id
    )))
}

impl Order {
    /// Validates `action` against the current record and returns the next
    /// record, with `revision` bumped.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionErrorKind`] describing why the action is refused.
    /// The receiver is never modified.
    pub fn apply(&self, action: &OrderAction, now: DateTime<Utc>) -> Result<Order, ActionError> {
        let mut next = self.clone();

        match action {
            OrderAction::Claim { chef, chef_name } => {
                if self.status != OrderStatus::Pending {
                    return Err(invalid(self, "pending"));
                }
                next.status = OrderStatus::Claimed;
                next.chef_id = Some(*chef);
                next.chef_name = Some(chef_name.clone());
                next.claimed_at = Some(now);
            }
            OrderAction::Unclaim { actor, privileged } => {
                if self.status != OrderStatus::Claimed {
                    return Err(invalid(self, "claimed"));
                }
                if !privileged && self.chef_id != Some(*actor) {
                    return Err(not_owner(self));
                }
                next.release_claim();
            }
            OrderAction::Cook {
                actor,
                privileged,
                images,
            } => {
                match self.status {
                    OrderStatus::Claimed => {}
                    OrderStatus::Pending => {
                        return Err(ActionError::new(ActionErrorKind::InvalidState(format!(
                            "order {} must be claimed first",
                            self.order_id
                        ))));
                    }
                    _ => return Err(invalid(self, "claimed")),
                }
                if !privileged && self.chef_id != Some(*actor) {
                    return Err(not_owner(self));
                }
                if images.is_empty() || images.len() > MAX_IMAGES {
                    return Err(ActionError::new(ActionErrorKind::out_of_range(
                        "images",
                        images.len() as i64,
                        1,
                        MAX_IMAGES as i64,
                    )));
                }
                next.status = OrderStatus::Cooking;
                next.images = images.clone();
                next.cooking_started_at = Some(now);
            }
            OrderAction::FinishCooking => {
                if self.status != OrderStatus::Cooking {
                    return Err(invalid(self, "cooking"));
                }
                next.status = OrderStatus::Ready;
                next.ready_at = Some(now);
            }
            OrderAction::Deliver { deliverer } => {
                if self.status != OrderStatus::Ready {
                    return Err(invalid(self, "ready"));
                }
                next.status = OrderStatus::Delivered;
                next.deliverer = Some(Deliverer::Staff(*deliverer));
            }
            OrderAction::AutoUnclaim => {
                if self.status != OrderStatus::Claimed {
                    return Err(invalid(self, "claimed"));
                }
                next.release_claim();
            }
            OrderAction::AutoDeliver => {
                if self.status != OrderStatus::Ready {
                    return Err(invalid(self, "ready"));
                }
                next.status = OrderStatus::Delivered;
                next.deliverer = Some(Deliverer::System);
            }
            OrderAction::Warn => {
                if !matches!(
                    self.status,
                    OrderStatus::Pending | OrderStatus::Claimed | OrderStatus::Cooking
                ) {
                    return Err(invalid(self, "pending, claimed or cooking"));
                }
                next.status = OrderStatus::CancelledWarn;
            }
            OrderAction::ForceCancel => {
                if !matches!(self.status, OrderStatus::Ready | OrderStatus::Delivered) {
                    return Err(invalid(self, "ready or delivered"));
                }
                next.status = OrderStatus::CancelledFdo;
            }
            OrderAction::Rate { customer, stars } => {
                if self.customer_id != *customer {
                    return Err(not_owner(self));
                }
                if self.status != OrderStatus::Delivered {
                    return Err(invalid(self, "delivered"));
                }
                if self.rating.is_some() {
                    return Err(ActionError::new(ActionErrorKind::InvalidState(format!(
                        "order {} was already rated",
                        self.order_id
                    ))));
                }
                if !(1..=5).contains(stars) {
                    return Err(ActionError::new(ActionErrorKind::out_of_range(
                        "stars", *stars, 1, 5,
                    )));
                }
                next.rating = Some(*stars as u8);
            }
            OrderAction::Complain { customer, text } => {
                if self.customer_id != *customer {
                    return Err(not_owner(self));
                }
                next.complaint = Some(text.clone());
            }
        }

        next.revision = self.revision + 1;
        Ok(next)
    }

    fn release_claim(&mut self) {
        self.status = OrderStatus::Pending;
        self.chef_id = None;
        self.chef_name = None;
        self.claimed_at = None;
    }
}
