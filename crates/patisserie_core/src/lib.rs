//! Core domain types for the Patisserie order fulfillment engine.
//!
//! This crate holds the records every other crate passes around, plus the
//! pure rules that act on them:
//!
//! - [`Order`] and its state machine ([`OrderAction`], [`Order::apply`])
//! - [`StaffActivityRecord`] counters and the [`EscalationPolicy`]
//! - weekly [`QuotaTargets`] arithmetic
//! - [`VacationRequest`] and premium [`PremiumCode`] / [`PremiumGrant`] records
//! - the injectable [`Clock`]
//!
//! Nothing here performs I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod activity;
mod clock;
mod escalation;
mod ids;
mod order;
mod premium;
mod quota;
mod roles;
mod script;
mod vacation;

pub use activity::{RoleGroup, StaffActivityRecord, StaffActivityRecordBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use escalation::{EscalationPolicy, Sanction};
pub use ids::{ChannelId, GuildId, MemberId, OrderId};
pub use order::{
    AUTO_DELIVER_AFTER, AUTO_UNCLAIM_AFTER, COOK_DURATION, Deliverer, MAX_IMAGES, NewOrder,
    Order, OrderAction, OrderBuilder, OrderStatus,
};
pub use premium::{
    CodeStatus, PREMIUM_CODE_PREFIX, PremiumCode, PremiumCodeBuilder, PremiumGrant,
    PremiumGrantBuilder, generate_code,
};
pub use quota::{QuotaOutcome, QuotaTargets, QuotaTier, evaluate_member};
pub use roles::StaffRole;
pub use script::{DEFAULT_DELIVERY_SCRIPT, chef_label, compose_delivery_message, images_block};
pub use vacation::{VacationRequest, VacationRequestBuilder, VacationStatus};
