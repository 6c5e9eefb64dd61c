//! Order lifecycle service.

use crate::KitchenSettings;
use chrono::{DateTime, Utc};
use patisserie_core::{
    MemberId, NewOrder, Order, OrderAction, OrderId, OrderStatus, RoleGroup, chef_label,
    compose_delivery_message, images_block,
};
use patisserie_error::{
    ActionError, ActionErrorKind, PatisserieResult, StoreError, StoreErrorKind,
};
use patisserie_interface::{Backends, Recipient, StaffChannel, notify_best_effort};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Attempts before a conditional update is reported as a conflict.
const MAX_CAS_ATTEMPTS: usize = 16;

/// Fresh ids drawn before a create gives up on key collisions.
const MAX_ID_ATTEMPTS: usize = 8;

/// Result of starting to cook.
#[derive(Debug)]
pub struct CookStarted {
    /// The order, now `cooking`.
    pub order: Order,
    /// Cook timer; resolves to the `ready` order, or `None` when the order
    /// left `cooking` before the timer elapsed.
    pub timer: JoinHandle<PatisserieResult<Option<Order>>>,
}

/// Result of a staff delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTicket {
    /// The order, now `delivered`.
    pub order: Order,
    /// Text the deliverer posts for the customer.
    pub message: String,
}

/// Drives orders through their lifecycle.
#[derive(Debug, Clone)]
pub struct OrderService {
    pub(crate) backends: Backends,
    pub(crate) settings: KitchenSettings,
}

impl OrderService {
    /// Create a service over `backends`.
    pub fn new(backends: Backends, settings: KitchenSettings) -> Self {
        Self { backends, settings }
    }

    /// Settings in use.
    pub fn settings(&self) -> &KitchenSettings {
        &self.settings
    }

    /// Places a new `pending` order.
    ///
    /// Lapsed temporary suspensions are cleared here. Permanent bans are not.
    ///
    /// # Errors
    ///
    /// `Banned`, `TemporarilyBanned` or `AlreadyActive`.
    #[instrument(skip(self, new), fields(customer = %new.customer_id()))]
    pub async fn create(&self, new: NewOrder) -> PatisserieResult<Order> {
        let now = self.backends.clock.now();
        let customer = *new.customer_id();

        if let Some(record) = self.backends.ledger.get(customer).await? {
            record.ensure_may_order(now)?;
            if record.has_lapsed_suspension(now)
                && self
                    .backends
                    .ledger
                    .clear_lapsed_suspension(customer, now)
                    .await?
            {
                debug!("Cleared lapsed suspension");
            }
        }

        let is_vip = self
            .backends
            .premium
            .grant(customer)
            .await?
            .is_some_and(|grant| grant.is_active(now));

        let order = self.insert_with_fresh_id(new, is_vip, now).await?;
        info!(order_id = %order.order_id(), is_vip, "Order created");

        self.record_audit(&order).await;
        let badge = if is_vip { "💎 VIP " } else { "" };
        self.notify(
            Recipient::Staff(StaffChannel::Kitchen),
            &format!(
                "🆕 {}Order `{}`: {}\nUse `/claim {}`",
                badge,
                order.order_id(),
                order.item(),
                order.order_id()
            ),
        )
        .await;
        Ok(order)
    }

    async fn insert_with_fresh_id(
        &self,
        new: NewOrder,
        is_vip: bool,
        now: DateTime<Utc>,
    ) -> PatisserieResult<Order> {
        let mut attempt = 1;
        loop {
            let order = Order::create(OrderId::generate(), new.clone(), is_vip, now);
            match self.backends.orders.insert_if_no_active(&order).await {
                Ok(()) => return Ok(order),
                Err(e)
                    if attempt < MAX_ID_ATTEMPTS
                        && matches!(e.store_kind(), Some(StoreErrorKind::DuplicateKey(_))) =>
                {
                    debug!(order_id = %order.order_id(), attempt, "Order id taken, drawing another");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// `pending → claimed`.
    ///
    /// # Errors
    ///
    /// `NotFound` or `InvalidState`.
    #[instrument(skip(self), fields(order_id = %id, chef = %chef))]
    pub async fn claim(&self, id: &OrderId, chef: MemberId) -> PatisserieResult<Order> {
        let chef_name = self.backends.directory.display_name(chef).await?;
        let order = self
            .apply(
                id,
                &OrderAction::Claim {
                    chef,
                    chef_name: chef_name.clone(),
                },
            )
            .await?;
        info!("Order claimed");

        self.notify(
            Recipient::Member(*order.customer_id()),
            &format!(
                "👨‍🍳 **Update:** Your order `{}` has been claimed by **{}**! Cooking will begin shortly.",
                id, chef_name
            ),
        )
        .await;
        Ok(order)
    }

    /// `claimed → pending` by the claimant or a manager.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidState` or `NotOwner`.
    #[instrument(skip(self), fields(order_id = %id, actor = %actor))]
    pub async fn unclaim(
        &self,
        id: &OrderId,
        actor: MemberId,
        privileged: bool,
    ) -> PatisserieResult<Order> {
        let order = self
            .apply(id, &OrderAction::Unclaim { actor, privileged })
            .await?;
        info!("Order released");
        Ok(order)
    }

    /// `claimed → cooking`, then starts the cook timer.
    ///
    /// The acting member's cook counters are incremented right away.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidState`, `NotOwner` or `OutOfRange`.
    #[instrument(skip(self, images), fields(order_id = %id, actor = %actor, images = images.len()))]
    pub async fn cook(
        &self,
        id: &OrderId,
        actor: MemberId,
        privileged: bool,
        images: Vec<String>,
    ) -> PatisserieResult<CookStarted> {
        let order = self
            .apply(
                id,
                &OrderAction::Cook {
                    actor,
                    privileged,
                    images,
                },
            )
            .await?;

        let timer = self.start_cook_timer(order.order_id().clone());
        let minutes = self.settings.cook_duration().as_secs().div_ceil(60);
        self.notify(
            Recipient::Member(*order.customer_id()),
            &format!(
                "🍳 **Cooking Started!** Your order `{}` is on the stove. Ready in about {} minute(s).",
                id, minutes
            ),
        )
        .await;

        self.backends.ledger.increment(actor, RoleGroup::Cook).await?;
        info!("Cooking started");
        Ok(CookStarted { order, timer })
    }

    fn start_cook_timer(&self, id: OrderId) -> JoinHandle<PatisserieResult<Option<Order>>> {
        let service = self.clone();
        let duration: Duration = *self.settings.cook_duration();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            service.finish_cooking(&id).await
        })
    }

    /// `cooking → ready`, stamping `ready_at`.
    ///
    /// Returns `None` when the order is no longer cooking, for example
    /// because it was cancelled while the timer ran.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn finish_cooking(&self, id: &OrderId) -> PatisserieResult<Option<Order>> {
        let finished = self
            .finish_cooking_if(id, |order, _| *order.status() == OrderStatus::Cooking)
            .await?;
        if finished.is_none() {
            info!("Cook timer elapsed after the order left cooking");
        }
        Ok(finished)
    }

    /// `cooking → ready` for an order that has cooked for at least `after`.
    ///
    /// Sweep counterpart of the cook timer, for timers lost across a restart.
    /// Returns `false` when the guard no longer holds.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn finish_overdue_cooking(
        &self,
        id: &OrderId,
        after: Duration,
    ) -> PatisserieResult<bool> {
        let finished = self
            .finish_cooking_if(id, |order, now| order.cooking_overdue(now, after))
            .await?;
        Ok(finished.is_some())
    }

    async fn finish_cooking_if(
        &self,
        id: &OrderId,
        guard: impl Fn(&Order, DateTime<Utc>) -> bool + Send + Sync,
    ) -> PatisserieResult<Option<Order>> {
        let Some(order) = self
            .transition(id, &OrderAction::FinishCooking, guard)
            .await?
        else {
            return Ok(None);
        };
        info!("Order ready");

        self.notify(
            Recipient::Member(*order.customer_id()),
            &format!(
                "📦 **Order Ready!** Your treat `{}` is fresh out of the oven. Waiting for a delivery driver!",
                id
            ),
        )
        .await;
        self.notify(
            Recipient::Staff(StaffChannel::Counter),
            &format!(
                "📦 **Ready!** `{}`\nChef: {}\nUse `/deliver {}`",
                id,
                chef_label(&order),
                id
            ),
        )
        .await;
        Ok(Some(order))
    }

    /// `ready → delivered` by staff; composes the delivery text.
    ///
    /// # Errors
    ///
    /// `NotFound` or `InvalidState`.
    #[instrument(skip(self), fields(order_id = %id, deliverer = %deliverer))]
    pub async fn deliver(
        &self,
        id: &OrderId,
        deliverer: MemberId,
    ) -> PatisserieResult<DeliveryTicket> {
        let order = self.apply(id, &OrderAction::Deliver { deliverer }).await?;
        self.backends
            .ledger
            .increment(deliverer, RoleGroup::Delivery)
            .await?;
        info!("Order delivered");

        let script = self.backends.scripts.script(deliverer).await?;
        let message = compose_delivery_message(&order, script.as_deref());

        self.notify(
            Recipient::Member(deliverer),
            &format!("🚴 **Delivery** `{}`\n**Post This:**\n```\n{}\n```", id, message),
        )
        .await;
        self.notify(
            Recipient::Member(*order.customer_id()),
            &format!(
                "✅ **Delivered!** Your order `{}` is on its way. Rate it with `/rate {} <1-5>`.",
                id, id
            ),
        )
        .await;
        Ok(DeliveryTicket { order, message })
    }

    /// Reverts a claim older than `after` to `pending`.
    ///
    /// Returns `false` when the order no longer qualifies, so repeated sweeps
    /// are harmless.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn auto_unclaim(&self, id: &OrderId, after: Duration) -> PatisserieResult<bool> {
        let reverted = self
            .transition(id, &OrderAction::AutoUnclaim, |order, now| {
                order.claim_expired(now, after)
            })
            .await?;
        if reverted.is_none() {
            return Ok(false);
        }
        info!("Claim expired");

        self.notify(
            Recipient::Staff(StaffChannel::Kitchen),
            &format!("📢 **Claim Expired!** `{}` is **Pending** again.", id),
        )
        .await;
        Ok(true)
    }

    /// Delivers an order that has been ready longer than `after`, as the
    /// system. No counters move.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn auto_deliver(&self, id: &OrderId, after: Duration) -> PatisserieResult<bool> {
        let Some(order) = self
            .transition(id, &OrderAction::AutoDeliver, |order, now| {
                order.delivery_overdue(now, after)
            })
            .await?
        else {
            return Ok(false);
        };
        info!("Order auto-delivered");

        self.notify(
            Recipient::Origin {
                guild_id: *order.guild_id(),
                channel_id: *order.origin_channel_id(),
            },
            &format!(
                "{} 🤖 **Auto-Delivery**\nChef: {}\n{}",
                order.customer_id().mention(),
                chef_label(&order),
                images_block(&order)
            ),
        )
        .await;
        self.notify(
            Recipient::Staff(StaffChannel::Counter),
            &format!("🤖 **Auto-Delivered** `{}`.", id),
        )
        .await;
        Ok(true)
    }

    /// Rates a delivered order, once.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotOwner`, `InvalidState` or `OutOfRange`.
    #[instrument(skip(self), fields(order_id = %id, customer = %customer))]
    pub async fn rate(
        &self,
        id: &OrderId,
        customer: MemberId,
        stars: i64,
    ) -> PatisserieResult<Order> {
        let order = self
            .apply(id, &OrderAction::Rate { customer, stars })
            .await?;
        info!(stars, "Order rated");

        let shown = order.rating().map(usize::from).unwrap_or_default();
        self.notify(
            Recipient::Staff(StaffChannel::Ratings),
            &format!(
                "{} **Rating!** `{}`\nChef: {}",
                "⭐".repeat(shown),
                id,
                chef_label(&order)
            ),
        )
        .await;
        Ok(order)
    }

    /// Records a complaint and forwards it to management.
    ///
    /// # Errors
    ///
    /// `NotFound` or `NotOwner`.
    #[instrument(skip(self, text), fields(order_id = %id, customer = %customer))]
    pub async fn complain(
        &self,
        id: &OrderId,
        customer: MemberId,
        text: String,
    ) -> PatisserieResult<Order> {
        let order = self
            .apply(
                id,
                &OrderAction::Complain {
                    customer,
                    text: text.clone(),
                },
            )
            .await?;
        info!("Complaint filed");

        self.notify(
            Recipient::Staff(StaffChannel::Complaints),
            &format!(
                "🚨 **Complaint** `{}`\nUser: {}\nMsg: {}",
                id,
                customer.mention(),
                text
            ),
        )
        .await;
        Ok(order)
    }

    /// Applies `action` to the current record, retrying when another writer
    /// got there first.
    pub(crate) async fn apply(&self, id: &OrderId, action: &OrderAction) -> PatisserieResult<Order> {
        self.transition(id, action, |_, _| true)
            .await?
            .ok_or_else(|| StoreError::new(StoreErrorKind::Conflict(format!("order {id}"))).into())
    }

    /// Read, check `guard`, validate, conditional write; repeat on conflict.
    ///
    /// Returns `None` when `guard` rejects the current record.
    async fn transition(
        &self,
        id: &OrderId,
        action: &OrderAction,
        guard: impl Fn(&Order, DateTime<Utc>) -> bool + Send + Sync,
    ) -> PatisserieResult<Option<Order>> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.load(id).await?;
            let now = self.backends.clock.now();
            if !guard(&current, now) {
                return Ok(None);
            }

            let next = current.apply(action, now)?;
            if self.backends.orders.compare_and_set(&current, &next).await? {
                debug!(
                    order_id = %id,
                    action = action.as_ref(),
                    from = %current.status(),
                    to = %next.status(),
                    "Transition committed"
                );
                self.record_audit(&next).await;
                return Ok(Some(next));
            }
            debug!(order_id = %id, attempt, "Order changed underneath, retrying");
        }

        Err(StoreError::new(StoreErrorKind::Conflict(format!("order {id}"))).into())
    }

    /// Loads an order or reports `NotFound`.
    pub(crate) async fn load(&self, id: &OrderId) -> PatisserieResult<Order> {
        self.backends
            .orders
            .get(id)
            .await?
            .ok_or_else(|| ActionError::new(ActionErrorKind::NotFound(format!("order {id}"))).into())
    }

    async fn record_audit(&self, order: &Order) {
        if let Err(e) = self.backends.audit.record(order).await {
            warn!(order_id = %order.order_id(), error = %e, "Audit log write failed");
        }
    }

    pub(crate) async fn notify(&self, to: Recipient, message: &str) {
        notify_best_effort(self.backends.sink.as_ref(), &to, message).await;
    }
}
