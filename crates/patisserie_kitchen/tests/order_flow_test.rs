use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use patisserie_core::{
    AUTO_DELIVER_AFTER, AUTO_UNCLAIM_AFTER, ChannelId, Deliverer, GuildId, ManualClock, MemberId,
    NewOrder, Order, OrderId, OrderStatus, RoleGroup,
};
use patisserie_error::{ActionErrorKind, PatisserieResult, StoreError, StoreErrorKind};
use patisserie_interface::{ActivityLedger, OrderFilter, OrderStore, Recipient, StaffChannel};
use patisserie_kitchen::{KitchenSettings, OrderService};
use patisserie_storage::{InMemoryOrderStore, InMemoryStack};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const CUSTOMER: MemberId = MemberId(7);
const CHEF: MemberId = MemberId(100);
const OTHER_CHEF: MemberId = MemberId(101);
const DRIVER: MemberId = MemberId(200);

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap()
}

async fn setup() -> (InMemoryStack, ManualClock, OrderService) {
    let stack = InMemoryStack::new();
    stack.directory.add_member(CHEF, "Remy").await;
    stack.directory.add_member(DRIVER, "Linguini").await;
    let clock = ManualClock::new(start());
    let service = OrderService::new(
        stack.backends(Arc::new(clock.clone())),
        KitchenSettings::default(),
    );
    (stack, clock, service)
}

fn donut(customer: MemberId) -> NewOrder {
    NewOrder::new(customer, GuildId(1), ChannelId(2), "glazed donut".to_string())
}

fn photo() -> Vec<String> {
    vec!["https://cdn.example/donut.png".to_string()]
}

#[tokio::test(start_paused = true)]
async fn order_runs_from_pending_to_rated() {
    let (stack, _clock, service) = setup().await;

    let order = service.create(donut(CUSTOMER)).await.unwrap();
    assert_eq!(*order.status(), OrderStatus::Pending);
    assert_eq!(order.order_id().as_str().len(), 6);
    let kitchen = stack
        .sink
        .sent_to(&Recipient::Staff(StaffChannel::Kitchen))
        .await;
    assert!(kitchen[0].contains(order.order_id().as_str()));

    let id = order.order_id().clone();
    let claimed = service.claim(&id, CHEF).await.unwrap();
    assert_eq!(*claimed.status(), OrderStatus::Claimed);
    assert_eq!(claimed.chef_name().as_deref(), Some("Remy"));

    let started = service.cook(&id, CHEF, false, photo()).await.unwrap();
    assert_eq!(*started.order.status(), OrderStatus::Cooking);

    let ready = started.timer.await.unwrap().unwrap().unwrap();
    assert_eq!(*ready.status(), OrderStatus::Ready);
    assert!(ready.ready_at().is_some());
    let counter = stack
        .sink
        .sent_to(&Recipient::Staff(StaffChannel::Counter))
        .await;
    assert!(counter.iter().any(|m| m.contains("Remy")));

    let ticket = service.deliver(&id, DRIVER).await.unwrap();
    assert_eq!(*ticket.order.status(), OrderStatus::Delivered);
    assert_eq!(*ticket.order.deliverer(), Some(Deliverer::Staff(DRIVER)));
    assert!(ticket.message.starts_with("<@7> Here is your order! 🍩"));
    assert!(ticket.message.contains("Chef: Remy"));
    assert!(ticket.message.contains("https://cdn.example/donut.png"));

    let rated = service.rate(&id, CUSTOMER, 5).await.unwrap();
    assert_eq!(*rated.rating(), Some(5));

    let again = service.rate(&id, CUSTOMER, 4).await.unwrap_err();
    assert!(matches!(again.action_kind(), Some(ActionErrorKind::InvalidState(_))));

    let chef = stack.ledger.get(CHEF).await.unwrap().unwrap();
    assert_eq!(chef.weekly(RoleGroup::Cook), 1);
    assert_eq!(chef.lifetime(RoleGroup::Cook), 1);
    let driver = stack.ledger.get(DRIVER).await.unwrap().unwrap();
    assert_eq!(driver.weekly(RoleGroup::Delivery), 1);

    let stats = service.stats(DRIVER).await.unwrap();
    assert_eq!(*stats.average_rating(), Some(5.0));
    assert_eq!(*stats.rated_orders(), 1);

    let audited = stack.audit.entry(&id).await.unwrap();
    assert_eq!(*audited.status(), OrderStatus::Delivered);
}

#[tokio::test(start_paused = true)]
async fn cook_timer_does_nothing_after_cancellation() {
    let (stack, _clock, service) = setup().await;
    let id = service.create(donut(CUSTOMER)).await.unwrap().order_id().clone();
    service.claim(&id, CHEF).await.unwrap();
    let started = service.cook(&id, CHEF, false, photo()).await.unwrap();

    service.warn(&id, MemberId(900), "troll order").await.unwrap();

    assert!(started.timer.await.unwrap().unwrap().is_none());
    let order = service.info(&id).await.unwrap();
    assert_eq!(*order.status(), OrderStatus::CancelledWarn);
    assert!(
        stack
            .sink
            .sent_to(&Recipient::Staff(StaffChannel::Counter))
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn second_order_is_refused_while_one_is_active() {
    let (_stack, _clock, service) = setup().await;
    service.create(donut(CUSTOMER)).await.unwrap();

    let err = service.create(donut(CUSTOMER)).await.unwrap_err();
    assert!(matches!(err.action_kind(), Some(ActionErrorKind::AlreadyActive(_))));
    assert_eq!(service.queue().await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_creates_admit_one_order() {
    let (_stack, _clock, service) = setup().await;
    let attempts = (0..6).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.create(donut(CUSTOMER)).await })
    });
    let results = futures::future::join_all(attempts).await;

    let created = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    assert_eq!(created, 1);
    assert_eq!(service.queue().await.unwrap().len(), 1);
}

#[tokio::test]
async fn racing_claims_have_one_winner() {
    let (_stack, _clock, service) = setup().await;
    let id = service.create(donut(CUSTOMER)).await.unwrap().order_id().clone();

    let (first, second) = tokio::join!(service.claim(&id, CHEF), service.claim(&id, OTHER_CHEF));

    assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
    let loser = first.err().or(second.err()).unwrap();
    assert!(matches!(loser.action_kind(), Some(ActionErrorKind::InvalidState(_))));
}

#[tokio::test]
async fn only_the_claimant_cooks_unless_privileged() {
    let (stack, _clock, service) = setup().await;
    let id = service.create(donut(CUSTOMER)).await.unwrap().order_id().clone();

    let early = service.cook(&id, CHEF, false, photo()).await.unwrap_err();
    assert!(matches!(early.action_kind(), Some(ActionErrorKind::InvalidState(_))));

    service.claim(&id, CHEF).await.unwrap();
    let stranger = service.cook(&id, OTHER_CHEF, false, photo()).await.unwrap_err();
    assert!(matches!(stranger.action_kind(), Some(ActionErrorKind::NotOwner(_))));

    let no_images = service.cook(&id, CHEF, false, Vec::new()).await.unwrap_err();
    assert!(matches!(no_images.action_kind(), Some(ActionErrorKind::OutOfRange { .. })));
    let too_many = service
        .cook(&id, CHEF, false, vec!["a".into(), "b".into(), "c".into(), "d".into()])
        .await
        .unwrap_err();
    assert!(matches!(too_many.action_kind(), Some(ActionErrorKind::OutOfRange { .. })));

    let manager = MemberId(500);
    let started = service.cook(&id, manager, true, photo()).await.unwrap();
    started.timer.abort();
    assert_eq!(*started.order.chef_id(), Some(CHEF));
    let credited = stack.ledger.get(manager).await.unwrap().unwrap();
    assert_eq!(credited.weekly(RoleGroup::Cook), 1);
}

#[tokio::test]
async fn unclaim_returns_the_order_to_the_queue() {
    let (_stack, _clock, service) = setup().await;
    let id = service.create(donut(CUSTOMER)).await.unwrap().order_id().clone();
    service.claim(&id, CHEF).await.unwrap();

    let denied = service.unclaim(&id, OTHER_CHEF, false).await.unwrap_err();
    assert!(matches!(denied.action_kind(), Some(ActionErrorKind::NotOwner(_))));

    let released = service.unclaim(&id, CHEF, false).await.unwrap();
    assert_eq!(*released.status(), OrderStatus::Pending);
    assert!(released.chef_id().is_none());
    assert!(released.claimed_at().is_none());

    service.claim(&id, OTHER_CHEF).await.unwrap();
}

#[tokio::test]
async fn stale_claims_expire_once() {
    let (stack, clock, service) = setup().await;
    let id = service.create(donut(CUSTOMER)).await.unwrap().order_id().clone();
    service.claim(&id, CHEF).await.unwrap();

    clock.advance(Duration::minutes(3));
    assert!(!service.auto_unclaim(&id, AUTO_UNCLAIM_AFTER).await.unwrap());

    clock.advance(Duration::minutes(2));
    assert!(service.auto_unclaim(&id, AUTO_UNCLAIM_AFTER).await.unwrap());
    assert!(!service.auto_unclaim(&id, AUTO_UNCLAIM_AFTER).await.unwrap());

    let order = service.info(&id).await.unwrap();
    assert_eq!(*order.status(), OrderStatus::Pending);
    assert!(order.chef_id().is_none());
    let kitchen = stack
        .sink
        .sent_to(&Recipient::Staff(StaffChannel::Kitchen))
        .await;
    assert!(kitchen.iter().any(|m| m.contains("Claim Expired")));
}

#[tokio::test(start_paused = true)]
async fn overdue_ready_orders_are_delivered_by_the_system() {
    let (stack, clock, service) = setup().await;
    let id = service.create(donut(CUSTOMER)).await.unwrap().order_id().clone();
    service.claim(&id, CHEF).await.unwrap();
    let started = service.cook(&id, CHEF, false, photo()).await.unwrap();
    started.timer.await.unwrap().unwrap();

    clock.advance(Duration::minutes(20));
    assert!(!service.auto_deliver(&id, AUTO_DELIVER_AFTER).await.unwrap());

    clock.advance(Duration::seconds(1));
    assert!(service.auto_deliver(&id, AUTO_DELIVER_AFTER).await.unwrap());

    let order = service.info(&id).await.unwrap();
    assert_eq!(*order.status(), OrderStatus::Delivered);
    assert_eq!(*order.deliverer(), Some(Deliverer::System));

    let origin = stack
        .sink
        .sent_to(&Recipient::Origin {
            guild_id: GuildId(1),
            channel_id: ChannelId(2),
        })
        .await;
    assert_eq!(origin.len(), 1);
    assert!(origin[0].starts_with("<@7>"));

    let chef = stack.ledger.get(CHEF).await.unwrap().unwrap();
    assert_eq!(chef.weekly(RoleGroup::Delivery), 0);
}

#[tokio::test]
async fn failed_notification_keeps_the_transition() {
    let (stack, _clock, service) = setup().await;
    stack.sink.fail_for(Recipient::Member(CUSTOMER)).await;
    let id = service.create(donut(CUSTOMER)).await.unwrap().order_id().clone();

    let claimed = service.claim(&id, CHEF).await.unwrap();

    assert_eq!(*claimed.status(), OrderStatus::Claimed);
    assert!(stack.sink.sent_to(&Recipient::Member(CUSTOMER)).await.is_empty());
}

#[tokio::test]
async fn only_the_customer_rates_or_complains() {
    let (stack, _clock, service) = setup().await;
    let id = service.create(donut(CUSTOMER)).await.unwrap().order_id().clone();

    let early = service.rate(&id, CUSTOMER, 5).await.unwrap_err();
    assert!(matches!(early.action_kind(), Some(ActionErrorKind::InvalidState(_))));

    let stranger = service
        .complain(&id, MemberId(8), "cold".to_string())
        .await
        .unwrap_err();
    assert!(matches!(stranger.action_kind(), Some(ActionErrorKind::NotOwner(_))));

    let order = service
        .complain(&id, CUSTOMER, "taking forever".to_string())
        .await
        .unwrap();
    assert_eq!(order.complaint().as_deref(), Some("taking forever"));
    let complaints = stack
        .sink
        .sent_to(&Recipient::Staff(StaffChannel::Complaints))
        .await;
    assert!(complaints[0].contains("taking forever"));
}

#[tokio::test]
async fn missing_orders_report_not_found() {
    let (_stack, _clock, service) = setup().await;
    let err = service
        .claim(&"ZZZZZZ".into(), CHEF)
        .await
        .unwrap_err();
    assert!(matches!(err.action_kind(), Some(ActionErrorKind::NotFound(_))));
}

#[tokio::test]
async fn custom_script_is_used_for_delivery() {
    let (_stack, _clock, service) = setup().await;
    service.set_script(DRIVER, "  Enjoy, friend!  ").await.unwrap();
    let id = service.create(donut(CUSTOMER)).await.unwrap().order_id().clone();
    service.claim(&id, CHEF).await.unwrap();
    service.cook(&id, CHEF, false, photo()).await.unwrap().timer.abort();
    service.finish_cooking(&id).await.unwrap();

    let ticket = service.deliver(&id, DRIVER).await.unwrap();
    assert!(ticket.message.starts_with("<@7> Enjoy, friend!\nChef: Remy"));
}

/// Order store that reports the first few ids as already taken.
struct CollidingOrders {
    inner: InMemoryOrderStore,
    collisions: AtomicUsize,
    attempts: AtomicUsize,
}

#[async_trait]
impl OrderStore for CollidingOrders {
    async fn insert_if_no_active(&self, order: &Order) -> PatisserieResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let left = self.collisions.load(Ordering::SeqCst);
        if left > 0 {
            self.collisions.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::new(StoreErrorKind::DuplicateKey(format!(
                "order id {}",
                order.order_id()
            )))
            .into());
        }
        self.inner.insert_if_no_active(order).await
    }

    async fn get(&self, id: &OrderId) -> PatisserieResult<Option<Order>> {
        self.inner.get(id).await
    }

    async fn compare_and_set(&self, expected: &Order, next: &Order) -> PatisserieResult<bool> {
        self.inner.compare_and_set(expected, next).await
    }

    async fn list(&self, filter: &OrderFilter) -> PatisserieResult<Vec<Order>> {
        self.inner.list(filter).await
    }
}

fn colliding_service(
    stack: &InMemoryStack,
    collisions: usize,
) -> (Arc<CollidingOrders>, OrderService) {
    let store = Arc::new(CollidingOrders {
        inner: stack.orders.clone(),
        collisions: AtomicUsize::new(collisions),
        attempts: AtomicUsize::new(0),
    });
    let mut backends = stack.backends(Arc::new(ManualClock::new(start())));
    backends.orders = store.clone();
    (store, OrderService::new(backends, KitchenSettings::default()))
}

#[tokio::test]
async fn taken_order_id_is_redrawn() {
    let stack = InMemoryStack::new();
    let (store, service) = colliding_service(&stack, 2);

    let order = service.create(donut(CUSTOMER)).await.unwrap();

    assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(stack.orders.get(order.order_id()).await.unwrap(), Some(order));
}

#[tokio::test]
async fn persistent_id_collisions_surface_as_store_errors() {
    let stack = InMemoryStack::new();
    let (store, service) = colliding_service(&stack, usize::MAX);

    let err = service.create(donut(CUSTOMER)).await.unwrap_err();

    assert!(matches!(err.store_kind(), Some(StoreErrorKind::DuplicateKey(_))));
    assert_eq!(store.attempts.load(Ordering::SeqCst), 8);
    assert!(stack.orders.list(&OrderFilter::active()).await.unwrap().is_empty());
}
