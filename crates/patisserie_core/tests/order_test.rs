use chrono::{DateTime, Duration, TimeZone, Utc};
use patisserie_core::{
    ChannelId, Deliverer, GuildId, MemberId, NewOrder, Order, OrderAction, OrderBuilder,
    OrderId, OrderStatus, AUTO_DELIVER_AFTER, AUTO_UNCLAIM_AFTER, COOK_DURATION,
};
use patisserie_error::ActionErrorKind;

const CUSTOMER: MemberId = MemberId(100);
const CHEF: MemberId = MemberId(200);
const OTHER_CHEF: MemberId = MemberId(201);
const DRIVER: MemberId = MemberId(300);

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn pending() -> Order {
    Order::create(
        OrderId::new("ABC123"),
        NewOrder::new(CUSTOMER, GuildId(1), ChannelId(2), "glazed donut".to_string()),
        false,
        t0(),
    )
}

fn claimed() -> Order {
    pending()
        .apply(
            &OrderAction::Claim {
                chef: CHEF,
                chef_name: "Remy".to_string(),
            },
            t0(),
        )
        .unwrap()
}

fn cooking() -> Order {
    claimed()
        .apply(
            &OrderAction::Cook {
                actor: CHEF,
                privileged: false,
                images: vec!["https://img/1.png".to_string()],
            },
            t0() + Duration::minutes(1),
        )
        .unwrap()
}

fn ready() -> Order {
    cooking()
        .apply(&OrderAction::FinishCooking, t0() + Duration::minutes(4))
        .unwrap()
}

fn delivered() -> Order {
    ready()
        .apply(&OrderAction::Deliver { deliverer: DRIVER }, t0() + Duration::minutes(5))
        .unwrap()
}

fn kind(result: Result<Order, patisserie_error::ActionError>) -> ActionErrorKind {
    result.unwrap_err().kind
}

#[test]
fn create_starts_pending_and_valid() {
    let order = pending();
    assert_eq!(*order.status(), OrderStatus::Pending);
    assert_eq!(*order.revision(), 0);
    assert!(order.validate().is_ok());
}

#[test]
fn claim_records_claimant_and_time() {
    let order = claimed();
    assert_eq!(*order.status(), OrderStatus::Claimed);
    assert_eq!(*order.chef_id(), Some(CHEF));
    assert_eq!(order.chef_name().as_deref(), Some("Remy"));
    assert_eq!(*order.claimed_at(), Some(t0()));
    assert_eq!(*order.revision(), 1);
    assert!(order.validate().is_ok());
}

#[test]
fn second_claim_is_invalid_state() {
    let err = kind(claimed().apply(
        &OrderAction::Claim {
            chef: OTHER_CHEF,
            chef_name: "Linguini".to_string(),
        },
        t0(),
    ));
    assert!(matches!(err, ActionErrorKind::InvalidState(_)));
}

#[test]
fn unclaim_by_other_cook_is_not_owner() {
    let err = kind(claimed().apply(
        &OrderAction::Unclaim {
            actor: OTHER_CHEF,
            privileged: false,
        },
        t0(),
    ));
    assert!(matches!(err, ActionErrorKind::NotOwner(_)));
}

#[test]
fn manager_may_unclaim_any_claim() {
    let order = claimed()
        .apply(
            &OrderAction::Unclaim {
                actor: OTHER_CHEF,
                privileged: true,
            },
            t0(),
        )
        .unwrap();
    assert_eq!(*order.status(), OrderStatus::Pending);
    assert!(order.chef_id().is_none());
    assert!(order.claimed_at().is_none());
    assert!(order.validate().is_ok());
}

#[test]
fn unclaim_pending_is_invalid_state() {
    let err = kind(pending().apply(
        &OrderAction::Unclaim {
            actor: CHEF,
            privileged: false,
        },
        t0(),
    ));
    assert!(matches!(err, ActionErrorKind::InvalidState(_)));
}

#[test]
fn cook_requires_claim_first() {
    let err = kind(pending().apply(
        &OrderAction::Cook {
            actor: CHEF,
            privileged: false,
            images: vec!["a".to_string()],
        },
        t0(),
    ));
    match err {
        ActionErrorKind::InvalidState(reason) => assert!(reason.contains("claimed first")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn cook_rejects_image_counts_outside_one_to_three() {
    for images in [vec![], vec!["a".to_string(); 4]] {
        let err = kind(claimed().apply(
            &OrderAction::Cook {
                actor: CHEF,
                privileged: false,
                images,
            },
            t0(),
        ));
        assert!(matches!(err, ActionErrorKind::OutOfRange { .. }));
    }
}

#[test]
fn cook_by_non_claimant_is_not_owner() {
    let err = kind(claimed().apply(
        &OrderAction::Cook {
            actor: OTHER_CHEF,
            privileged: false,
            images: vec!["a".to_string()],
        },
        t0(),
    ));
    assert!(matches!(err, ActionErrorKind::NotOwner(_)));
}

#[test]
fn manager_cook_keeps_original_chef() {
    let order = claimed()
        .apply(
            &OrderAction::Cook {
                actor: OTHER_CHEF,
                privileged: true,
                images: vec!["a".to_string(), "b".to_string()],
            },
            t0(),
        )
        .unwrap();
    assert_eq!(*order.chef_id(), Some(CHEF));
    assert_eq!(order.images().len(), 2);
}

#[test]
fn full_lifecycle_then_rate_once() {
    let order = delivered();
    assert_eq!(*order.deliverer(), Some(Deliverer::Staff(DRIVER)));
    assert!(order.ready_at().is_some());
    assert!(order.validate().is_ok());

    let rated = order
        .apply(
            &OrderAction::Rate {
                customer: CUSTOMER,
                stars: 5,
            },
            t0(),
        )
        .unwrap();
    assert_eq!(*rated.rating(), Some(5));

    let err = kind(rated.apply(
        &OrderAction::Rate {
            customer: CUSTOMER,
            stars: 4,
        },
        t0(),
    ));
    assert!(matches!(err, ActionErrorKind::InvalidState(_)));
}

#[test]
fn rate_checks_owner_status_and_range() {
    let err = kind(delivered().apply(
        &OrderAction::Rate {
            customer: DRIVER,
            stars: 5,
        },
        t0(),
    ));
    assert!(matches!(err, ActionErrorKind::NotOwner(_)));

    let err = kind(ready().apply(
        &OrderAction::Rate {
            customer: CUSTOMER,
            stars: 5,
        },
        t0(),
    ));
    assert!(matches!(err, ActionErrorKind::InvalidState(_)));

    for stars in [0, 6] {
        let err = kind(delivered().apply(
            &OrderAction::Rate {
                customer: CUSTOMER,
                stars,
            },
            t0(),
        ));
        assert!(matches!(err, ActionErrorKind::OutOfRange { .. }));
    }
}

#[test]
fn auto_deliver_uses_system_sentinel() {
    let order = ready().apply(&OrderAction::AutoDeliver, t0()).unwrap();
    assert_eq!(*order.status(), OrderStatus::Delivered);
    assert_eq!(*order.deliverer(), Some(Deliverer::System));
    assert_eq!(Deliverer::System.to_storage(), "AUTO_BOT");
    assert_eq!(Deliverer::from_storage("AUTO_BOT"), Some(Deliverer::System));
}

#[test]
fn warn_only_before_ready() {
    for order in [pending(), claimed(), cooking()] {
        let next = order.apply(&OrderAction::Warn, t0()).unwrap();
        assert_eq!(*next.status(), OrderStatus::CancelledWarn);
        assert!(next.validate().is_ok());
    }
    let err = kind(ready().apply(&OrderAction::Warn, t0()));
    assert!(matches!(err, ActionErrorKind::InvalidState(_)));
}

#[test]
fn force_cancel_only_after_ready() {
    for order in [ready(), delivered()] {
        let next = order.apply(&OrderAction::ForceCancel, t0()).unwrap();
        assert_eq!(*next.status(), OrderStatus::CancelledFdo);
        assert!(next.validate().is_ok());
    }
    let err = kind(cooking().apply(&OrderAction::ForceCancel, t0()));
    assert!(matches!(err, ActionErrorKind::InvalidState(_)));
}

#[test]
fn complain_keeps_status() {
    let order = cooking()
        .apply(
            &OrderAction::Complain {
                customer: CUSTOMER,
                text: "too slow".to_string(),
            },
            t0(),
        )
        .unwrap();
    assert_eq!(*order.status(), OrderStatus::Cooking);
    assert_eq!(order.complaint().as_deref(), Some("too slow"));
}

#[test]
fn finish_cooking_after_cancel_is_refused() {
    let cancelled = cooking().apply(&OrderAction::Warn, t0()).unwrap();
    let err = kind(cancelled.apply(&OrderAction::FinishCooking, t0()));
    assert!(matches!(err, ActionErrorKind::InvalidState(_)));
}

#[test]
fn timer_predicates_use_thresholds() {
    let order = claimed();
    assert!(!order.claim_expired(t0() + Duration::minutes(4), AUTO_UNCLAIM_AFTER));
    assert!(order.claim_expired(t0() + Duration::minutes(5), AUTO_UNCLAIM_AFTER));

    let order = ready();
    let ready_at = order.ready_at().unwrap();
    assert!(!order.delivery_overdue(ready_at + Duration::minutes(19), AUTO_DELIVER_AFTER));
    assert!(order.delivery_overdue(ready_at + Duration::minutes(21), AUTO_DELIVER_AFTER));

    let order = cooking();
    assert_eq!(*order.cooking_started_at(), Some(t0() + Duration::minutes(1)));
    assert!(!order.cooking_overdue(t0() + Duration::minutes(3), COOK_DURATION));
    assert!(order.cooking_overdue(t0() + Duration::minutes(4), COOK_DURATION));
    assert!(!ready().cooking_overdue(t0() + Duration::hours(1), COOK_DURATION));
}

#[test]
fn cook_start_time_travels_with_images() {
    assert!(ready().cooking_started_at().is_some());
    assert!(delivered().validate().is_ok());

    let cancelled = cooking().apply(&OrderAction::Warn, t0()).unwrap();
    assert!(cancelled.cooking_started_at().is_some());
    assert!(cancelled.validate().is_ok());

    let without_start = OrderBuilder::default()
        .order_id(OrderId::new("DEF789"))
        .customer_id(CUSTOMER)
        .guild_id(GuildId(1))
        .origin_channel_id(ChannelId(2))
        .item("eclair")
        .status(OrderStatus::Cooking)
        .chef_id(CHEF)
        .chef_name(Some("Remy".to_string()))
        .claimed_at(t0())
        .images(vec!["https://img/1.png".to_string()])
        .created_at(t0())
        .build()
        .unwrap();
    assert!(without_start.validate().unwrap_err().contains("cook start time"));
}

#[test]
fn validate_rejects_inconsistent_records() {
    let partial_chef = OrderBuilder::default()
        .order_id(OrderId::new("DEF456"))
        .customer_id(CUSTOMER)
        .guild_id(GuildId(1))
        .origin_channel_id(ChannelId(2))
        .item("eclair")
        .status(OrderStatus::Claimed)
        .chef_id(CHEF)
        .created_at(t0())
        .build()
        .unwrap();
    assert!(partial_chef.validate().is_err());

    let ready_without_images = OrderBuilder::default()
        .order_id(OrderId::new("DEF456"))
        .customer_id(CUSTOMER)
        .guild_id(GuildId(1))
        .origin_channel_id(ChannelId(2))
        .item("eclair")
        .status(OrderStatus::Ready)
        .chef_id(CHEF)
        .chef_name(Some("Remy".to_string()))
        .claimed_at(t0())
        .ready_at(t0())
        .created_at(t0())
        .build()
        .unwrap();
    assert!(ready_without_images.validate().is_err());
}

#[test]
fn order_ids_are_six_uppercase_hex() {
    let id = OrderId::generate();
    assert_eq!(id.as_str().len(), 6);
    assert!(
        id.as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    );
}
