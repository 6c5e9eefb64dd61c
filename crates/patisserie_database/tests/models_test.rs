use chrono::{DateTime, TimeZone, Utc};
use patisserie_core::{
    ChannelId, Deliverer, GuildId, MemberId, NewOrder, Order, OrderAction, OrderId, OrderStatus,
    StaffActivityRecord, VacationRequest,
};
use patisserie_database::{ActivityRow, OrderRow, VacationRow, member_key};
use patisserie_error::StoreErrorKind;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap()
}

fn delivered_by_system() -> Order {
    let at = start();
    Order::create(
        OrderId::new("abc123"),
        NewOrder::new(MemberId(7), GuildId(1), ChannelId(2), "eclair".to_string()),
        true,
        at,
    )
    .apply(
        &OrderAction::Claim {
            chef: MemberId(100),
            chef_name: "Remy".to_string(),
        },
        at,
    )
    .and_then(|o| {
        o.apply(
            &OrderAction::Cook {
                actor: MemberId(100),
                privileged: false,
                images: vec!["a.png".to_string(), "b.png".to_string()],
            },
            at,
        )
    })
    .and_then(|o| o.apply(&OrderAction::FinishCooking, at))
    .and_then(|o| o.apply(&OrderAction::AutoDeliver, at))
    .unwrap()
}

#[test]
fn system_delivery_is_stored_as_sentinel() {
    let order = delivered_by_system();
    let row = OrderRow::try_from(&order).unwrap();

    assert_eq!(row.order_id, "ABC123");
    assert_eq!(row.status, "delivered");
    assert_eq!(row.deliverer.as_deref(), Some("AUTO_BOT"));
    assert_eq!(row.images.len(), 2);

    let back = Order::try_from(row).unwrap();
    assert_eq!(back.deliverer(), &Some(Deliverer::System));
    assert_eq!(back, order);
}

#[test]
fn large_snowflakes_survive_bigint_columns() {
    let member = MemberId(u64::MAX - 5);
    let key = member_key(member);
    assert!(key < 0);

    let mut row = ActivityRow::empty(member);
    row.warnings = 3;
    let record = StaffActivityRecord::try_from(row).unwrap();
    assert_eq!(*record.member_id(), member);
    assert_eq!(*record.warnings(), 3);
}

#[test]
fn unknown_status_is_corrupt() {
    let mut row = OrderRow::try_from(&delivered_by_system()).unwrap();
    row.status = "teleported".to_string();

    let err = Order::try_from(row).unwrap_err();
    assert!(matches!(err.kind, StoreErrorKind::Corrupt(_)));
}

#[test]
fn inconsistent_row_is_refused() {
    let mut row = OrderRow::try_from(&delivered_by_system()).unwrap();
    row.status = OrderStatus::Pending.to_string();

    let err = Order::try_from(row).unwrap_err();
    assert!(matches!(err.kind, StoreErrorKind::Corrupt(_)));
}

#[test]
fn negative_counters_are_corrupt() {
    let mut row = ActivityRow::empty(MemberId(9));
    row.cook_count_week = -1;

    let err = StaffActivityRecord::try_from(row).unwrap_err();
    assert!(matches!(err.kind, StoreErrorKind::Corrupt(_)));
}

#[test]
fn vacation_status_is_stored_snake_case() {
    let request = VacationRequest::request(MemberId(300), 5, "family trip", start()).unwrap();
    let row = VacationRow::try_from(&request).unwrap();

    assert_eq!(row.status, "pending");
    assert_eq!(row.days, 5);
    assert_eq!(VacationRequest::try_from(row).unwrap(), request);
}
