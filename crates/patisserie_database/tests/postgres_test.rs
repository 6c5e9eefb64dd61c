//! Store tests against a live database.
//!
//! Run with `DATABASE_URL` set and `--features postgres-tests`.

#![cfg(feature = "postgres-tests")]

use chrono::{Duration, Utc};
use diesel::prelude::*;
use patisserie_core::{
    ChannelId, GuildId, MemberId, NewOrder, Order, OrderAction, OrderId, OrderStatus,
    PremiumCode, RoleGroup, VacationRequest, VacationStatus,
};
use patisserie_database::{PgPool, PostgresStores, connect_pool, run_migrations, schema};
use patisserie_error::{ActionErrorKind, StoreErrorKind};
use patisserie_interface::{
    ActivityLedger, AuditLog, OrderFilter, OrderStore, PremiumStore, ScriptStore, VacationStore,
    WatermarkStore,
};

fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = connect_pool(&url, 4).expect("pool");
    run_migrations(&pool).expect("migrations");
    pool
}

/// Member ids unlikely to collide across test runs.
fn fresh_member() -> MemberId {
    MemberId(rand::random::<u32>() as u64 + 1_000_000)
}

fn new_order(customer: MemberId) -> Order {
    Order::create(
        OrderId::generate(),
        NewOrder::new(customer, GuildId(1), ChannelId(2), "macaron".to_string()),
        false,
        Utc::now(),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn second_active_order_is_rejected_by_the_index() {
    let stores = PostgresStores::new(pool());
    let customer = fresh_member();

    stores.orders.insert_if_no_active(&new_order(customer)).await.unwrap();
    let err = stores
        .orders
        .insert_if_no_active(&new_order(customer))
        .await
        .unwrap_err();
    assert!(matches!(
        err.action_kind(),
        Some(ActionErrorKind::AlreadyActive(_))
    ));

    let active = stores
        .orders
        .list(&OrderFilter::active().with_customer(customer))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_revision_loses_the_update() {
    let stores = PostgresStores::new(pool());
    let order = new_order(fresh_member());
    stores.orders.insert_if_no_active(&order).await.unwrap();

    let claim = |chef: u64| OrderAction::Claim {
        chef: MemberId(chef),
        chef_name: format!("chef-{chef}"),
    };
    let first = order.apply(&claim(1), Utc::now()).unwrap();
    let second = order.apply(&claim(2), Utc::now()).unwrap();

    assert!(stores.orders.compare_and_set(&order, &first).await.unwrap());
    assert!(!stores.orders.compare_and_set(&order, &second).await.unwrap());

    let stored = stores.orders.get(order.order_id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), &OrderStatus::Claimed);
    assert_eq!(stored.chef_id(), &Some(MemberId(1)));
}

#[tokio::test(flavor = "multi_thread")]
async fn ledger_counters_are_atomic_upserts() {
    let stores = PostgresStores::new(pool());
    let member = fresh_member();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let ledger = stores.ledger.clone();
        tasks.push(tokio::spawn(async move {
            ledger.increment(member, RoleGroup::Cook).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(stores.ledger.add_warning(member).await.unwrap(), 1);
    assert_eq!(stores.ledger.add_warning(member).await.unwrap(), 2);

    let record = stores.ledger.get(member).await.unwrap().unwrap();
    assert_eq!(*record.cook_count_week(), 8);
    assert_eq!(*record.cook_count_total(), 8);

    stores.ledger.close_week(member, RoleGroup::Cook, 1).await.unwrap();
    let record = stores.ledger.get(member).await.unwrap().unwrap();
    assert_eq!(*record.cook_count_week(), 0);
    assert_eq!(*record.cook_count_total(), 8);
    assert_eq!(*record.quota_fails_cook(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn lapsed_suspension_clears_but_ban_stays() {
    let stores = PostgresStores::new(pool());
    let member = fresh_member();
    let now = Utc::now();

    stores.ledger.suspend_until(member, now + Duration::days(7)).await.unwrap();
    stores.ledger.ban(member).await.unwrap();
    assert!(!stores.ledger.clear_lapsed_suspension(member, now).await.unwrap());
    assert!(
        stores
            .ledger
            .clear_lapsed_suspension(member, now + Duration::days(8))
            .await
            .unwrap()
    );

    let record = stores.ledger.get(member).await.unwrap().unwrap();
    assert!(record.ban_expires_at().is_none());
    assert!(*record.is_banned());
}

#[tokio::test(flavor = "multi_thread")]
async fn code_redeems_exactly_once() {
    let stores = PostgresStores::new(pool());
    let owner = fresh_member();
    let code = patisserie_core::generate_code(&mut rand::thread_rng());
    stores
        .premium
        .insert_codes(&[PremiumCode::issue(code.clone(), 30, owner, Utc::now())])
        .await
        .unwrap();

    let a = stores.premium.redeem(&code, MemberId(1), Utc::now());
    let b = stores.premium.redeem(&code, MemberId(2), Utc::now());
    let (a, b) = tokio::join!(a, b);
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let loser = a.err().or(b.err()).unwrap();
    assert!(matches!(
        loser.action_kind(),
        Some(ActionErrorKind::DuplicateRedemption(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn open_vacation_blocks_a_new_request() {
    let stores = PostgresStores::new(pool());
    let member = fresh_member();
    let now = Utc::now();

    let request = VacationRequest::request(member, 3, "rest", now).unwrap();
    stores.vacations.submit(&request).await.unwrap();
    let err = stores.vacations.submit(&request).await.unwrap_err();
    assert!(matches!(
        err.action_kind(),
        Some(ActionErrorKind::AlreadyActive(_))
    ));

    let denied = request.deny("busy week").unwrap();
    assert!(
        stores
            .vacations
            .update_if_status(VacationStatus::Pending, &denied)
            .await
            .unwrap()
    );
    stores.vacations.submit(&request).await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn watermark_allows_one_claim_per_gap() {
    let pool = pool();
    {
        let mut conn = pool.get().unwrap();
        diesel::update(schema::bot_settings::table)
            .set(schema::bot_settings::value_at.eq(None::<chrono::DateTime<Utc>>))
            .execute(&mut conn)
            .unwrap();
    }
    let stores = PostgresStores::new(pool);
    let now = Utc::now();
    let gap = Duration::hours(12);

    assert!(stores.watermark.claim_quota_run(now, gap).await.unwrap());
    assert!(
        !stores
            .watermark
            .claim_quota_run(now + Duration::hours(1), gap)
            .await
            .unwrap()
    );
    assert_eq!(
        stores
            .watermark
            .last_quota_run()
            .await
            .unwrap()
            .map(|t| t.timestamp()),
        Some(now.timestamp())
    );

    assert!(stores.watermark.release_quota_run(now, None).await.unwrap());
    assert_eq!(stores.watermark.last_quota_run().await.unwrap(), None);
    assert!(!stores.watermark.release_quota_run(now, None).await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn scripts_are_replaced() {
    let stores = PostgresStores::new(pool());
    let member = fresh_member();

    assert_eq!(stores.scripts.script(member).await.unwrap(), None);
    stores.scripts.set_script(member, "Fresh from the oven!").await.unwrap();
    stores.scripts.set_script(member, "Bon appétit!").await.unwrap();
    assert_eq!(
        stores.scripts.script(member).await.unwrap().as_deref(),
        Some("Bon appétit!")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn audit_ignores_an_older_revision() {
    let stores = PostgresStores::new(pool());
    let pending = new_order(fresh_member());
    let claimed = pending
        .apply(
            &OrderAction::Claim {
                chef: fresh_member(),
                chef_name: "chef".to_string(),
            },
            Utc::now(),
        )
        .unwrap();

    stores.audit.record(&claimed).await.unwrap();
    stores.audit.record(&pending).await.unwrap();

    let entry = stores.audit.entry(pending.order_id()).await.unwrap().unwrap();
    assert_eq!(*entry.status(), OrderStatus::Claimed);
    assert_eq!(*entry.revision(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn taken_order_id_is_a_duplicate_key() {
    let stores = PostgresStores::new(pool());
    let first = new_order(fresh_member());
    stores.orders.insert_if_no_active(&first).await.unwrap();

    let clash = Order::create(
        first.order_id().clone(),
        NewOrder::new(fresh_member(), GuildId(1), ChannelId(2), "tart".to_string()),
        false,
        Utc::now(),
    );
    let err = stores.orders.insert_if_no_active(&clash).await.unwrap_err();
    assert!(matches!(err.store_kind(), Some(StoreErrorKind::DuplicateKey(_))));
}
