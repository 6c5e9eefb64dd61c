use chrono::{Duration, TimeZone, Utc};
use patisserie_core::{
    ChannelId, GuildId, MemberId, NewOrder, Order, OrderAction, OrderId, OrderStatus,
    PremiumCode, PremiumGrant, RoleGroup, VacationRequest, VacationStatus,
};
use patisserie_error::ActionErrorKind;
use patisserie_interface::{
    ActivityLedger, AuditLog, OrderFilter, OrderStore, PremiumStore, VacationStore,
    WatermarkStore,
};
use patisserie_storage::{
    InMemoryActivityLedger, InMemoryAuditLog, InMemoryOrderStore, InMemoryPremiumStore,
    InMemoryVacationStore, InMemoryWatermarkStore,
};

fn order(id: &str, customer: u64) -> Order {
    Order::create(
        OrderId::new(id),
        NewOrder::new(MemberId(customer), GuildId(1), ChannelId(2), "cupcake".to_string()),
        false,
        Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn concurrent_creates_leave_one_active_order() {
    let store = InMemoryOrderStore::new();
    let attempts = (0..8).map(|i| {
        let store = store.clone();
        tokio::spawn(async move { store.insert_if_no_active(&order(&format!("A0000{i}"), 9)).await })
    });
    let results = futures::future::join_all(attempts).await;

    let wins = results.iter().filter(|r| matches!(r, Ok(Ok(())))).count();
    assert_eq!(wins, 1);
    for result in results {
        if let Ok(Err(e)) = result {
            assert!(matches!(e.action_kind(), Some(ActionErrorKind::AlreadyActive(_))));
        }
    }
    let active = store
        .list(&OrderFilter::active().with_customer(MemberId(9)))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn terminal_order_frees_the_slot() {
    let store = InMemoryOrderStore::new();
    let first = order("AAA111", 5);
    store.insert_if_no_active(&first).await.unwrap();

    let cancelled = first.apply(&OrderAction::Warn, Utc::now()).unwrap();
    assert!(store.compare_and_set(&first, &cancelled).await.unwrap());

    store.insert_if_no_active(&order("BBB222", 5)).await.unwrap();
}

#[tokio::test]
async fn stale_revision_loses_compare_and_set() {
    let store = InMemoryOrderStore::new();
    let base = order("CCC333", 1);
    store.insert_if_no_active(&base).await.unwrap();

    let claim = |chef: u64| OrderAction::Claim {
        chef: MemberId(chef),
        chef_name: format!("chef {chef}"),
    };
    let first = base.apply(&claim(10), Utc::now()).unwrap();
    let second = base.apply(&claim(11), Utc::now()).unwrap();

    assert!(store.compare_and_set(&base, &first).await.unwrap());
    assert!(!store.compare_and_set(&base, &second).await.unwrap());

    let stored = store.get(&OrderId::new("CCC333")).await.unwrap().unwrap();
    assert_eq!(*stored.chef_id(), Some(MemberId(10)));
    assert_eq!(*stored.status(), OrderStatus::Claimed);
}

#[tokio::test]
async fn ledger_increments_and_closes_week() {
    let ledger = InMemoryActivityLedger::new();
    let member = MemberId(3);
    for _ in 0..3 {
        ledger.increment(member, RoleGroup::Cook).await.unwrap();
    }
    ledger.increment(member, RoleGroup::Delivery).await.unwrap();

    let record = ledger.get(member).await.unwrap().unwrap();
    assert_eq!(*record.cook_count_week(), 3);
    assert_eq!(*record.deliver_count_total(), 1);

    ledger.close_week(member, RoleGroup::Cook, 1).await.unwrap();
    let record = ledger.get(member).await.unwrap().unwrap();
    assert_eq!(*record.cook_count_week(), 0);
    assert_eq!(*record.cook_count_total(), 3);
    assert_eq!(*record.quota_fails_cook(), 1);
}

#[tokio::test]
async fn concurrent_warnings_are_counted_once_each() {
    let ledger = InMemoryActivityLedger::new();
    let tasks = (0..9).map(|_| {
        let ledger = ledger.clone();
        tokio::spawn(async move { ledger.add_warning(MemberId(4)).await.unwrap() })
    });
    let mut totals: Vec<u32> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    totals.sort_unstable();
    assert_eq!(totals, (1..=9).collect::<Vec<_>>());
}

#[tokio::test]
async fn lapsed_suspension_clears_but_permanent_ban_stays() {
    let ledger = InMemoryActivityLedger::new();
    let now = Utc::now();
    let member = MemberId(6);

    ledger.suspend_until(member, now - Duration::hours(1)).await.unwrap();
    ledger.ban(member).await.unwrap();

    assert!(ledger.clear_lapsed_suspension(member, now).await.unwrap());
    let record = ledger.get(member).await.unwrap().unwrap();
    assert!(record.ban_expires_at().is_none());
    assert!(*record.is_banned());

    assert!(!ledger.clear_lapsed_suspension(member, now).await.unwrap());
}

#[tokio::test]
async fn double_redeem_has_one_winner() {
    let store = InMemoryPremiumStore::new();
    let now = Utc::now();
    store
        .insert_codes(&[PremiumCode::issue("VIP-AAAA-BBBB-CCCC", 30, MemberId(1), now)])
        .await
        .unwrap();

    let tasks = [MemberId(20), MemberId(21)].map(|member| {
        let store = store.clone();
        tokio::spawn(async move { store.redeem("VIP-AAAA-BBBB-CCCC", member, now).await })
    });
    let results = futures::future::join_all(tasks).await;
    let wins = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    assert_eq!(wins, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Ok(Err(e)) if matches!(e.action_kind(), Some(ActionErrorKind::DuplicateRedemption(_)))
    )));

    let err = store.redeem("VIP-ZZZZ-ZZZZ-ZZZZ", MemberId(22), now).await.unwrap_err();
    assert!(matches!(err.action_kind(), Some(ActionErrorKind::NotFound(_))));
}

#[tokio::test]
async fn redeem_stores_the_grant_with_the_code() {
    let store = InMemoryPremiumStore::new();
    let now = Utc::now();
    let member = MemberId(30);
    store
        .insert_codes(&[PremiumCode::issue("VIP-1111-2222-3333", 30, MemberId(1), now)])
        .await
        .unwrap();
    store.put_grant(&PremiumGrant::permanent(member)).await.unwrap();

    let (code, grant) = store.redeem("VIP-1111-2222-3333", member, now).await.unwrap();

    assert_eq!(*code.redeemed_by(), Some(member));
    assert_eq!(*grant.expires_at(), None);
    assert_eq!(store.grant(member).await.unwrap(), Some(grant));
}

#[tokio::test]
async fn watermark_blocks_runs_within_gap() {
    let store = InMemoryWatermarkStore::new();
    let sunday = Utc.with_ymd_and_hms(2025, 6, 1, 23, 0, 0).unwrap();
    let gap = Duration::hours(12);

    assert!(store.claim_quota_run(sunday, gap).await.unwrap());
    assert!(!store.claim_quota_run(sunday + Duration::minutes(30), gap).await.unwrap());
    assert_eq!(store.last_quota_run().await.unwrap(), Some(sunday));
    assert!(store.claim_quota_run(sunday + Duration::days(7), gap).await.unwrap());
}

#[tokio::test]
async fn watermark_release_restores_only_its_own_claim() {
    let store = InMemoryWatermarkStore::new();
    let sunday = Utc.with_ymd_and_hms(2025, 6, 1, 23, 0, 0).unwrap();
    let gap = Duration::hours(12);

    assert!(store.claim_quota_run(sunday, gap).await.unwrap());
    assert!(store.release_quota_run(sunday, None).await.unwrap());
    assert_eq!(store.last_quota_run().await.unwrap(), None);

    let retry = sunday + Duration::minutes(30);
    assert!(store.claim_quota_run(retry, gap).await.unwrap());
    assert!(!store.release_quota_run(sunday, None).await.unwrap());
    assert_eq!(store.last_quota_run().await.unwrap(), Some(retry));
}

#[tokio::test]
async fn vacation_submit_refuses_while_active() {
    let store = InMemoryVacationStore::new();
    let now = Utc::now();
    let request = VacationRequest::request(MemberId(8), 5, "trip", now).unwrap();
    store.submit(&request).await.unwrap();

    let err = store.submit(&request).await.unwrap_err();
    assert!(matches!(err.action_kind(), Some(ActionErrorKind::AlreadyActive(_))));

    let active = request.approve(None, now).unwrap();
    assert!(store.update_if_status(VacationStatus::Pending, &active).await.unwrap());
    assert!(!store.update_if_status(VacationStatus::Pending, &active).await.unwrap());
    assert_eq!(store.list_by_status(VacationStatus::Active).await.unwrap().len(), 1);
}

#[tokio::test]
async fn audit_keeps_the_newest_revision() {
    let log = InMemoryAuditLog::new();
    let pending = order("AB0001", 4);
    let claimed = pending
        .apply(
            &OrderAction::Claim {
                chef: MemberId(10),
                chef_name: "chef".to_string(),
            },
            Utc::now(),
        )
        .unwrap();

    log.record(&claimed).await.unwrap();
    log.record(&pending).await.unwrap();

    let entry = log.entry(pending.order_id()).await.unwrap();
    assert_eq!(*entry.status(), OrderStatus::Claimed);
    assert_eq!(*entry.revision(), 1);
    assert_eq!(log.writes().await, 1);
}
