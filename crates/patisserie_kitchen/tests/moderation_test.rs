use chrono::{DateTime, Duration, TimeZone, Utc};
use patisserie_core::{ChannelId, GuildId, ManualClock, MemberId, NewOrder, OrderStatus, Sanction};
use patisserie_error::ActionErrorKind;
use patisserie_interface::{Recipient, StaffChannel};
use patisserie_kitchen::{KitchenSettings, OrderService};
use patisserie_storage::InMemoryStack;
use std::sync::Arc;

const CUSTOMER: MemberId = MemberId(7);
const CHEF: MemberId = MemberId(100);
const MOD: MemberId = MemberId(900);

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap()
}

fn setup(settings: KitchenSettings) -> (InMemoryStack, ManualClock, OrderService) {
    let stack = InMemoryStack::new();
    let clock = ManualClock::new(start());
    let service = OrderService::new(stack.backends(Arc::new(clock.clone())), settings);
    (stack, clock, service)
}

fn muffin() -> NewOrder {
    NewOrder::new(CUSTOMER, GuildId(1), ChannelId(2), "muffin".to_string())
}

async fn strike(service: &OrderService) -> Sanction {
    let id = service.create(muffin()).await.unwrap().order_id().clone();
    service.warn(&id, MOD, "prank order").await.unwrap().sanction
}

#[tokio::test]
async fn strikes_escalate_through_suspensions_to_a_ban() {
    let (_stack, clock, service) = setup(KitchenSettings::default());

    assert_eq!(strike(&service).await, Sanction::Strike { warnings: 1 });
    assert_eq!(strike(&service).await, Sanction::Strike { warnings: 2 });
    let third = strike(&service).await;
    assert_eq!(
        third,
        Sanction::Suspended {
            warnings: 3,
            until: start() + Duration::days(7)
        }
    );

    let blocked = service.create(muffin()).await.unwrap_err();
    assert!(matches!(
        blocked.action_kind(),
        Some(ActionErrorKind::TemporarilyBanned(_))
    ));

    clock.advance(Duration::days(8));
    assert_eq!(strike(&service).await.warnings(), 4);
    assert_eq!(strike(&service).await.warnings(), 5);
    assert_eq!(
        strike(&service).await,
        Sanction::Suspended {
            warnings: 6,
            until: start() + Duration::days(38)
        }
    );

    clock.advance(Duration::days(31));
    strike(&service).await;
    strike(&service).await;
    assert_eq!(strike(&service).await, Sanction::PermanentBan { warnings: 9 });

    clock.advance(Duration::days(365));
    let banned = service.create(muffin()).await.unwrap_err();
    assert!(matches!(banned.action_kind(), Some(ActionErrorKind::Banned)));

    service.unban(CUSTOMER, MOD).await.unwrap();
    service.create(muffin()).await.unwrap();
}

#[tokio::test]
async fn warn_only_cancels_before_ready() {
    let (_stack, _clock, service) = setup(KitchenSettings::default());
    let id = service.create(muffin()).await.unwrap().order_id().clone();
    service.claim(&id, CHEF).await.unwrap();
    service
        .cook(&id, CHEF, false, vec!["img".to_string()])
        .await
        .unwrap()
        .timer
        .abort();
    service.finish_cooking(&id).await.unwrap();

    let err = service.warn(&id, MOD, "late").await.unwrap_err();
    assert!(matches!(err.action_kind(), Some(ActionErrorKind::InvalidState(_))));

    let issued = service.force_cancel(&id, MOD, "fake delivery").await.unwrap();
    assert_eq!(*issued.order.status(), OrderStatus::CancelledFdo);
    assert_eq!(issued.sanction, Sanction::Strike { warnings: 1 });

    service.create(muffin()).await.unwrap();
}

#[tokio::test]
async fn force_cancel_rejects_orders_still_in_the_kitchen() {
    let (_stack, _clock, service) = setup(KitchenSettings::default());
    let id = service.create(muffin()).await.unwrap().order_id().clone();

    let err = service.force_cancel(&id, MOD, "nope").await.unwrap_err();
    assert!(matches!(err.action_kind(), Some(ActionErrorKind::InvalidState(_))));
    assert_eq!(*service.info(&id).await.unwrap().status(), OrderStatus::Pending);
}

#[tokio::test]
async fn suspension_notice_carries_the_appeal_text() {
    let settings = KitchenSettings::builder()
        .appeal_notice("Appeal in #support".to_string())
        .build()
        .unwrap();
    let (stack, _clock, service) = setup(settings);

    for _ in 0..3 {
        strike(&service).await;
    }

    let dms = stack.sink.sent_to(&Recipient::Member(CUSTOMER)).await;
    let last = dms.last().unwrap();
    assert!(last.contains("SUSPENDED UNTIL"));
    assert!(last.contains("Appeal in #support"));
    assert!(!dms[0].contains("Appeal"));

    let log = stack
        .sink
        .sent_to(&Recipient::Staff(StaffChannel::Moderation))
        .await;
    assert_eq!(log.len(), 3);
    assert!(log[2].contains("Strikes: 3"));
}
