use chrono::{Duration, TimeZone, Utc};
use patisserie_core::{
    CodeStatus, MemberId, PremiumCode, PremiumGrant, VacationRequest, VacationStatus,
    generate_code,
};
use patisserie_error::ActionErrorKind;
use rand::SeedableRng;

#[test]
fn vacation_days_must_be_one_to_fourteen() {
    let now = Utc::now();
    for days in [0, 15, -1] {
        let err = VacationRequest::request(MemberId(1), days, "trip", now).unwrap_err();
        assert!(matches!(err.kind, ActionErrorKind::OutOfRange { .. }));
    }
    assert!(VacationRequest::request(MemberId(1), 14, "trip", now).is_ok());
}

#[test]
fn approve_with_edit_sets_end_date() {
    let now = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap();
    let request = VacationRequest::request(MemberId(1), 10, "exams", now).unwrap();
    let active = request.approve(Some(3), now).unwrap();
    assert_eq!(*active.status(), VacationStatus::Active);
    assert_eq!(*active.days(), 3);
    assert_eq!(*active.end_date(), Some(now + Duration::days(3)));

    assert!(!active.is_overdue(now + Duration::days(2)));
    assert!(active.is_overdue(now + Duration::days(4)));
    assert_eq!(*active.expire().status(), VacationStatus::Expired);

    let err = active.approve(None, now).unwrap_err();
    assert!(matches!(err.kind, ActionErrorKind::InvalidState(_)));
}

#[test]
fn deny_records_reason() {
    let now = Utc::now();
    let request = VacationRequest::request(MemberId(1), 5, "beach", now).unwrap();
    let denied = request.deny("peak week").unwrap();
    assert_eq!(*denied.status(), VacationStatus::Denied);
    assert_eq!(denied.denial_reason().as_deref(), Some("peak week"));
    assert!(denied.end_date().is_none());
}

#[test]
fn codes_follow_format() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let code = generate_code(&mut rng);
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "VIP");
        for part in &parts[1..] {
            assert_eq!(part.len(), 4);
            assert!(part.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}

#[test]
fn redeemed_code_grants_thirty_days() {
    let now = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap();
    let code = PremiumCode::issue("VIP-AAAA-BBBB-CCCC", 30, MemberId(1), now);
    assert_eq!(*code.status(), CodeStatus::Unused);

    let redeemed = code.redeemed(MemberId(2), now);
    assert_eq!(*redeemed.status(), CodeStatus::Redeemed);
    assert_eq!(*redeemed.redeemed_by(), Some(MemberId(2)));

    let grant = PremiumGrant::from_code(MemberId(2), &redeemed, now);
    assert_eq!(*grant.expires_at(), Some(now + Duration::days(30)));
    assert!(grant.is_active(now + Duration::days(29)));
    assert!(grant.is_lapsed(now + Duration::days(31)));
}

#[test]
fn redeeming_never_shortens_an_active_grant() {
    let now = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap();
    let member = MemberId(2);
    let code = PremiumCode::issue("VIP-AAAA-BBBB-CCCC", 30, MemberId(1), now).redeemed(member, now);

    let permanent = PremiumGrant::permanent(member);
    let grant = PremiumGrant::after_redeeming(member, Some(&permanent), &code, now);
    assert_eq!(*grant.expires_at(), None);
    assert!(*grant.is_vip());

    let long = PremiumGrant::from_code(member, &code, now + Duration::days(60));
    let grant = PremiumGrant::after_redeeming(member, Some(&long), &code, now);
    assert_eq!(*grant.expires_at(), Some(now + Duration::days(90)));

    let short = PremiumGrant::from_code(member, &code, now - Duration::days(25));
    let grant = PremiumGrant::after_redeeming(member, Some(&short), &code, now);
    assert_eq!(*grant.expires_at(), Some(now + Duration::days(30)));

    let revoked = PremiumGrant::revoked(member);
    let grant = PremiumGrant::after_redeeming(member, Some(&revoked), &code, now);
    assert_eq!(*grant.expires_at(), Some(now + Duration::days(30)));
}

#[test]
fn owner_grant_never_lapses() {
    let grant = PremiumGrant::permanent(MemberId(3));
    let far = Utc::now() + Duration::days(10_000);
    assert!(grant.is_active(far));
    assert!(!grant.is_lapsed(far));
    assert!(!PremiumGrant::revoked(MemberId(3)).is_active(far));
}
