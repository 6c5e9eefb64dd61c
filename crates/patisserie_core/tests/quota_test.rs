use patisserie_core::{QuotaOutcome, QuotaTargets, QuotaTier, evaluate_member};

const CAP: u64 = 30;
const MIN_VOLUME: u64 = 5;
const MAX_FAILS: u32 = 2;

#[test]
fn fair_share_targets() {
    let targets = QuotaTargets::compute(12, 3, CAP);
    assert_eq!(*targets.normal(), 4);
    assert_eq!(*targets.senior(), 2);
}

#[test]
fn targets_are_capped_and_floored() {
    let targets = QuotaTargets::compute(1000, 2, CAP);
    assert_eq!(*targets.normal(), 30);
    assert_eq!(*targets.senior(), 15);

    let targets = QuotaTargets::compute(1, 10, CAP);
    assert_eq!(*targets.normal(), 1);
    assert_eq!(*targets.senior(), 1);

    let targets = QuotaTargets::compute(0, 4, CAP);
    assert_eq!(*targets.normal(), 0);
    assert_eq!(*targets.senior(), 0);
}

#[test]
fn done_at_target_passes_below_strikes() {
    let targets = QuotaTargets::compute(12, 3, CAP);

    let outcome = evaluate_member(&targets, QuotaTier::Normal, 4, false, 1, MAX_FAILS, MIN_VOLUME);
    assert_eq!(outcome, QuotaOutcome::Passed { done: 4, target: 4 });
    assert_eq!(outcome.fails_after(1), 0);

    let outcome = evaluate_member(&targets, QuotaTier::Normal, 3, false, 0, MAX_FAILS, MIN_VOLUME);
    assert_eq!(
        outcome,
        QuotaOutcome::Strike {
            done: 3,
            target: 4,
            strike: 1,
            limit: 2
        }
    );
    assert_eq!(outcome.fails_after(0), 1);
}

#[test]
fn senior_tier_uses_half_target() {
    let targets = QuotaTargets::compute(12, 3, CAP);
    let outcome = evaluate_member(&targets, QuotaTier::Senior, 2, false, 0, MAX_FAILS, MIN_VOLUME);
    assert!(matches!(outcome, QuotaOutcome::Passed { target: 2, .. }));
}

#[test]
fn second_consecutive_miss_removes_role() {
    let targets = QuotaTargets::compute(12, 3, CAP);
    let outcome = evaluate_member(&targets, QuotaTier::Normal, 0, false, 1, MAX_FAILS, MIN_VOLUME);
    assert_eq!(outcome, QuotaOutcome::RoleRemoved { done: 0, target: 4 });
    assert_eq!(outcome.fails_after(1), 0);
}

#[test]
fn bypass_and_low_traffic_are_exempt() {
    let targets = QuotaTargets::compute(12, 3, CAP);
    let outcome = evaluate_member(&targets, QuotaTier::Normal, 0, true, 1, MAX_FAILS, MIN_VOLUME);
    assert_eq!(outcome, QuotaOutcome::ExemptBypass);
    assert_eq!(outcome.fails_after(1), 1);

    let quiet = QuotaTargets::compute(4, 2, CAP);
    let outcome = evaluate_member(&quiet, QuotaTier::Normal, 0, false, 1, MAX_FAILS, MIN_VOLUME);
    assert_eq!(outcome, QuotaOutcome::ExemptLowTraffic { done: 0 });
    assert_eq!(outcome.fails_after(1), 1);
}

#[test]
fn single_member_is_judged_even_with_low_volume() {
    let solo = QuotaTargets::compute(2, 1, CAP);
    assert!(!solo.is_low_traffic(MIN_VOLUME));
    let outcome = evaluate_member(&solo, QuotaTier::Normal, 2, false, 0, MAX_FAILS, MIN_VOLUME);
    assert!(matches!(outcome, QuotaOutcome::Passed { .. }));
}
