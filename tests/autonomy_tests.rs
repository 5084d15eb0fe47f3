mod common;

use autopay::domain::event::LedgerEvent;
use autopay::domain::ledger::AutonomousState;
use autopay::error::LedgerError;
use common::{addr, admin, harness_with_period};

#[tokio::test]
async fn test_start_arms_first_cycle() {
    let h = harness_with_period(60_000).await;
    h.clock.set(5_000);

    let fire_at = h.engine.start(&admin()).await.unwrap();
    assert_eq!(fire_at, 65_000);
    assert_eq!(h.engine.next_fire_at().await.unwrap(), Some(65_000));
    assert_eq!(
        h.engine.stats().await.unwrap().autonomous_state,
        AutonomousState::Active
    );
    assert!(h
        .sink
        .events()
        .await
        .contains(&LedgerEvent::AutonomousStarted { fire_at: 65_000 }));
}

#[tokio::test]
async fn test_chain_rearms_each_cycle_while_active() {
    let h = harness_with_period(60_000).await;
    h.engine
        .add_payee(&admin(), addr("alice"), 1000, 60)
        .await
        .unwrap();
    h.engine.fund_ledger(&admin(), 5000).await.unwrap();
    let mut fire_at = h.engine.start(&admin()).await.unwrap();

    // Three cycles of the chain, delivered at their armed times.
    for _ in 0..3 {
        h.clock.set(fire_at);
        fire_at = h
            .engine
            .on_self_trigger(fire_at)
            .await
            .unwrap()
            .expect("active chain must re-arm");
    }

    // 60s interval, 60s period: each delivered cycle settles one salary.
    assert_eq!(h.engine.stats().await.unwrap().total_paid, 3000);
    assert_eq!(h.engine.next_fire_at().await.unwrap(), Some(fire_at));
}

// Pause lets the armed in-flight cycle run once, then the chain ends.
#[tokio::test]
async fn test_pause_allows_in_flight_cycle_then_stops() {
    let h = harness_with_period(60_000).await;
    h.engine
        .add_payee(&admin(), addr("alice"), 1000, 30)
        .await
        .unwrap();
    h.engine.fund_ledger(&admin(), 5000).await.unwrap();

    let fire_at = h.engine.start(&admin()).await.unwrap();
    h.engine.pause(&admin()).await.unwrap();

    // The already-armed trigger is delivered anyway.
    h.clock.set(fire_at);
    let rearm = h.engine.on_self_trigger(fire_at).await.unwrap();

    // It settled (payee was due) but did not re-arm.
    assert_eq!(rearm, None);
    assert_eq!(h.engine.next_fire_at().await.unwrap(), None);
    assert_eq!(h.engine.stats().await.unwrap().total_paid, 1000);

    let paid = h
        .sink
        .count(|e| matches!(e, LedgerEvent::SalaryPaid { .. }))
        .await;
    assert_eq!(paid, 1);
}

#[tokio::test]
async fn test_manual_settle_does_not_touch_the_chain() {
    let h = harness_with_period(60_000).await;
    h.engine
        .add_payee(&admin(), addr("alice"), 1000, 10)
        .await
        .unwrap();
    h.engine.fund_ledger(&admin(), 5000).await.unwrap();
    let fire_at = h.engine.start(&admin()).await.unwrap();

    h.clock.set(20_000);
    assert_eq!(h.engine.manual_settle(&admin()).await.unwrap(), 1);

    // Chain state and armed time are untouched.
    assert_eq!(h.engine.next_fire_at().await.unwrap(), Some(fire_at));
    assert_eq!(
        h.engine.stats().await.unwrap().autonomous_state,
        AutonomousState::Active
    );
}

#[tokio::test]
async fn test_restart_after_pause_resumes() {
    let h = harness_with_period(60_000).await;
    h.engine.start(&admin()).await.unwrap();
    h.engine.pause(&admin()).await.unwrap();
    h.engine.on_self_trigger(60_000).await.unwrap();
    assert_eq!(h.engine.next_fire_at().await.unwrap(), None);

    h.clock.set(120_000);
    let fire_at = h.engine.start(&admin()).await.unwrap();
    assert_eq!(fire_at, 180_000);
    assert_eq!(
        h.engine.on_self_trigger(fire_at).await.unwrap(),
        Some(240_000)
    );
}

#[tokio::test]
async fn test_controller_gating() {
    let h = harness_with_period(60_000).await;

    assert!(matches!(
        h.engine.start(&addr("mallory")).await,
        Err(LedgerError::Unauthorized)
    ));
    assert!(matches!(
        h.engine.pause(&addr("mallory")).await,
        Err(LedgerError::Unauthorized)
    ));

    h.engine.start(&admin()).await.unwrap();
    assert!(matches!(
        h.engine.start(&admin()).await,
        Err(LedgerError::InvalidArgument(_))
    ));
}

// A transfer failure inside a self-triggered cycle surfaces the error so
// the driver stops the chain rather than silently retrying.
#[tokio::test]
async fn test_failed_cycle_surfaces_error_for_fail_safe_stop() {
    let h = harness_with_period(60_000).await;
    h.engine
        .add_payee(&admin(), addr("alice"), 1000, 30)
        .await
        .unwrap();
    h.engine.fund_ledger(&admin(), 5000).await.unwrap();
    let fire_at = h.engine.start(&admin()).await.unwrap();

    h.transfers.fail_next().await;
    h.clock.set(fire_at);
    let err = h.engine.on_self_trigger(fire_at).await.unwrap_err();
    assert!(matches!(err, LedgerError::Transfer(_)));

    // Nothing was booked; an administrator restart picks the obligation
    // back up from stored state.
    assert_eq!(h.engine.stats().await.unwrap().total_paid, 0);
    assert_eq!(
        h.engine.on_self_trigger(fire_at).await.unwrap(),
        Some(fire_at + 60_000)
    );
    assert_eq!(h.engine.stats().await.unwrap().total_paid, 1000);
}
