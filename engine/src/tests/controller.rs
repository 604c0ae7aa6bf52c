use std::time::Duration;

use super::small_config;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::metrics::Metrics;
use crate::pattern::AccessPattern;
use crate::sim::{CancelToken, Machine, RunOutcome, SimulationController};

async fn wait_until_running(ctl: &SimulationController) {
    while !ctl.is_running() {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn run_completes_and_publishes_progress() {
    let ctl = SimulationController::new(small_config()).unwrap();
    let rx = ctl.subscribe();
    assert_eq!(rx.borrow().step, 0);

    let outcome = ctl.run().await.unwrap();
    let RunOutcome::Completed { steps, metrics } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(steps, 100);
    assert_eq!(metrics.accesses, 1000);
    assert_eq!(metrics, ctl.metrics());
    assert!(!ctl.is_running());

    let progress = *rx.borrow();
    assert_eq!(progress.step, 100);
    assert_eq!(progress.percent, 100.0);
    assert!(progress.is_complete());
    ctl.inspect(|m| m.check_invariants()).unwrap();
}

#[tokio::test(start_paused = true)]
async fn every_run_starts_from_a_fresh_state() {
    let config = small_config().with_pattern(AccessPattern::Random).with_seed(5);
    let ctl = SimulationController::new(config).unwrap();
    let first = ctl.run().await.unwrap();
    let second = ctl.run().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn second_run_is_rejected_while_running() {
    let ctl = SimulationController::new(small_config()).unwrap();
    let background = ctl.clone();
    let handle = tokio::spawn(async move { background.run().await });
    wait_until_running(&ctl).await;

    assert!(matches!(ctl.run().await, Err(SimError::AlreadyRunning)));
    assert!(ctl.is_running(), "rejected call must not disturb the active run");

    ctl.reset();
    let outcome = handle.await.unwrap().unwrap();
    assert!(matches!(outcome, RunOutcome::Cancelled { .. }));
    assert!(!ctl.is_running());
}

#[tokio::test(start_paused = true)]
async fn reset_mid_run_cancels_and_restores_initial_state() {
    let config = small_config();
    let fresh = Machine::new(config.clone()).unwrap().snapshot();
    let ctl = SimulationController::new(config).unwrap();
    let mut rx = ctl.subscribe();

    let background = ctl.clone();
    let handle = tokio::spawn(async move { background.run().await });
    rx.wait_for(|p| p.step >= 50).await.unwrap();

    ctl.reset();
    let outcome = handle.await.unwrap().unwrap();
    let RunOutcome::Cancelled { steps } = outcome else {
        panic!("expected cancellation, got {outcome:?}");
    };
    assert!((50..100).contains(&steps));

    assert_eq!(ctl.progress().step, 0);
    assert_eq!(ctl.progress().percent, 0.0);
    assert_eq!(ctl.metrics(), Metrics::default());
    assert_eq!(ctl.snapshot(), fresh);

    // nothing left running keeps mutating the state
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(ctl.snapshot(), fresh);
}

#[tokio::test(start_paused = true)]
async fn dropped_run_releases_the_running_flag() {
    let ctl = SimulationController::new(small_config()).unwrap();
    let timed_out = tokio::time::timeout(Duration::from_millis(500), ctl.run()).await;
    assert!(timed_out.is_err());
    assert!(!ctl.is_running());

    let outcome = ctl.run().await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { steps: 100, .. }));
}

#[tokio::test(start_paused = true)]
async fn rejected_reconfigure_leaves_run_alone() {
    let ctl = SimulationController::new(small_config()).unwrap();
    let mut rx = ctl.subscribe();
    let background = ctl.clone();
    let handle = tokio::spawn(async move { background.run().await });
    rx.wait_for(|p| p.step >= 5).await.unwrap();

    let bad = SimConfig { step_pacing_ms: 10, ..small_config() };
    assert!(ctl.reconfigure(bad).is_err());
    assert_eq!(ctl.config(), small_config());

    let outcome = handle.await.unwrap().unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { steps: 100, .. }));
}

#[tokio::test(start_paused = true)]
async fn reconfigure_swaps_layout() {
    let ctl = SimulationController::new(small_config()).unwrap();
    ctl.run().await.unwrap();
    ctl.reconfigure(SimConfig::default()).unwrap();
    assert_eq!(ctl.snapshot().layout.num_virtual_pages, 1024);
    assert_eq!(ctl.progress().step, 0);
    assert_eq!(ctl.metrics(), Metrics::default());
}

#[tokio::test(start_paused = true)]
async fn cancel_token_interrupts_sleep() {
    let token = CancelToken::new();
    assert!(token.sleep(Duration::from_millis(100)).await);

    let sleeper = token.clone();
    let handle = tokio::spawn(async move { sleeper.sleep(Duration::from_secs(60)).await });
    tokio::task::yield_now().await;
    token.cancel();
    assert!(!handle.await.unwrap());
    assert!(token.is_cancelled());

    // already cancelled: returns at once
    token.cancelled().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reset_always_reaches_a_run_that_has_started() {
    let config = small_config().with_steps(3, 10);
    let fresh = Machine::new(config.clone()).unwrap().snapshot();
    let ctl = SimulationController::new(config).unwrap();
    for _ in 0..20 {
        let background = ctl.clone();
        let handle = tokio::spawn(async move { background.run().await });
        wait_until_running(&ctl).await;
        ctl.reset();

        let outcome = handle.await.unwrap().unwrap();
        assert!(matches!(outcome, RunOutcome::Cancelled { steps } if steps < 3), "{outcome:?}");
        assert!(!ctl.is_running());
        assert_eq!(ctl.snapshot(), fresh);
    }
}
