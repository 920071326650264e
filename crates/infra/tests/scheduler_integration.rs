//! End-to-end scheduler tests against the real tick engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tickflow_core::{from_fn, PeriodicJob};
use tickflow_domain::JobOutcome;
use tickflow_infra::scheduling::{Scheduler, SchedulerError};
use tokio_util::sync::CancellationToken;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").with_test_writer().try_init();
}

/// Job that counts invocations and picks its outcome from the call number.
fn counting_job(
    calls: Arc<AtomicUsize>,
    outcome_for_call: impl Fn(usize) -> JobOutcome + Send + Sync + 'static,
) -> Arc<dyn PeriodicJob> {
    Arc::new(from_fn(move || {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = outcome_for_call(call);
        async move { outcome }
    }))
}

async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test(flavor = "multi_thread")]
async fn stopped_jobs_receive_no_further_ticks() {
    init_tracing();
    let scheduler = Scheduler::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let job = counting_job(Arc::clone(&calls), |_| JobOutcome::Success);

    let id = scheduler.start_job_every(Duration::from_millis(10), job).unwrap();
    wait_until("first invocations", || calls.load(Ordering::SeqCst) >= 2).await;

    scheduler.stop_job(&id.to_string()).unwrap();
    // One invocation that was already in flight may still complete.
    tokio::time::sleep(Duration::from_millis(40)).await;
    let after_stop = calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_stop);

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stopping_twice_or_after_permanent_failure_is_not_an_error() {
    init_tracing();
    let scheduler = Scheduler::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let job = counting_job(Arc::clone(&calls), |_| JobOutcome::permanent("wedged"));

    let id = scheduler.start_job_every(Duration::from_millis(10), job).unwrap();
    wait_until("permanent failure to unschedule the job", || {
        !scheduler.active_jobs().contains(&id)
    })
    .await;

    scheduler.stop_job(&id.to_string()).unwrap();
    scheduler.stop_job(&id.to_string()).unwrap();

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn permanent_failure_on_third_call_caps_invocations_at_three() {
    init_tracing();
    let scheduler = Scheduler::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let job = counting_job(Arc::clone(&calls), |call| {
        if call == 3 {
            JobOutcome::permanent("storage detached")
        } else {
            JobOutcome::Success
        }
    });

    let id = scheduler.start_job_every(Duration::from_millis(20), job).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(!scheduler.active_jobs().contains(&id));
    assert_eq!(scheduler.metrics().permanent_failures.load(Ordering::SeqCst), 1);

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_failures_keep_the_job_scheduled() {
    init_tracing();
    let scheduler = Scheduler::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let job = counting_job(Arc::clone(&calls), |call| {
        if call <= 2 {
            JobOutcome::transient("backend briefly unreachable")
        } else {
            JobOutcome::Success
        }
    });

    let id = scheduler.start_job_every(Duration::from_millis(10), job).unwrap();
    wait_until("retries past the failing calls", || calls.load(Ordering::SeqCst) >= 4).await;

    assert!(scheduler.active_jobs().contains(&id));
    assert_eq!(scheduler.metrics().transient_failures.load(Ordering::SeqCst), 2);

    scheduler.shutdown().await.unwrap();
}

/// Job whose invocations take long enough to still be in flight at shutdown.
struct SlowProbe {
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

#[async_trait]
impl PeriodicJob for SlowProbe {
    async fn run(&self) -> JobOutcome {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        JobOutcome::Success
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_waits_for_in_flight_invocations() {
    init_tracing();
    let scheduler = Scheduler::new();
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));

    let job = Arc::new(SlowProbe {
        started: Arc::clone(&started),
        finished: Arc::clone(&finished),
    });
    scheduler.start_job_every(Duration::from_millis(10), job).unwrap();
    wait_until("an invocation to start", || started.load(Ordering::SeqCst) >= 1).await;

    scheduler.shutdown().await.unwrap();

    // Every invocation that started has also finished, and no new ones fire.
    let finished_at_shutdown = finished.load(Ordering::SeqCst);
    assert!(finished_at_shutdown >= 1);
    assert_eq!(started.load(Ordering::SeqCst), finished_at_shutdown);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(finished.load(Ordering::SeqCst), finished_at_shutdown);
    assert!(scheduler.active_jobs().is_empty());

    // A second shutdown is a no-op.
    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_ids_are_ignored_and_malformed_ids_are_rejected() {
    init_tracing();
    let scheduler = Scheduler::new();

    scheduler.stop_job("9999999").unwrap();

    let err = scheduler.stop_job("not-a-number").unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidJobId { .. }));

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn parent_cancellation_shuts_the_scheduler_down() {
    init_tracing();
    let parent = CancellationToken::new();
    let scheduler = Scheduler::with_parent(parent.clone());
    let calls = Arc::new(AtomicUsize::new(0));
    let job = counting_job(Arc::clone(&calls), |_| JobOutcome::Success);

    scheduler.start_job_every(Duration::from_millis(10), job).unwrap();
    wait_until("the job to tick", || calls.load(Ordering::SeqCst) >= 1).await;

    parent.cancel();
    // Shutdown cancels every remaining token, which empties the registry.
    wait_until("parent-triggered shutdown", || scheduler.active_jobs().is_empty()).await;

    let after_shutdown = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_shutdown);

    // The scheduler accepts no new work afterwards.
    let refused = scheduler.start_job_every(
        Duration::from_secs(1),
        counting_job(Arc::new(AtomicUsize::new(0)), |_| JobOutcome::Success),
    );
    assert!(matches!(refused, Err(SchedulerError::NotRunning)));
}

#[tokio::test(flavor = "multi_thread")]
async fn distinct_jobs_run_concurrently() {
    init_tracing();
    let scheduler = Scheduler::new();
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let first =
        scheduler.start_job_every(
            Duration::from_millis(10),
            counting_job(Arc::clone(&first_calls), |_| JobOutcome::Success),
        )
        .unwrap();
    let second =
        scheduler.start_job_every(
            Duration::from_millis(10),
            counting_job(Arc::clone(&second_calls), |_| JobOutcome::Success),
        )
        .unwrap();
    assert_ne!(first, second);

    wait_until("both jobs to tick", || {
        first_calls.load(Ordering::SeqCst) >= 2 && second_calls.load(Ordering::SeqCst) >= 2
    })
    .await;

    // Stopping one job leaves the other running.
    scheduler.stop_job(&first.to_string()).unwrap();
    wait_until("first job to be deregistered", || !scheduler.active_jobs().contains(&first)).await;

    let second_before = second_calls.load(Ordering::SeqCst);
    wait_until("second job to keep ticking", || {
        second_calls.load(Ordering::SeqCst) > second_before
    })
    .await;

    scheduler.shutdown().await.unwrap();
}
