mod common;

use std::time::Duration;

use common::{network_error, snapshot, CollectingSink, ScriptedService};
use glossa_core::JobStatus;
use glossa_engine::{EngineEvent, Synchronizer};

const PERIOD: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn restarting_keeps_a_single_timer() {
    engine_logging::initialize_for_tests();
    let service = ScriptedService::always(JobStatus::Running);
    let sink = CollectingSink::new();
    let mut sync = Synchronizer::new(service.clone(), sink.clone(), PERIOD);

    let first = sync.start();
    let second = sync.start();
    let third = sync.start();
    assert!(first < second && second < third);

    tokio::time::sleep(Duration::from_millis(5_500)).await;

    // Ticks at 0s..=5s from one timer only.
    assert_eq!(service.status_calls(), 6);
    assert_eq!(sink.polled_count(), 6);
    assert!(sync.is_polling());
    assert!(sync.stop());
}

#[tokio::test(start_paused = true)]
async fn terminal_status_ends_the_phase() {
    let service = ScriptedService::new(
        vec![
            Ok(snapshot(JobStatus::Running)),
            Ok(snapshot(JobStatus::Running)),
            Ok(snapshot(JobStatus::Completed)),
        ],
        snapshot(JobStatus::Running),
    );
    let sink = CollectingSink::new();
    let mut sync = Synchronizer::new(service.clone(), sink.clone(), PERIOD);

    sync.start();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(service.status_calls(), 3);
    assert!(!sync.is_polling());
    let last = sink.take().pop().expect("events");
    assert_eq!(last, EngineEvent::Polled(snapshot(JobStatus::Completed)));
}

#[tokio::test(start_paused = true)]
async fn idle_and_error_also_end_the_phase() {
    for terminal in [JobStatus::Idle, JobStatus::Error] {
        let service = ScriptedService::new(
            vec![Ok(snapshot(JobStatus::Running)), Ok(snapshot(terminal))],
            snapshot(JobStatus::Running),
        );
        let sink = CollectingSink::new();
        let mut sync = Synchronizer::new(service.clone(), sink, PERIOD);

        sync.start();
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(service.status_calls(), 2, "status {terminal}");
        assert!(!sync.is_polling());
    }
}

#[tokio::test(start_paused = true)]
async fn first_tick_is_immediate_and_stale_idle_ends_the_phase() {
    let service = ScriptedService::new(
        vec![Ok(snapshot(JobStatus::Idle))],
        snapshot(JobStatus::Running),
    );
    let sink = CollectingSink::new();
    let mut sync = Synchronizer::new(service.clone(), sink.clone(), PERIOD);

    sync.start();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(service.status_calls(), 1);
    assert_eq!(sink.take(), vec![EngineEvent::Polled(snapshot(JobStatus::Idle))]);
    assert!(!sync.is_polling());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(service.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_prevents_further_ticks() {
    let service = ScriptedService::always(JobStatus::Running);
    let sink = CollectingSink::new();
    let mut sync = Synchronizer::new(service.clone(), sink, PERIOD);

    sync.start();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert!(sync.stop());
    let calls = service.status_calls();
    assert_eq!(calls, 3);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(service.status_calls(), calls);
    assert!(!sync.is_polling());
    assert!(!sync.stop());
}

#[tokio::test(start_paused = true)]
async fn failed_ticks_do_not_stop_polling() {
    let service = ScriptedService::new(
        vec![Err(network_error()), Err(network_error())],
        snapshot(JobStatus::Running),
    );
    let sink = CollectingSink::new();
    let mut sync = Synchronizer::new(service.clone(), sink.clone(), PERIOD);

    sync.start();
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    assert!(sync.is_polling());
    let events = sink.take();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], EngineEvent::PollFailed(_)));
    assert!(matches!(events[1], EngineEvent::PollFailed(_)));
    assert!(matches!(events[2], EngineEvent::Polled(_)));
    assert_eq!(sync.tick_count(), 4);
    sync.stop();
}

#[tokio::test(start_paused = true)]
async fn polling_can_restart_after_self_termination() {
    let service = ScriptedService::new(
        vec![Ok(snapshot(JobStatus::Completed))],
        snapshot(JobStatus::Running),
    );
    let sink = CollectingSink::new();
    let mut sync = Synchronizer::new(service.clone(), sink, PERIOD);

    sync.start();
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(service.status_calls(), 1);
    assert!(!sync.is_polling());

    sync.start();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(service.status_calls(), 3);
    assert!(sync.is_polling());
    sync.stop();
}
