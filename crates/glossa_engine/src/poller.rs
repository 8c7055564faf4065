//! Fixed-cadence status polling.
//!
//! A [`Synchronizer`] owns at most one [`PollHandle`]. Starting a new phase
//! cancels the previous handle before the new task is spawned, so two timers
//! never tick at once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, JobService};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: tokio::sync::mpsc::UnboundedSender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// One polling phase. Dropping the handle cancels it.
pub struct PollHandle {
    generation: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// False once cancelled or once the loop ended on its own.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

pub struct Synchronizer {
    service: Arc<dyn JobService>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
    current: Option<PollHandle>,
    generation: u64,
    ticks: Arc<AtomicU64>,
}

impl Synchronizer {
    pub fn new(service: Arc<dyn JobService>, sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        Self {
            service,
            sink,
            interval,
            current: None,
            generation: 0,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enters the Polling state, replacing any phase already running.
    pub fn start(&mut self) -> u64 {
        if let Some(previous) = self.current.take() {
            engine_debug!("poll phase {} replaced", previous.generation);
            previous.cancel();
        }
        self.generation += 1;
        let token = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            self.service.clone(),
            self.sink.clone(),
            self.interval,
            token.clone(),
            self.ticks.clone(),
        ));
        engine_info!(
            "poll phase {} started, interval {}ms",
            self.generation,
            self.interval.as_millis()
        );
        self.current = Some(PollHandle {
            generation: self.generation,
            token,
            task,
        });
        self.generation
    }

    /// Enters the Idle state. Returns whether a phase was active.
    pub fn stop(&mut self) -> bool {
        match self.current.take() {
            Some(handle) => {
                let was_active = handle.is_active();
                handle.cancel();
                engine_debug!("poll phase {} stopped", handle.generation);
                was_active
            }
            None => false,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.current.as_ref().is_some_and(PollHandle::is_active)
    }

    /// Status requests issued across all phases.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    service: Arc<dyn JobService>,
    sink: Arc<dyn EventSink>,
    period: Duration,
    token: CancellationToken,
    ticks: Arc<AtomicU64>,
) {
    // The first tick completes immediately, so a phase started right after a
    // run was accepted may still see the service's pre-run `idle`. That answer
    // ends the phase like any other terminal status.
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let tick = ticks.fetch_add(1, Ordering::Relaxed) + 1;
        engine_logging::set_poll_tick(tick);

        // The request itself is not cancelled; its answer is dropped instead.
        let result = service.status().await;
        if token.is_cancelled() {
            break;
        }
        match result {
            Ok(snapshot) => {
                let status = snapshot.status;
                sink.emit(EngineEvent::Polled(snapshot));
                if status.ends_tracking() {
                    engine_info!("job reported {}, polling stops", status);
                    break;
                }
            }
            Err(err) => {
                engine_warn!("status poll failed: {}", err);
                sink.emit(EngineEvent::PollFailed(err));
            }
        }
    }
}
