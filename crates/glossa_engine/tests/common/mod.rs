#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use glossa_core::{
    BreakpointStatus, JobStatus, RunRequest, StatusSnapshot, UploadOutcome, UploadPolicy,
};
use glossa_engine::{
    EngineEvent, EventSink, FailureKind, JobService, RunAck, ServiceError, UploadFile,
};

/// In-memory job service answering status calls from a script.
pub struct ScriptedService {
    statuses: Mutex<VecDeque<Result<StatusSnapshot, ServiceError>>>,
    fallback: StatusSnapshot,
    status_calls: AtomicUsize,
    run_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl ScriptedService {
    pub fn new(
        script: Vec<Result<StatusSnapshot, ServiceError>>,
        fallback: StatusSnapshot,
    ) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(script.into()),
            fallback,
            status_calls: AtomicUsize::new(0),
            run_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        })
    }

    pub fn always(status: JobStatus) -> Arc<Self> {
        Self::new(Vec::new(), snapshot(status))
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl JobService for ScriptedService {
    async fn status(&self) -> Result<StatusSnapshot, ServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    async fn run(&self, _request: &RunRequest) -> Result<RunAck, ServiceError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RunAck {
            accepted: true,
            message: "started".to_string(),
        })
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn breakpoint(&self) -> Result<BreakpointStatus, ServiceError> {
        Ok(BreakpointStatus::default())
    }

    async fn upload(
        &self,
        _file: &UploadFile,
        _policy: UploadPolicy,
    ) -> Result<UploadOutcome, ServiceError> {
        Err(network_error())
    }
}

#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }

    pub fn polled_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, EngineEvent::Polled(_)))
            .count()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn snapshot(status: JobStatus) -> StatusSnapshot {
    StatusSnapshot {
        status,
        ..StatusSnapshot::default()
    }
}

pub fn network_error() -> ServiceError {
    ServiceError {
        kind: FailureKind::Network,
        message: "connection refused".to_string(),
    }
}
