use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use glossa_core::{Effect, RunRequest};
use tokio::sync::mpsc;

use crate::poller::{ChannelEventSink, EventSink, Synchronizer};
use crate::{EngineEvent, JobService, ReqwestJobService, ServiceError, ServiceSettings};

/// Executes reducer effects against the job service and reports results as
/// [`EngineEvent`]s. Must be used from within a tokio runtime.
pub struct EngineHandle {
    service: Arc<dyn JobService>,
    sink: Arc<dyn EventSink>,
    synchronizer: Synchronizer,
    recovered: AtomicBool,
}

impl EngineHandle {
    pub fn new(
        service: Arc<dyn JobService>,
        sink: Arc<dyn EventSink>,
        settings: &ServiceSettings,
    ) -> Self {
        let synchronizer = Synchronizer::new(service.clone(), sink.clone(), settings.poll_interval);
        Self {
            service,
            sink,
            synchronizer,
            recovered: AtomicBool::new(false),
        }
    }

    /// Connects to the service over HTTP and delivers events on a channel.
    pub fn connect(
        settings: &ServiceSettings,
    ) -> Result<(Self, mpsc::UnboundedReceiver<EngineEvent>), ServiceError> {
        let service = Arc::new(ReqwestJobService::new(settings)?);
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Arc::new(ChannelEventSink::new(tx));
        Ok((Self::new(service, sink, settings), rx))
    }

    pub fn service(&self) -> Arc<dyn JobService> {
        self.service.clone()
    }

    pub fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitRun(request) => self.submit_run(*request),
                Effect::StartPolling => {
                    self.synchronizer.start();
                }
                Effect::StopPolling => {
                    self.synchronizer.stop();
                }
                Effect::SendStop => self.send_stop(),
            }
        }
    }

    /// Issues the start-up status query. Only the first call does anything.
    pub fn recover(&self) -> bool {
        if self.recovered.swap(true, Ordering::SeqCst) {
            engine_warn!("state recovery already ran");
            return false;
        }
        let service = self.service.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let result = service.status().await;
            if let Ok(snapshot) = &result {
                engine_info!("recovered job status {}", snapshot.status);
            }
            sink.emit(EngineEvent::Recovered(result));
        });
        true
    }

    pub fn check_breakpoint(&self) {
        let service = self.service.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            sink.emit(EngineEvent::BreakpointChecked(service.breakpoint().await));
        });
    }

    fn submit_run(&self, request: RunRequest) {
        engine_info!(
            "submitting {:?} for {} on {}",
            request.task,
            request.input_path,
            request.platform
        );
        let service = self.service.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            sink.emit(EngineEvent::RunAnswered(service.run(&request).await));
        });
    }

    fn send_stop(&self) {
        let service = self.service.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            sink.emit(EngineEvent::StopSent(service.stop().await));
        });
    }

    pub fn stop_polling(&mut self) -> bool {
        self.synchronizer.stop()
    }

    pub fn is_polling(&self) -> bool {
        self.synchronizer.is_polling()
    }
}
