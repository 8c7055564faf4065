use chrono::{SecondsFormat, Utc};
use engine_logging::{engine_info, engine_warn};
use glossa_core::Msg;
use glossa_engine::{EngineEvent, UploadError, UploadReport};

/// Wall-clock stamp for log entries this client creates itself.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Translates an engine event into the reducer message it stands for.
pub fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Recovered(Ok(snapshot)) => Msg::Recovered(snapshot),
        EngineEvent::Recovered(Err(err)) => Msg::RecoveryFailed {
            reason: err.to_string(),
            at: now(),
        },
        EngineEvent::BreakpointChecked(Ok(status)) => Msg::BreakpointChecked { status, at: now() },
        EngineEvent::BreakpointChecked(Err(err)) => Msg::BreakpointFailed {
            reason: err.to_string(),
            at: now(),
        },
        EngineEvent::RunAnswered(Ok(ack)) if ack.accepted => Msg::RunAccepted {
            message: ack.message,
        },
        EngineEvent::RunAnswered(Ok(ack)) => Msg::RunRejected {
            reason: if ack.message.trim().is_empty() {
                "the service declined the task".to_string()
            } else {
                ack.message
            },
            at: now(),
        },
        EngineEvent::RunAnswered(Err(err)) => Msg::RunRejected {
            reason: err.to_string(),
            at: now(),
        },
        EngineEvent::Polled(snapshot) => Msg::StatusPolled(snapshot),
        EngineEvent::PollFailed(err) => Msg::PollFailed {
            reason: err.to_string(),
        },
        EngineEvent::StopSent(Ok(())) => {
            engine_info!("stop request delivered");
            Msg::NoOp
        }
        EngineEvent::StopSent(Err(err)) => {
            engine_warn!("stop request failed: {}", err);
            Msg::StopFailed {
                reason: err.to_string(),
                at: now(),
            }
        }
    }
}

pub fn upload_msg(result: &Result<UploadReport, UploadError>) -> Msg {
    match result {
        Ok(report) => Msg::UploadCompleted {
            path: report.path.clone(),
            evicted: report.evicted.clone(),
            at: now(),
        },
        Err(err) => Msg::UploadFailed {
            reason: err.to_string(),
            at: now(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::{JobStatus, StatusSnapshot};
    use glossa_engine::{FailureKind, RunAck, ServiceError};

    fn service_error() -> ServiceError {
        ServiceError {
            kind: FailureKind::HttpStatus(503),
            message: "busy".to_string(),
        }
    }

    #[test]
    fn declined_run_becomes_rejection() {
        let msg = to_msg(EngineEvent::RunAnswered(Ok(RunAck {
            accepted: false,
            message: String::new(),
        })));
        match msg {
            Msg::RunRejected { reason, at } => {
                assert_eq!(reason, "the service declined the task");
                assert!(!at.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn accepted_run_and_polls_pass_through() {
        let msg = to_msg(EngineEvent::RunAnswered(Ok(RunAck {
            accepted: true,
            message: "queued".to_string(),
        })));
        assert_eq!(
            msg,
            Msg::RunAccepted {
                message: "queued".to_string()
            }
        );

        let snapshot = StatusSnapshot {
            status: JobStatus::Running,
            ..StatusSnapshot::default()
        };
        assert_eq!(
            to_msg(EngineEvent::Polled(snapshot.clone())),
            Msg::StatusPolled(snapshot)
        );
    }

    #[test]
    fn failures_carry_the_reason() {
        assert!(matches!(
            to_msg(EngineEvent::PollFailed(service_error())),
            Msg::PollFailed { reason } if reason.contains("busy")
        ));
        assert!(matches!(
            to_msg(EngineEvent::StopSent(Err(service_error()))),
            Msg::StopFailed { reason, .. } if reason.contains("busy")
        ));
        assert_eq!(to_msg(EngineEvent::StopSent(Ok(()))), Msg::NoOp);
    }
}
