use std::fmt;

use glossa_core::{BreakpointStatus, StatusSnapshot};

/// Answer to `POST run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAck {
    pub accepted: bool,
    pub message: String,
}

/// Everything the engine reports back to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Result of the one start-up status query.
    Recovered(Result<StatusSnapshot, ServiceError>),
    BreakpointChecked(Result<BreakpointStatus, ServiceError>),
    RunAnswered(Result<RunAck, ServiceError>),
    /// One successful poll tick.
    Polled(StatusSnapshot),
    /// One dropped poll tick. Diagnostic only.
    PollFailed(ServiceError),
    StopSent(Result<(), ServiceError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ServiceError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// Response body did not match the expected shape.
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response"),
        }
    }
}
