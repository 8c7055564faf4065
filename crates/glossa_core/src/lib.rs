//! Glossa core: pure job-state machine, request building and view-model helpers.
mod breakpoint;
mod command;
mod effect;
mod msg;
mod snapshot;
mod state;
mod update;
mod upload;
mod view_model;

pub use breakpoint::BreakpointStatus;
pub use command::{
    build_run_request, ClientConfig, ConfigurationError, RunInvocation, RunOverrides, RunRequest,
    SegmentLimit, SegmentationMode, TaskKind,
};
pub use effect::Effect;
pub use msg::Msg;
pub use snapshot::{
    ChartSample, Comparison, JobStatus, LogEntry, LogId, Progress, RateMetrics, Severity,
    StatusSnapshot,
};
pub use state::{JobState, LogPatch, StatePatch};
pub use update::update;
pub use upload::{Negotiation, Step, UploadOutcome, UploadPolicy, UserChoice, MAX_ATTEMPTS};
pub use view_model::{format_elapsed, DashboardView, LOG_TAIL};
