use crate::{BreakpointStatus, ClientConfig, RunInvocation, StatusSnapshot};

/// Inputs to the reducer. Variants that may produce a client-side log entry
/// carry `at`, the wall-clock timestamp to stamp it with.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User pressed Start.
    StartClicked {
        config: Box<ClientConfig>,
        invocation: RunInvocation,
        at: String,
    },
    /// Service accepted the start request.
    RunAccepted { message: String },
    /// Service refused the start request, or it never arrived.
    RunRejected { reason: String, at: String },
    /// One poll tick came back.
    StatusPolled(StatusSnapshot),
    /// One poll tick failed; nothing to merge.
    PollFailed { reason: String },
    /// Start-up status query came back.
    Recovered(StatusSnapshot),
    /// Start-up status query failed.
    RecoveryFailed { reason: String, at: String },
    /// Breakpoint query came back.
    BreakpointChecked {
        status: BreakpointStatus,
        at: String,
    },
    /// Breakpoint query failed.
    BreakpointFailed { reason: String, at: String },
    /// User pressed Stop.
    StopClicked,
    /// The stop signal could not be delivered.
    StopFailed { reason: String, at: String },
    /// A local file was staged remotely.
    UploadCompleted {
        path: String,
        evicted: Option<String>,
        at: String,
    },
    /// Upload negotiation gave up.
    UploadFailed { reason: String, at: String },
    /// User chose to start fresh instead of resuming.
    ResumeCleared,
    /// Fallback for placeholder wiring.
    NoOp,
}
