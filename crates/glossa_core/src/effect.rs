use crate::RunRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the start request.
    SubmitRun(Box<RunRequest>),
    /// Begin a fresh polling phase, replacing any running one.
    StartPolling,
    /// Cancel the poll timer.
    StopPolling,
    /// Fire-and-forget stop signal to the service.
    SendStop,
}
