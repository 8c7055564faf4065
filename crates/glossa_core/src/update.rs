use crate::state::LogPatch;
use crate::{
    build_run_request, Effect, JobState, JobStatus, Msg, Progress, RateMetrics, Severity,
    StatePatch,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: JobState, msg: Msg) -> (JobState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartClicked {
            config,
            invocation,
            at,
        } => {
            if state.is_busy() {
                return (state, Vec::new());
            }
            match build_run_request(&config, &invocation, state.is_resuming()) {
                Ok(request) => vec![Effect::SubmitRun(Box::new(request))],
                Err(err) => {
                    state.apply_patch(StatePatch::local_log(
                        Severity::Error,
                        format!("Cannot start: {err}"),
                        at,
                    ));
                    Vec::new()
                }
            }
        }
        Msg::RunAccepted { .. } => {
            // Optimistic: the first poll confirms or corrects this.
            state.apply_patch(StatePatch {
                status: Some(JobStatus::Running),
                progress: Some(Progress::default()),
                rate_metrics: Some(RateMetrics::default()),
                elapsed_seconds: Some(0),
                current_file: Some(None),
                time_series: Some(Vec::new()),
                comparison: Some(None),
                logs: LogPatch::Reset,
                locally_running: Some(true),
                tracking_run: Some(true),
                ..StatePatch::default()
            });
            vec![Effect::StartPolling]
        }
        Msg::RunRejected { reason, at } => {
            state.apply_patch(StatePatch {
                status: Some(JobStatus::Error),
                locally_running: Some(false),
                tracking_run: Some(false),
                ..StatePatch::local_log(Severity::Error, format!("Start rejected: {reason}"), at)
            });
            Vec::new()
        }
        Msg::StatusPolled(snapshot) => {
            let status = snapshot.status;
            let mut patch = StatePatch::from_snapshot(snapshot);
            let mut effects = Vec::new();
            if state.is_tracking_run() && status.ends_tracking() {
                patch.tracking_run = Some(false);
                if status == JobStatus::Completed {
                    patch.resuming = Some(false);
                }
                effects.push(Effect::StopPolling);
            }
            state.apply_patch(patch);
            effects
        }
        Msg::PollFailed { .. } => Vec::new(),
        Msg::Recovered(snapshot) => {
            let alive = snapshot.status.is_active();
            state.apply_patch(StatePatch {
                tracking_run: Some(alive),
                ..StatePatch::from_snapshot(snapshot)
            });
            if alive {
                vec![Effect::StartPolling]
            } else {
                Vec::new()
            }
        }
        Msg::RecoveryFailed { reason, at } => {
            state.apply_patch(StatePatch::local_log(
                Severity::Warning,
                format!("Could not read job status: {reason}"),
                at,
            ));
            Vec::new()
        }
        Msg::BreakpointChecked { status, at } => {
            if status.offers_resume() && !state.is_resuming() {
                state.apply_patch(StatePatch {
                    resuming: Some(true),
                    ..StatePatch::local_log(Severity::Info, status.notice(), at)
                });
            }
            Vec::new()
        }
        Msg::BreakpointFailed { reason, at } => {
            state.apply_patch(StatePatch::local_log(
                Severity::Warning,
                format!("Could not check for an interrupted job: {reason}"),
                at,
            ));
            Vec::new()
        }
        Msg::StopClicked => vec![Effect::SendStop],
        Msg::StopFailed { reason, at } => {
            state.apply_patch(StatePatch::local_log(
                Severity::Error,
                format!("Stop request failed: {reason}"),
                at,
            ));
            Vec::new()
        }
        Msg::UploadCompleted { path, evicted, at } => {
            let message = match evicted {
                Some(name) => format!("Uploaded file stored at {path} (evicted {name})"),
                None => format!("Uploaded file stored at {path}"),
            };
            state.apply_patch(StatePatch::local_log(Severity::Info, message, at));
            Vec::new()
        }
        Msg::UploadFailed { reason, at } => {
            state.apply_patch(StatePatch::local_log(
                Severity::Error,
                format!("Upload failed: {reason}"),
                at,
            ));
            Vec::new()
        }
        Msg::ResumeCleared => {
            if state.is_resuming() {
                state.apply_patch(StatePatch {
                    resuming: Some(false),
                    ..StatePatch::default()
                });
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
