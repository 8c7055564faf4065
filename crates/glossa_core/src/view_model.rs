use crate::{ChartSample, Comparison, JobState, JobStatus, LogEntry};

/// Number of log lines the console view keeps.
pub const LOG_TAIL: usize = 200;

/// Read-only projection of [`JobState`] for the presentation surfaces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardView {
    pub status: JobStatus,
    pub completed: u64,
    pub total: u64,
    pub percent: f64,
    pub requests_per_minute: f64,
    pub tokens_per_minute: f64,
    pub success_percent: f64,
    pub error_percent: f64,
    pub elapsed: String,
    pub current_file: Option<String>,
    /// Total number of known log entries, including ones cut from `log_tail`.
    pub log_count: usize,
    pub log_tail: Vec<LogEntry>,
    pub chart: Vec<ChartSample>,
    pub comparison: Option<Comparison>,
    /// Start affordance is disabled.
    pub start_locked: bool,
    pub resuming: bool,
}

impl DashboardView {
    pub fn project(state: &JobState, tail: usize) -> Self {
        let progress = state.progress();
        let rates = state.rate_metrics();
        let logs = state.log_entries();
        let skip = logs.len().saturating_sub(tail);
        Self {
            status: state.status(),
            completed: progress.completed,
            total: progress.total,
            percent: progress.percent(),
            requests_per_minute: rates.requests_per_minute,
            tokens_per_minute: rates.tokens_per_minute,
            success_percent: as_percent(rates.success_rate),
            error_percent: as_percent(rates.error_rate),
            elapsed: format_elapsed(state.elapsed_seconds()),
            current_file: state.current_file().map(ToOwned::to_owned),
            log_count: logs.len(),
            log_tail: logs[skip..].to_vec(),
            chart: state.time_series().to_vec(),
            comparison: state.comparison().cloned(),
            start_locked: state.is_busy(),
            resuming: state.is_resuming(),
        }
    }
}

fn as_percent(fraction: f64) -> f64 {
    (fraction * 100.0).clamp(0.0, 100.0)
}

pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}
