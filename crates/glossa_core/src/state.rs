use std::collections::HashMap;

use crate::snapshot::{
    ChartSample, Comparison, JobStatus, LogEntry, LogId, Progress, RateMetrics, Severity,
    StatusSnapshot,
};
use crate::view_model::{DashboardView, LOG_TAIL};

/// The client's belief about the remote job.
///
/// Fields are private; the only way to change them is [`JobState::apply_patch`],
/// which the reducer in [`crate::update`] calls. That keeps a single writer even
/// though the poll loop, user commands and recovery all feed the same state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobState {
    status: JobStatus,
    progress: Progress,
    rate_metrics: RateMetrics,
    elapsed_seconds: u64,
    current_file: Option<String>,
    log_entries: Vec<LogEntry>,
    time_series: Vec<ChartSample>,
    comparison: Option<Comparison>,
    is_locally_running: bool,
    is_resuming: bool,
    tracking_run: bool,
    next_local_id: u64,
    dirty: bool,
}

/// How a patch touches the log sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LogPatch {
    #[default]
    Keep,
    /// Drop all history (optimistic reset before a new run).
    Reset,
    /// Merge a server batch. An empty batch leaves the log as it is.
    Merge(Vec<LogEntry>),
    /// Append one entry synthesized by the client.
    Local {
        severity: Severity,
        message: String,
        at: String,
    },
}

/// A partial update. `None` leaves the field untouched.
///
/// `Option<Option<_>>` fields distinguish "keep" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatePatch {
    pub status: Option<JobStatus>,
    pub progress: Option<Progress>,
    pub rate_metrics: Option<RateMetrics>,
    pub elapsed_seconds: Option<u64>,
    pub current_file: Option<Option<String>>,
    pub time_series: Option<Vec<ChartSample>>,
    pub comparison: Option<Option<Comparison>>,
    pub logs: LogPatch,
    pub locally_running: Option<bool>,
    pub resuming: Option<bool>,
    pub tracking_run: Option<bool>,
}

impl StatePatch {
    /// Patch carrying everything a status response reports.
    ///
    /// Metrics, progress and the time series are replaced wholesale; the log is
    /// merged; a missing comparison keeps the previous preview.
    pub fn from_snapshot(snapshot: StatusSnapshot) -> Self {
        Self {
            status: Some(snapshot.status),
            progress: Some(snapshot.progress),
            rate_metrics: Some(snapshot.rate_metrics),
            elapsed_seconds: Some(snapshot.elapsed_seconds),
            current_file: Some(snapshot.current_file),
            time_series: Some(snapshot.time_series),
            comparison: snapshot.comparison.map(Some),
            logs: LogPatch::Merge(snapshot.logs),
            locally_running: Some(snapshot.status.is_active()),
            ..Self::default()
        }
    }

    pub fn local_log(severity: Severity, message: impl Into<String>, at: impl Into<String>) -> Self {
        Self {
            logs: LogPatch::Local {
                severity,
                message: message.into(),
                at: at.into(),
            },
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl JobState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sole mutation entry point.
    pub fn apply_patch(&mut self, patch: StatePatch) {
        if patch.is_empty() {
            return;
        }
        let StatePatch {
            status,
            progress,
            rate_metrics,
            elapsed_seconds,
            current_file,
            time_series,
            comparison,
            logs,
            locally_running,
            resuming,
            tracking_run,
        } = patch;

        if let Some(status) = status {
            self.status = status;
        }
        if let Some(progress) = progress {
            self.progress = progress;
        }
        if let Some(rate_metrics) = rate_metrics {
            self.rate_metrics = rate_metrics;
        }
        if let Some(elapsed) = elapsed_seconds {
            self.elapsed_seconds = elapsed;
        }
        if let Some(current_file) = current_file {
            self.current_file = current_file;
        }
        if let Some(series) = time_series {
            self.time_series = series;
        }
        if let Some(comparison) = comparison {
            self.comparison = comparison;
        }
        if let Some(flag) = locally_running {
            self.is_locally_running = flag;
        }
        if let Some(flag) = resuming {
            self.is_resuming = flag;
        }
        if let Some(flag) = tracking_run {
            self.tracking_run = flag;
        }
        match logs {
            LogPatch::Keep => {}
            LogPatch::Reset => self.log_entries.clear(),
            LogPatch::Merge(batch) => self.merge_logs(batch),
            LogPatch::Local {
                severity,
                message,
                at,
            } => {
                self.next_local_id += 1;
                self.log_entries.push(LogEntry {
                    id: LogId::Local(self.next_local_id),
                    timestamp: at,
                    message,
                    severity,
                });
            }
        }
        self.dirty = true;
    }

    /// Known ids are updated in place and keep their position; unknown ids are
    /// appended in batch order. Nothing already known is ever dropped, and an
    /// id repeated inside one batch still yields a single entry.
    fn merge_logs(&mut self, batch: Vec<LogEntry>) {
        if batch.is_empty() {
            return;
        }
        let mut positions: HashMap<LogId, usize> = self
            .log_entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.id, index))
            .collect();
        for entry in batch {
            match positions.get(&entry.id) {
                Some(&index) => self.log_entries[index] = entry,
                None => {
                    positions.insert(entry.id, self.log_entries.len());
                    self.log_entries.push(entry);
                }
            }
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn rate_metrics(&self) -> RateMetrics {
        self.rate_metrics
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn log_entries(&self) -> &[LogEntry] {
        &self.log_entries
    }

    pub fn time_series(&self) -> &[ChartSample] {
        &self.time_series
    }

    pub fn comparison(&self) -> Option<&Comparison> {
        self.comparison.as_ref()
    }

    pub fn is_locally_running(&self) -> bool {
        self.is_locally_running
    }

    pub fn is_resuming(&self) -> bool {
        self.is_resuming
    }

    /// True while a run accepted by (or recovered from) the service is being
    /// followed by the poll loop.
    pub fn is_tracking_run(&self) -> bool {
        self.tracking_run
    }

    /// Busy either locally (start accepted, not yet confirmed) or remotely.
    pub fn is_busy(&self) -> bool {
        self.is_locally_running || self.status.is_active()
    }

    pub fn view(&self) -> DashboardView {
        DashboardView::project(self, LOG_TAIL)
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
