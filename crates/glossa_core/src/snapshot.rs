//! Server-mirrored job data: what one status response tells us.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Error,
    Stopping,
}

impl JobStatus {
    /// Statuses that end a tracked run and stop the poll timer.
    pub fn ends_tracking(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error | JobStatus::Idle)
    }

    /// Statuses during which the remote job is still alive.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            JobStatus::Running | JobStatus::Paused | JobStatus::Stopping
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
            JobStatus::Stopping => "stopping",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: u64,
    pub total: u64,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed.min(self.total) as f64 / self.total as f64) * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateMetrics {
    pub requests_per_minute: f64,
    pub tokens_per_minute: f64,
    /// Fraction in `0.0..=1.0` as reported by the service.
    pub success_rate: f64,
    /// Fraction in `0.0..=1.0` as reported by the service.
    pub error_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

/// Log entry identity. Entries synthesized by this client never collide with
/// ids handed out by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogId {
    Remote(u64),
    Local(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: LogId,
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSample {
    pub time: String,
    pub rpm: f64,
    pub tpm: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub source: String,
    pub translation: String,
}

/// One decoded status response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    pub progress: Progress,
    pub rate_metrics: RateMetrics,
    pub elapsed_seconds: u64,
    pub current_file: Option<String>,
    /// Empty means "nothing new", never "clear the log".
    pub logs: Vec<LogEntry>,
    pub time_series: Vec<ChartSample>,
    pub comparison: Option<Comparison>,
}
