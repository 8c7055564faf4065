//! JSON shapes of the job service and their mapping onto core types.
use glossa_core::{
    BreakpointStatus, ChartSample, Comparison, JobStatus, LogEntry, LogId, Progress, RateMetrics,
    Severity, StatusSnapshot, UploadOutcome,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{FailureKind, RunAck, ServiceError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusResponse {
    #[serde(default)]
    stats: StatsDto,
    #[serde(default)]
    logs: Option<Vec<LogDto>>,
    #[serde(default)]
    chart_data: Option<Vec<ChartDto>>,
    #[serde(default)]
    comparison: Option<ComparisonDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StatsDto {
    status: StatusDto,
    completed: u64,
    total: u64,
    requests_per_minute: f64,
    tokens_per_minute: f64,
    success_rate: f64,
    error_rate: f64,
    elapsed_seconds: f64,
    current_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StatusDto {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Error,
    Stopping,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct LogDto {
    id: u64,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    severity: SeverityDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SeverityDto {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ChartDto {
    #[serde(default)]
    time: Value,
    #[serde(default)]
    rpm: f64,
    #[serde(default)]
    tpm: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ComparisonDto {
    source: String,
    translation: String,
}

impl StatusResponse {
    pub(crate) fn into_snapshot(self) -> StatusSnapshot {
        let stats = self.stats;
        let status = match stats.status {
            StatusDto::Idle => JobStatus::Idle,
            StatusDto::Running => JobStatus::Running,
            StatusDto::Paused => JobStatus::Paused,
            StatusDto::Completed => JobStatus::Completed,
            StatusDto::Error => JobStatus::Error,
            StatusDto::Stopping => JobStatus::Stopping,
            StatusDto::Unknown => {
                engine_logging::engine_warn!("unknown job status in response, treating as idle");
                JobStatus::Idle
            }
        };

        StatusSnapshot {
            status,
            progress: Progress {
                completed: stats.completed,
                total: stats.total,
            },
            rate_metrics: RateMetrics {
                requests_per_minute: stats.requests_per_minute,
                tokens_per_minute: stats.tokens_per_minute,
                success_rate: fraction(stats.success_rate),
                error_rate: fraction(stats.error_rate),
            },
            elapsed_seconds: stats.elapsed_seconds.max(0.0).round() as u64,
            current_file: stats.current_file.filter(|name| !name.is_empty()),
            logs: self
                .logs
                .unwrap_or_default()
                .into_iter()
                .map(LogDto::into_entry)
                .collect(),
            time_series: self
                .chart_data
                .unwrap_or_default()
                .into_iter()
                .map(|sample| ChartSample {
                    time: match sample.time {
                        Value::String(text) => text,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    },
                    rpm: sample.rpm,
                    tpm: sample.tpm,
                })
                .collect(),
            comparison: self.comparison.map(|c| Comparison {
                source: c.source,
                translation: c.translation,
            }),
        }
    }
}

impl LogDto {
    fn into_entry(self) -> LogEntry {
        LogEntry {
            id: LogId::Remote(self.id),
            timestamp: self.timestamp,
            message: self.message,
            severity: match self.severity {
                SeverityDto::Debug => Severity::Debug,
                SeverityDto::Info | SeverityDto::Unknown => Severity::Info,
                SeverityDto::Warning => Severity::Warning,
                SeverityDto::Error => Severity::Error,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunAckDto {
    #[serde(default = "accepted_by_default")]
    accepted: bool,
    #[serde(default)]
    message: String,
}

fn accepted_by_default() -> bool {
    true
}

/// Rates travel as fractions. Out-of-range or non-finite values are pinned to
/// `0.0..=1.0`.
fn fraction(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl From<RunAckDto> for RunAck {
    fn from(dto: RunAckDto) -> Self {
        RunAck {
            accepted: dto.accepted,
            message: dto.message,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct BreakpointDto {
    can_resume: bool,
    has_incomplete: bool,
    project_name: Option<String>,
    total_lines: Option<u64>,
    completed_lines: Option<u64>,
    progress_percent: Option<f64>,
}

impl From<BreakpointDto> for BreakpointStatus {
    fn from(dto: BreakpointDto) -> Self {
        BreakpointStatus {
            can_resume: dto.can_resume,
            has_incomplete: dto.has_incomplete,
            project_name: dto.project_name,
            total_lines: dto.total_lines,
            completed_lines: dto.completed_lines,
            progress_percent: dto.progress_percent,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadDto {
    outcome: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    oldest_name: Option<String>,
    #[serde(default)]
    deleted_name: Option<String>,
}

impl TryFrom<UploadDto> for UploadOutcome {
    type Error = ServiceError;

    fn try_from(dto: UploadDto) -> Result<Self, Self::Error> {
        match dto.outcome.as_str() {
            "success" => match dto.path {
                Some(path) if !path.is_empty() => Ok(UploadOutcome::Success { path }),
                _ => Err(ServiceError::new(
                    FailureKind::Decode,
                    "upload reported success without a path",
                )),
            },
            "limitReached" => Ok(UploadOutcome::LimitReached {
                limit: dto.limit.unwrap_or_default(),
                oldest_name: dto.oldest_name,
            }),
            "forcedDelete" => Ok(UploadOutcome::ForcedDelete {
                deleted_name: dto.deleted_name,
            }),
            other => Err(ServiceError::new(
                FailureKind::Decode,
                format!("unknown upload outcome {other:?}"),
            )),
        }
    }
}

/// Pulls a human-readable reason out of an error body, falling back to the raw text.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error", "detail"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_owned))
        })
        .unwrap_or_else(|| body.trim().to_string())
}
