//! Start-request construction.
//!
//! [`build_run_request`] folds the persisted [`ClientConfig`] and the
//! per-invocation [`RunInvocation`] into a [`RunRequest`] whose serialized form
//! has no ambiguous fields: optional values are either present or absent, and
//! segmentation is emitted as exactly one of `lines` / `tokens`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Translate,
    Polish,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    #[default]
    Lines,
    Tokens,
}

/// Segment size sent to the service. Serialized as a single `lines` or
/// `tokens` key when flattened into the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentLimit {
    Lines(u32),
    Tokens(u32),
}

/// Settings the user edits on the configuration pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub platform: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub source_language: String,
    pub target_language: String,
    pub thread_count: u32,
    pub request_timeout_secs: u32,
    pub retry_count: u32,
    pub round_limit: u32,
    pub context_lines: u32,
    pub segmentation_mode: SegmentationMode,
    pub lines_limit: u32,
    pub tokens_limit: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            platform: None,
            model: None,
            api_key: None,
            api_url: None,
            source_language: "auto".to_string(),
            target_language: "en".to_string(),
            thread_count: 0,
            request_timeout_secs: 120,
            retry_count: 1,
            round_limit: 4,
            context_lines: 2,
            segmentation_mode: SegmentationMode::Lines,
            lines_limit: 15,
            tokens_limit: 512,
        }
    }
}

/// Values that win over [`ClientConfig`] for one start.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOverrides {
    pub platform: Option<String>,
    pub model: Option<String>,
    pub target_language: Option<String>,
    pub thread_count: Option<u32>,
}

/// Everything the user picks when pressing Start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInvocation {
    pub task: TaskKind,
    pub input_path: String,
    pub output_path: Option<String>,
    pub run_all_in_one: bool,
    pub overrides: RunOverrides,
}

impl RunInvocation {
    pub fn new(task: TaskKind, input_path: impl Into<String>) -> Self {
        Self {
            task,
            input_path: input_path.into(),
            output_path: None,
            run_all_in_one: false,
            overrides: RunOverrides::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no translation platform is configured")]
    MissingPlatform,
    #[error("no input path was given")]
    MissingInputPath,
}

/// Normalized body of `POST run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub task: TaskKind,
    pub input_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    pub source_language: String,
    pub target_language: String,
    /// Absent lets the service pick its own concurrency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_count: Option<u32>,
    pub request_timeout_secs: u32,
    pub retry_count: u32,
    pub round_limit: u32,
    pub context_lines: u32,
    #[serde(flatten)]
    pub segment: SegmentLimit,
    pub resume: bool,
    pub run_all_in_one: bool,
}

/// Builds the start request. Fails before any network traffic when the
/// platform or input path is missing.
pub fn build_run_request(
    config: &ClientConfig,
    invocation: &RunInvocation,
    resume: bool,
) -> Result<RunRequest, ConfigurationError> {
    let overrides = &invocation.overrides;

    let platform = non_blank(overrides.platform.as_deref())
        .or_else(|| non_blank(config.platform.as_deref()))
        .ok_or(ConfigurationError::MissingPlatform)?;
    let input_path = non_blank(Some(invocation.input_path.as_str()))
        .ok_or(ConfigurationError::MissingInputPath)?;

    let model = non_blank(overrides.model.as_deref()).or_else(|| non_blank(config.model.as_deref()));
    let target_language = non_blank(overrides.target_language.as_deref())
        .unwrap_or_else(|| config.target_language.trim().to_string());
    let thread_count = overrides
        .thread_count
        .unwrap_or(config.thread_count);

    let segment = match config.segmentation_mode {
        SegmentationMode::Lines => SegmentLimit::Lines(config.lines_limit.max(1)),
        SegmentationMode::Tokens => SegmentLimit::Tokens(config.tokens_limit.max(1)),
    };

    Ok(RunRequest {
        task: invocation.task,
        input_path,
        output_path: non_blank(invocation.output_path.as_deref()),
        platform,
        model,
        api_key: non_blank(config.api_key.as_deref()),
        api_url: non_blank(config.api_url.as_deref()),
        source_language: config.source_language.trim().to_string(),
        target_language,
        thread_count: (thread_count > 0).then_some(thread_count),
        request_timeout_secs: config.request_timeout_secs,
        retry_count: config.retry_count,
        round_limit: config.round_limit,
        context_lines: config.context_lines,
        segment,
        resume,
        run_all_in_one: invocation.run_all_in_one,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}
