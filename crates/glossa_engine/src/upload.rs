use std::path::{Path, PathBuf};

use bytes::Bytes;
use engine_logging::{engine_info, engine_warn};
use glossa_core::{Negotiation, Step, UploadPolicy, UserChoice};
use thiserror::Error;

use crate::{JobService, ServiceError};

/// A local file staged for upload. Cloning shares the payload, so every
/// retry sends exactly the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| UploadError::Read {
                path: path.to_path_buf(),
                message: "path has no file name".to_string(),
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|err| UploadError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Ok(Self::new(file_name, bytes))
    }
}

/// Asks the user how to resolve a full temp store.
pub trait CapacityPrompt: Send + Sync {
    fn decide(&self, limit: u32, oldest_name: Option<&str>) -> UserChoice;
}

/// Always answers the same way. Used for non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub UserChoice);

impl CapacityPrompt for FixedChoice {
    fn decide(&self, _limit: u32, _oldest_name: Option<&str>) -> UserChoice {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub path: String,
    pub evicted: Option<String>,
    pub attempts: u32,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot read {path:?}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("attempt {attempt} with policy {policy} failed: {source}")]
    Service {
        attempt: u32,
        policy: UploadPolicy,
        #[source]
        source: ServiceError,
    },
    #[error("{0}")]
    Protocol(String),
}

/// Runs the capacity negotiation for one file until the service stores it or
/// the protocol gives up. At most [`glossa_core::MAX_ATTEMPTS`] requests.
///
/// Server-side evictions that happened before a failure are not undone.
pub async fn negotiate_upload(
    service: &dyn JobService,
    file: &UploadFile,
    prompt: &dyn CapacityPrompt,
) -> Result<UploadReport, UploadError> {
    let mut negotiation = Negotiation::new();
    loop {
        let policy = negotiation.policy();
        let attempt = negotiation.attempts();
        engine_info!(
            "upload attempt={} policy={} file={} bytes={}",
            attempt,
            policy,
            file.file_name,
            file.bytes.len()
        );
        let outcome = service
            .upload(file, policy)
            .await
            .map_err(|source| UploadError::Service {
                attempt,
                policy,
                source,
            })?;

        let mut step = negotiation.observe(outcome);
        loop {
            match step {
                Step::AskUser { limit, oldest_name } => {
                    engine_info!(
                        "temp store full (limit {}), oldest file {:?}",
                        limit,
                        oldest_name
                    );
                    let choice = prompt.decide(limit, oldest_name.as_deref());
                    step = negotiation.choose(choice);
                }
                Step::Retry(next) => {
                    engine_info!("upload will retry with policy {}", next);
                    break;
                }
                Step::Done { path } => {
                    return Ok(UploadReport {
                        path,
                        evicted: negotiation.evicted().map(ToOwned::to_owned),
                        attempts: negotiation.attempts(),
                    });
                }
                Step::Abort { reason } => {
                    engine_warn!("upload negotiation aborted: {}", reason);
                    return Err(UploadError::Protocol(reason));
                }
            }
        }
    }
}
