use std::time::Duration;

use glossa_core::{BreakpointStatus, RunRequest, StatusSnapshot, UploadOutcome, UploadPolicy};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use crate::upload::UploadFile;
use crate::wire::{error_message, BreakpointDto, RunAckDto, StatusResponse, UploadDto};
use crate::{FailureKind, RunAck, ServiceError};

const STATUS_PATH: &str = "api/task/status";
const RUN_PATH: &str = "api/task/run";
const STOP_PATH: &str = "api/task/stop";
const BREAKPOINT_PATH: &str = "api/task/breakpoint";
const UPLOAD_PATH: &str = "api/upload";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Deadline for a whole request. `None` lets a slow status call run until
    /// the service answers.
    pub request_timeout: Option<Duration>,
    pub poll_interval: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3388".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// The remote job service as seen by the client.
#[async_trait::async_trait]
pub trait JobService: Send + Sync {
    async fn status(&self) -> Result<StatusSnapshot, ServiceError>;

    async fn run(&self, request: &RunRequest) -> Result<RunAck, ServiceError>;

    async fn stop(&self) -> Result<(), ServiceError>;

    async fn breakpoint(&self) -> Result<BreakpointStatus, ServiceError>;

    async fn upload(
        &self,
        file: &UploadFile,
        policy: UploadPolicy,
    ) -> Result<UploadOutcome, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobService {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestJobService {
    pub fn new(settings: &ServiceSettings) -> Result<Self, ServiceError> {
        let mut base_url = Url::parse(settings.base_url.trim())
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

#[async_trait::async_trait]
impl JobService for ReqwestJobService {
    async fn status(&self) -> Result<StatusSnapshot, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(STATUS_PATH)?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: StatusResponse = decode(ensure_success(response).await?).await?;
        Ok(body.into_snapshot())
    }

    async fn run(&self, request: &RunRequest) -> Result<RunAck, ServiceError> {
        let payload = serde_json::to_vec(request)
            .map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(self.endpoint(RUN_PATH)?)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(RunAck {
                accepted: true,
                message: String::new(),
            });
        }
        let ack: RunAckDto = serde_json::from_slice(&bytes)
            .map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))?;
        Ok(ack.into())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.endpoint(STOP_PATH)?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn breakpoint(&self) -> Result<BreakpointStatus, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(BREAKPOINT_PATH)?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: BreakpointDto = decode(ensure_success(response).await?).await?;
        Ok(body.into())
    }

    async fn upload(
        &self,
        file: &UploadFile,
        policy: UploadPolicy,
    ) -> Result<UploadOutcome, ServiceError> {
        let mut url = self.endpoint(UPLOAD_PATH)?;
        url.query_pairs_mut().append_pair("policy", policy.as_str());

        let part = reqwest::multipart::Part::stream(file.bytes.clone())
            .file_name(file.file_name.clone());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: UploadDto = decode(ensure_success(response).await?).await?;
        UploadOutcome::try_from(body)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match error_message(&body) {
        text if text.is_empty() => status.to_string(),
        text => text,
    };
    Err(ServiceError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ServiceError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}
