//! Glossa engine: job-service IO and effect execution.
mod client;
mod engine;
mod poller;
mod types;
mod upload;
mod wire;

pub use client::{JobService, ReqwestJobService, ServiceSettings};
pub use engine::EngineHandle;
pub use poller::{ChannelEventSink, EventSink, PollHandle, Synchronizer};
pub use types::{EngineEvent, FailureKind, RunAck, ServiceError};
pub use upload::{
    negotiate_upload, CapacityPrompt, FixedChoice, UploadError, UploadFile, UploadReport,
};
