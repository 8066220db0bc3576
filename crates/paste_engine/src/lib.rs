//! just_paste engine: server API client, push channel, timers and effect execution.
mod artifact;
mod channel;
mod client;
mod engine;
pub mod push;
mod sink;
mod timers;
mod types;

pub use artifact::{
    artifact_filename, ensure_save_dir, ArtifactWriter, PendingArtifact, PersistError,
};
pub use channel::{PollingChannel, PushSettings, SessionEnd};
pub use client::{ClientSettings, ReqwestServerApi, ServerApi};
pub use engine::{EngineConfig, EngineHandle};
pub use push::{EnginePacket, Handshake, PushDecodeError, SocketPacket};
pub use sink::{ChannelEventSink, EventSink};
pub use timers::Timers;
pub use types::{
    ApiError, CompletePayload, DownloadRequest, DownloadResponse, DownloadResult, EngineEvent,
    ErrorPayload, FailureKind, HistoryEntry, ItemError, PathValidation, ProgressPayload,
    PushEvent, TimerId,
};
