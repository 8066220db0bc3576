use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a scheduled engine timer.
pub type TimerId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PathValidated(Result<PathValidation, ApiError>),
    DownloadSubmitted(Result<DownloadResponse, ApiError>),
    HistoryLoaded(Result<Vec<HistoryEntry>, ApiError>),
    HistoryItemDeleted {
        id: i64,
        result: Result<(), ApiError>,
    },
    HistoryCleared(Result<(), ApiError>),
    ArtifactSaved(Result<PathBuf, ApiError>),
    Push(PushEvent),
    PushConnection { connected: bool },
    TimerElapsed(TimerId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PathValidationRequest<'a> {
    pub path: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PathValidation {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub urls: Vec<String>,
    pub format: String,
    pub quality: String,
    pub path: String,
    /// Client job ids, index-aligned with `urls`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub download_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub results: Vec<DownloadResult>,
    #[serde(default)]
    pub errors: Vec<ItemError>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub download_type: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// Request-level failure (bad parameters, server crash).
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DownloadResult {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ItemError {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub file_format: String,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub file_size: Option<String>,
    #[serde(default)]
    pub download_path: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl HistoryEntry {
    /// The record timestamp, if present and valid RFC 3339.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressPayload {
    pub download_id: String,
    #[serde(default)]
    pub percent: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub eta: Option<String>,
    #[serde(default)]
    pub downloaded: Option<String>,
    #[serde(default)]
    pub total: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompletePayload {
    pub download_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorPayload {
    pub download_id: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Server-pushed job events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    Progress(ProgressPayload),
    Complete(CompletePayload),
    Error(ErrorPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "invalid response"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
