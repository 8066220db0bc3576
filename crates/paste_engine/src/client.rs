use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use paste_logging::{paste_info, paste_warn};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::artifact::{artifact_filename, ArtifactWriter, PersistError};
use crate::types::PathValidationRequest;
use crate::{ApiError, DownloadRequest, DownloadResponse, FailureKind, HistoryEntry, PathValidation};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Timeout for short calls: validation and history.
    pub request_timeout: Duration,
    /// The server answers a batch only after every download finished.
    pub submit_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            submit_timeout: Duration::from_secs(60 * 60),
        }
    }
}

/// The REST contract of the download server.
#[async_trait::async_trait]
pub trait ServerApi: Send + Sync {
    async fn validate_path(&self, path: &str) -> Result<PathValidation, ApiError>;

    async fn submit_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ApiError>;

    async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    async fn delete_history(&self, id: i64) -> Result<(), ApiError>;

    async fn clear_history(&self) -> Result<(), ApiError>;

    /// Saves the file behind a server-provided `download_url` into `dir`.
    async fn fetch_artifact(&self, download_url: &str, dir: &Path) -> Result<PathBuf, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestServerApi {
    settings: ClientSettings,
    base: reqwest::Url,
    client: reqwest::Client,
}

impl ReqwestServerApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    /// POSTs a JSON body and decodes the JSON answer whatever the status:
    /// the server reports request errors as `{ "error": ... }` bodies.
    async fn post_json<B, R>(&self, path: &str, body: &B, timeout: Duration) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(self.endpoint(path)?)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes).map_err(|err| {
            if status.is_success() {
                ApiError::new(FailureKind::Decode, err.to_string())
            } else {
                ApiError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
            }
        })
    }

    /// Sends a request whose answer is not needed; any HTTP status counts as delivered.
    async fn fire(&self, request: reqwest::RequestBuilder, what: &str) -> Result<(), ApiError> {
        let response = request
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            paste_warn!("{what} answered with {status}");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ServerApi for ReqwestServerApi {
    async fn validate_path(&self, path: &str) -> Result<PathValidation, ApiError> {
        self.post_json(
            "validate_path",
            &PathValidationRequest { path },
            self.settings.request_timeout,
        )
        .await
    }

    async fn submit_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ApiError> {
        paste_info!(
            "Submitting {} url(s) as {} / {}",
            request.urls.len(),
            request.format,
            request.quality
        );
        self.post_json("download", request, self.settings.submit_timeout)
            .await
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let response = self
            .client
            .get(self.endpoint("history")?)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    async fn delete_history(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("delete_history/{id}"))?;
        self.fire(self.client.delete(url), "delete_history").await
    }

    async fn clear_history(&self) -> Result<(), ApiError> {
        let url = self.endpoint("clear_history")?;
        self.fire(self.client.post(url), "clear_history").await
    }

    async fn fetch_artifact(&self, download_url: &str, dir: &Path) -> Result<PathBuf, ApiError> {
        let url = self.endpoint(download_url)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let filename = artifact_filename(&url, disposition.as_deref());

        let writer = ArtifactWriter::new(dir.to_path_buf());
        let mut pending = writer.begin(&filename).map_err(map_persist_error)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            pending.write_chunk(&chunk).map_err(map_persist_error)?;
        }
        let written = pending.written();
        let saved = pending.finish().map_err(map_persist_error)?;
        paste_info!("Saved {written} bytes to {:?}", saved);
        Ok(saved)
    }
}

/// Parses the server root, making sure relative endpoints resolve below it.
pub(crate) fn parse_base_url(raw: &str) -> Result<reqwest::Url, ApiError> {
    let mut base = reqwest::Url::parse(raw.trim())
        .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(ApiError::new(FailureKind::InvalidUrl, "not a base url"));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}

fn map_persist_error(err: PersistError) -> ApiError {
    ApiError::new(FailureKind::Io, err.to_string())
}
