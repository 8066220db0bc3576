use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use paste_logging::{paste_info, paste_warn};
use tokio_util::sync::CancellationToken;

use crate::channel::{PollingChannel, PushSettings};
use crate::client::{ClientSettings, ReqwestServerApi, ServerApi};
use crate::timers::Timers;
use crate::{ApiError, DownloadRequest, EngineEvent, EventSink, FailureKind, TimerId};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub client: ClientSettings,
    pub push: PushSettings,
    /// Where server-provided downloads are saved.
    pub save_dir: PathBuf,
    /// Open the push channel on start.
    pub push_enabled: bool,
}

enum EngineCommand {
    ValidatePath { path: String },
    SubmitDownload(DownloadRequest),
    LoadHistory,
    DeleteHistory { id: i64 },
    ClearHistory,
    FetchArtifact { url: String },
    Schedule { timer: TimerId, delay: Duration },
    Cancel { timer: TimerId },
    Shutdown,
}

/// Front door to the IO side: commands go in, results come back through the sink.
///
/// The engine owns a tokio runtime on a background thread; every request runs
/// as its own task so a slow batch never blocks history or timers.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Result<Self, ApiError> {
        let api: Arc<dyn ServerApi> = Arc::new(ReqwestServerApi::new(config.client.clone())?);
        let channel = if config.push_enabled {
            Some(PollingChannel::new(&config.client.base_url, config.push.clone())?)
        } else {
            None
        };
        Self::with_api(api, channel, config.save_dir, sink)
    }

    /// Starts the engine on a caller-provided API implementation.
    pub fn with_api(
        api: Arc<dyn ServerApi>,
        channel: Option<PollingChannel>,
        save_dir: PathBuf,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| ApiError::new(FailureKind::Io, err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let save_dir = Arc::new(save_dir);

        thread::spawn(move || {
            let shutdown = CancellationToken::new();
            let timers = Timers::new(sink.clone());

            if let Some(channel) = channel {
                let sink = sink.clone();
                let cancel = shutdown.clone();
                runtime.spawn(async move { channel.run(sink.as_ref(), cancel).await });
            }

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Shutdown => break,
                    EngineCommand::Schedule { timer, delay } => {
                        timers.schedule(runtime.handle(), timer, delay)
                    }
                    EngineCommand::Cancel { timer } => timers.cancel(timer),
                    request => {
                        let api = api.clone();
                        let sink = sink.clone();
                        let save_dir = save_dir.clone();
                        runtime.spawn(async move {
                            let event = handle_request(api.as_ref(), request, &save_dir).await;
                            if let Some(event) = event {
                                sink.emit(event);
                            }
                        });
                    }
                }
            }

            paste_info!("Engine shutting down");
            timers.cancel_all();
            shutdown.cancel();
            runtime.shutdown_timeout(Duration::from_secs(1));
        });

        Ok(Self { cmd_tx })
    }

    pub fn validate_path(&self, path: impl Into<String>) {
        self.send(EngineCommand::ValidatePath { path: path.into() });
    }

    pub fn submit_download(&self, request: DownloadRequest) {
        self.send(EngineCommand::SubmitDownload(request));
    }

    pub fn load_history(&self) {
        self.send(EngineCommand::LoadHistory);
    }

    pub fn delete_history(&self, id: i64) {
        self.send(EngineCommand::DeleteHistory { id });
    }

    pub fn clear_history(&self) {
        self.send(EngineCommand::ClearHistory);
    }

    pub fn fetch_artifact(&self, url: impl Into<String>) {
        self.send(EngineCommand::FetchArtifact { url: url.into() });
    }

    pub fn schedule(&self, timer: TimerId, delay: Duration) {
        self.send(EngineCommand::Schedule { timer, delay });
    }

    pub fn cancel(&self, timer: TimerId) {
        self.send(EngineCommand::Cancel { timer });
    }

    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            paste_warn!("Engine is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }
}

async fn handle_request(
    api: &dyn ServerApi,
    command: EngineCommand,
    save_dir: &std::path::Path,
) -> Option<EngineEvent> {
    let event = match command {
        EngineCommand::ValidatePath { path } => {
            EngineEvent::PathValidated(api.validate_path(&path).await)
        }
        EngineCommand::SubmitDownload(request) => {
            EngineEvent::DownloadSubmitted(api.submit_download(&request).await)
        }
        EngineCommand::LoadHistory => EngineEvent::HistoryLoaded(api.history().await),
        EngineCommand::DeleteHistory { id } => EngineEvent::HistoryItemDeleted {
            id,
            result: api.delete_history(id).await,
        },
        EngineCommand::ClearHistory => EngineEvent::HistoryCleared(api.clear_history().await),
        EngineCommand::FetchArtifact { url } => {
            EngineEvent::ArtifactSaved(api.fetch_artifact(&url, save_dir).await)
        }
        EngineCommand::Schedule { .. } | EngineCommand::Cancel { .. } | EngineCommand::Shutdown => {
            return None
        }
    };
    Some(event)
}
