use std::io::Write;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use paste_core::{ConfirmAction, DownloadRequest, Effect, Msg};
use paste_engine::{EngineEvent, EngineHandle, EventSink};
use paste_logging::{paste_debug, paste_info, paste_warn};

use super::events::{engine_event_to_msg, TimerRegistry};
use super::terminal::Terminal;

/// Everything the main loop reacts to.
#[derive(Debug)]
pub enum AppInput {
    Msg(Msg),
    Line(String),
    InputClosed,
}

/// What an effect hands back to the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Followup {
    Msg(Msg),
    /// The next input line answers this confirmation.
    Confirm(ConfirmAction),
}

pub struct EffectRunner {
    engine: EngineHandle,
    timers: Arc<Mutex<TimerRegistry>>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, timers: Arc<Mutex<TimerRegistry>>) -> Self {
        Self { engine, timers }
    }

    pub fn run<W: Write>(&self, effects: Vec<Effect>, terminal: &mut Terminal<W>) -> Vec<Followup> {
        let mut followups = Vec::new();
        for effect in effects {
            paste_debug!("Running effect {:?}", effect);
            match effect {
                Effect::ValidatePath { path } => self.engine.validate_path(path),
                Effect::SubmitDownload(request) => {
                    paste_info!("Submitting {} url(s)", request.urls.len());
                    self.engine.submit_download(wire_request(request));
                }
                Effect::FetchArtifact { url } => self.engine.fetch_artifact(url),
                Effect::LoadHistory => self.engine.load_history(),
                Effect::DeleteHistory { id } => self.engine.delete_history(id),
                Effect::ClearHistory => self.engine.clear_history(),
                Effect::CopyToClipboard { text } => {
                    let result = terminal
                        .copy_to_clipboard(&text)
                        .map_err(|err| err.to_string());
                    followups.push(Followup::Msg(Msg::ClipboardFinished(result)));
                }
                Effect::RequestConfirmation { action, prompt } => {
                    if let Err(err) = terminal.prompt(&prompt) {
                        paste_warn!("Could not show confirmation: {err}");
                    }
                    followups.push(Followup::Confirm(action));
                }
                Effect::Alert { message } => {
                    if let Err(err) = terminal.alert(&message) {
                        paste_warn!("Could not show alert: {err}");
                    }
                }
                Effect::SystemNotification { title, body } => {
                    if let Err(err) = terminal.notify(&title, &body) {
                        paste_debug!("System notification skipped: {err}");
                    }
                }
                Effect::ScheduleTimer { key, delay } => {
                    let (id, replaced) = lock(&self.timers).schedule(key);
                    if let Some(old) = replaced {
                        self.engine.cancel(old);
                    }
                    self.engine.schedule(id, delay);
                }
                Effect::CancelTimer { key } => {
                    if let Some(id) = lock(&self.timers).cancel(&key) {
                        self.engine.cancel(id);
                    }
                }
            }
        }
        followups
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

/// Forwards engine events into the main loop as core messages.
pub struct MsgSink {
    tx: mpsc::Sender<AppInput>,
    timers: Arc<Mutex<TimerRegistry>>,
}

impl MsgSink {
    pub fn new(tx: mpsc::Sender<AppInput>, timers: Arc<Mutex<TimerRegistry>>) -> Self {
        Self { tx, timers }
    }
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let msg = engine_event_to_msg(event, &mut lock(&self.timers));
        if let Some(msg) = msg {
            let _ = self.tx.send(AppInput::Msg(msg));
        }
    }
}

pub fn wire_request(request: DownloadRequest) -> paste_engine::DownloadRequest {
    paste_engine::DownloadRequest {
        urls: request.urls,
        format: request.format.as_str().to_string(),
        quality: request.quality,
        path: request.path,
        download_ids: request
            .job_ids
            .iter()
            .map(|id| id.as_str().to_string())
            .collect(),
    }
}

fn lock(timers: &Mutex<TimerRegistry>) -> MutexGuard<'_, TimerRegistry> {
    timers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
