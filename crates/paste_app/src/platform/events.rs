//! Translation of engine events into core messages.

use std::collections::HashMap;

use paste_core::{
    DownloadOutcome, HistoryRecord, JobId, Msg, PathCheck, ProgressUpdate, TimerKey,
};
use paste_engine::{DownloadResponse, EngineEvent, HistoryEntry, PushEvent, TimerId};

/// Maps core timer keys onto engine timer ids and back.
///
/// Every schedule gets a fresh id so a late report from a replaced timer
/// cannot be mistaken for the current one.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    next_id: TimerId,
    by_key: HashMap<TimerKey, TimerId>,
    by_id: HashMap<TimerId, TimerKey>,
}

impl TimerRegistry {
    /// Registers `key`; returns its new id and the id it replaces, if any.
    pub fn schedule(&mut self, key: TimerKey) -> (TimerId, Option<TimerId>) {
        self.next_id += 1;
        let id = self.next_id;
        let replaced = self.by_key.insert(key.clone(), id);
        if let Some(old) = replaced {
            self.by_id.remove(&old);
        }
        self.by_id.insert(id, key);
        (id, replaced)
    }

    pub fn cancel(&mut self, key: &TimerKey) -> Option<TimerId> {
        let id = self.by_key.remove(key)?;
        self.by_id.remove(&id);
        Some(id)
    }

    /// Resolves an elapsed id; stale ids resolve to nothing.
    pub fn elapsed(&mut self, id: TimerId) -> Option<TimerKey> {
        let key = self.by_id.remove(&id)?;
        self.by_key.remove(&key);
        Some(key)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

pub fn engine_event_to_msg(event: EngineEvent, timers: &mut TimerRegistry) -> Option<Msg> {
    let msg = match event {
        EngineEvent::PathValidated(result) => Msg::PathValidated(
            result
                .map(|verdict| PathCheck {
                    valid: verdict.valid,
                    message: verdict.message,
                })
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::DownloadSubmitted(result) => {
            Msg::DownloadFinished(result.map(outcome).map_err(|err| err.to_string()))
        }
        EngineEvent::HistoryLoaded(result) => Msg::HistoryLoaded(
            result
                .map(|entries| entries.into_iter().map(history_record).collect())
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::HistoryItemDeleted { id, result } => Msg::HistoryItemDeleted {
            id,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::HistoryCleared(result) => {
            Msg::HistoryCleared(result.map_err(|err| err.to_string()))
        }
        EngineEvent::ArtifactSaved(result) => Msg::ArtifactSaved(
            result
                .map(|path| path.display().to_string())
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::Push(PushEvent::Progress(progress)) => Msg::ProgressReceived(ProgressUpdate {
            job_id: JobId::from(progress.download_id),
            percent: progress.percent,
            speed: progress.speed,
            eta: progress.eta,
            downloaded: progress.downloaded,
            total: progress.total,
            status: progress.status,
        }),
        EngineEvent::Push(PushEvent::Complete(complete)) => Msg::DownloadCompleted {
            job_id: JobId::from(complete.download_id),
            title: complete.title,
        },
        EngineEvent::Push(PushEvent::Error(failure)) => Msg::DownloadFailed {
            job_id: JobId::from(failure.download_id),
            error: failure.error,
        },
        EngineEvent::PushConnection { connected } => Msg::PushConnectionChanged { connected },
        EngineEvent::TimerElapsed(id) => Msg::TimerFired(timers.elapsed(id)?),
    };
    Some(msg)
}

fn outcome(response: DownloadResponse) -> DownloadOutcome {
    DownloadOutcome {
        success: response.success,
        completed: response.results.len(),
        download_url: response.download_url,
        saved_path: response.path,
        errors: response
            .errors
            .into_iter()
            .filter_map(|item| item.error)
            .collect(),
        error: response.error,
    }
}

fn history_record(entry: HistoryEntry) -> HistoryRecord {
    HistoryRecord {
        timestamp: entry.timestamp_utc(),
        id: entry.id,
        url: entry.url,
        title: entry.title,
        file_format: entry.file_format,
        quality: entry.quality,
        file_size: entry.file_size,
        download_path: entry.download_path,
    }
}
