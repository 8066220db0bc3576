use std::time::Duration;

use crate::{DownloadRequest, JobId};

pub const CARD_REMOVAL_DELAY: Duration = Duration::from_secs(5);
pub const BANNER_DISMISS_DELAY: Duration = Duration::from_secs(3);
/// Gives the server time to persist the records of a finished batch.
pub const HISTORY_RELOAD_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ValidatePath { path: String },
    SubmitDownload(DownloadRequest),
    FetchArtifact { url: String },
    LoadHistory,
    DeleteHistory { id: i64 },
    ClearHistory,
    CopyToClipboard { text: String },
    RequestConfirmation {
        action: ConfirmAction,
        prompt: String,
    },
    /// Blocking message the user has to acknowledge.
    Alert { message: String },
    /// Best-effort OS notification; the in-app banner is shown regardless.
    SystemNotification { title: String, body: String },
    ScheduleTimer { key: TimerKey, delay: Duration },
    CancelTimer { key: TimerKey },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfirmAction {
    DeleteHistory { id: i64 },
    ClearHistory,
}

impl ConfirmAction {
    pub fn prompt(self) -> &'static str {
        match self {
            ConfirmAction::DeleteHistory { .. } => "Delete this history item?",
            ConfirmAction::ClearHistory => "Clear all download history?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    CardRemoval(JobId),
    BannerDismiss(u64),
    HistoryReload,
}
