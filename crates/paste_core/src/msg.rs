use crate::{
    ConfirmAction, DownloadOutcome, Format, HistoryRecord, JobId, PathCheck, ProgressUpdate,
    TimerKey,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Client started; load the initial history.
    Init,
    /// User edited the URL input box.
    InputChanged(String),
    /// User picked an output format.
    FormatSelected(Format),
    /// User picked a quality value.
    QualitySelected(String),
    /// User edited the destination path.
    PathChanged(String),
    /// User asked the server to validate the destination path.
    ValidatePathClicked,
    /// Server answered a path validation; `Err` is a transport failure.
    PathValidated(Result<PathCheck, String>),
    /// User submitted the current URL input.
    DownloadClicked { now_ms: u64 },
    /// Server answered a batch submission; `Err` is a transport failure.
    DownloadFinished(Result<DownloadOutcome, String>),
    /// A server-provided download was saved locally.
    ArtifactSaved(Result<String, String>),
    /// Push event: progress for a job.
    ProgressReceived(ProgressUpdate),
    /// Push event: a job finished.
    DownloadCompleted {
        job_id: JobId,
        title: Option<String>,
    },
    /// Push event: a job failed.
    DownloadFailed {
        job_id: JobId,
        error: Option<String>,
    },
    /// Push channel connected or dropped.
    PushConnectionChanged { connected: bool },
    /// A scheduled timer elapsed.
    TimerFired(TimerKey),
    /// User asked for a history refresh.
    RefreshHistoryClicked,
    /// Server answered a history fetch.
    HistoryLoaded(Result<Vec<HistoryRecord>, String>),
    /// User asked to copy a stored path.
    CopyPathClicked { id: i64 },
    /// Clipboard write finished.
    ClipboardFinished(Result<(), String>),
    /// User asked to delete a history record.
    DeleteHistoryClicked { id: i64 },
    /// User asked to clear the whole history.
    ClearHistoryClicked,
    /// User answered a confirmation prompt.
    ConfirmationAnswered {
        action: ConfirmAction,
        accepted: bool,
    },
    /// Server answered a delete request.
    HistoryItemDeleted { id: i64, result: Result<(), String> },
    /// Server answered a clear request.
    HistoryCleared(Result<(), String>),
    /// User typed into the history search box.
    FilterChanged(String),
    /// User flipped the theme.
    ThemeToggled,
}
