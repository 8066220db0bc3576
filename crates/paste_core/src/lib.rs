//! just_paste core: pure client store, state machine, and view-model projection.
mod effect;
mod environment;
mod format;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{
    ConfirmAction, Effect, TimerKey, BANNER_DISMISS_DELAY, CARD_REMOVAL_DELAY,
    HISTORY_RELOAD_DELAY,
};
pub use environment::{Environment, TargetEnvironment, UserAgentEnvironment};
pub use format::{default_quality, quality_options, Format, QualityOption};
pub use msg::Msg;
pub use state::{
    ActiveDownload, AppState, Banner, CardTone, DownloadOutcome, DownloadRequest, HistoryRecord,
    HistoryState, JobId, PathCheck, PathStatus, ProgressCard, ProgressUpdate, Theme,
};
pub use update::update;
pub use view_model::{
    AppViewModel, BannerView, CardView, HistoryRowView, HistoryView, PathStatusView,
    QualityOptionView, HISTORY_EMPTY_TEXT, HISTORY_ERROR_TEXT, HISTORY_LOADING_TEXT,
};
