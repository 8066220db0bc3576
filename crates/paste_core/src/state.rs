use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::environment::Environment;
use crate::format::{default_quality, is_quality_offered, Format};
use crate::view_model::AppViewModel;

/// Client-generated identifier correlating a submitted URL with its progress
/// card and with the push events the server sends for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(index: usize, stamp_ms: u64) -> Self {
        Self(format!("download_{index}_{stamp_ms}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for JobId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Request parameters remembered for every job of the current batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDownload {
    pub url: String,
    pub format: Format,
    pub quality: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardTone {
    #[default]
    Neutral,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressCard {
    pub job_id: JobId,
    pub title: String,
    pub status: String,
    pub tone: CardTone,
    /// Bar width in percent, always within `0.0..=100.0`.
    pub bar_percent: f64,
    pub percent_text: String,
    pub speed: String,
    pub eta: String,
    pub downloaded: String,
    pub total: String,
    /// A removal timer is pending for this card.
    pub removal_scheduled: bool,
}

impl ProgressCard {
    fn new(job_id: JobId, url: &str) -> Self {
        Self {
            job_id,
            title: display_host(url),
            status: "Initializing...".to_string(),
            tone: CardTone::Neutral,
            bar_percent: 0.0,
            percent_text: "0%".to_string(),
            speed: "-".to_string(),
            eta: "-".to_string(),
            downloaded: "0 B".to_string(),
            total: "Unknown".to_string(),
            removal_scheduled: false,
        }
    }
}

/// Latest progress reported by the server for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub job_id: JobId,
    pub percent: Option<String>,
    pub speed: Option<String>,
    pub eta: Option<String>,
    pub downloaded: Option<String>,
    pub total: Option<String>,
    pub status: Option<String>,
}

impl ProgressUpdate {
    pub fn new(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            percent: None,
            speed: None,
            eta: None,
            downloaded: None,
            total: None,
            status: None,
        }
    }
}

/// Server-persisted metadata about a finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub file_format: String,
    pub quality: Option<String>,
    pub file_size: Option<String>,
    pub download_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HistoryState {
    #[default]
    Loading,
    Loaded(Vec<HistoryRecord>),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStatus {
    Valid(String),
    Invalid(String),
}

/// Server verdict on a destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCheck {
    pub valid: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: u64,
    pub title: String,
    pub body: String,
}

/// Batch submission sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub urls: Vec<String>,
    pub format: Format,
    pub quality: String,
    pub path: String,
    /// Index-aligned with `urls`.
    pub job_ids: Vec<JobId>,
}

/// Server verdict on a batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadOutcome {
    pub success: bool,
    pub completed: usize,
    pub download_url: Option<String>,
    pub saved_path: Option<String>,
    pub errors: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    url_input: String,
    format: Format,
    quality: String,
    path_input: String,
    path_status: Option<PathStatus>,
    mobile: bool,
    submitting: bool,
    last_stamp: Option<u64>,
    active: BTreeMap<JobId, ActiveDownload>,
    cards: Vec<ProgressCard>,
    history: HistoryState,
    filter: Option<String>,
    banners: Vec<Banner>,
    next_banner_id: u64,
    theme: Theme,
    push_connected: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            quality: default_quality(Format::default()).to_string(),
            ..Self::default()
        }
    }

    pub fn for_environment(env: &dyn Environment) -> Self {
        Self {
            mobile: env.is_mobile_environment(),
            ..Self::new()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::project(self)
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn url_input(&self) -> &str {
        &self.url_input
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn path_input(&self) -> &str {
        &self.path_input
    }

    pub fn path_status(&self) -> Option<&PathStatus> {
        self.path_status.as_ref()
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn active_downloads(&self) -> &BTreeMap<JobId, ActiveDownload> {
        &self.active
    }

    pub fn cards(&self) -> &[ProgressCard] {
        &self.cards
    }

    pub fn card(&self, job_id: &JobId) -> Option<&ProgressCard> {
        self.cards.iter().find(|card| &card.job_id == job_id)
    }

    pub fn history(&self) -> &HistoryState {
        &self.history
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_push_connected(&self) -> bool {
        self.push_connected
    }

    pub(crate) fn set_url_input(&mut self, text: String) {
        if self.url_input != text {
            self.url_input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn select_format(&mut self, format: Format) {
        self.format = format;
        self.quality = default_quality(format).to_string();
        self.mark_dirty();
    }

    pub(crate) fn select_quality(&mut self, value: &str) -> bool {
        if !is_quality_offered(self.format, value) {
            return false;
        }
        if self.quality != value {
            self.quality = value.to_string();
            self.mark_dirty();
        }
        true
    }

    pub(crate) fn set_path_input(&mut self, text: String) {
        if self.path_input != text {
            self.path_input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_path_status(&mut self, status: PathStatus) {
        self.path_status = Some(status);
        self.mark_dirty();
    }

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
        self.mark_dirty();
    }

    /// Session-unique batch stamp: never repeats even within one millisecond.
    pub(crate) fn next_stamp(&mut self, now_ms: u64) -> u64 {
        let stamp = match self.last_stamp {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    /// Drops every tracked job and card, returning the keys of cards whose
    /// removal timer is still pending.
    pub(crate) fn clear_active_downloads(&mut self) -> Vec<JobId> {
        self.active.clear();
        let pending = self
            .cards
            .drain(..)
            .filter(|card| card.removal_scheduled)
            .map(|card| card.job_id)
            .collect();
        self.mark_dirty();
        pending
    }

    pub(crate) fn track_download(&mut self, job_id: JobId, entry: ActiveDownload) {
        self.cards.push(ProgressCard::new(job_id.clone(), &entry.url));
        self.active.insert(job_id, entry);
        self.mark_dirty();
    }

    /// Runs `apply` on the card for `job_id`; unknown ids leave the state untouched.
    pub(crate) fn with_card<F>(&mut self, job_id: &JobId, apply: F) -> bool
    where
        F: FnOnce(&mut ProgressCard),
    {
        match self.cards.iter_mut().find(|card| &card.job_id == job_id) {
            Some(card) => {
                apply(card);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_card(&mut self, job_id: &JobId) -> bool {
        let before = self.cards.len();
        self.cards.retain(|card| &card.job_id != job_id);
        let removed = self.cards.len() != before;
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn set_history(&mut self, history: HistoryState) {
        self.history = history;
        self.filter = None;
        self.mark_dirty();
    }

    pub(crate) fn history_record(&self, id: i64) -> Option<&HistoryRecord> {
        match &self.history {
            HistoryState::Loaded(records) => records.iter().find(|record| record.id == id),
            HistoryState::Loading | HistoryState::Failed => None,
        }
    }

    pub(crate) fn set_filter(&mut self, text: &str) {
        let filter = if text.is_empty() {
            None
        } else {
            Some(text.to_lowercase())
        };
        if self.filter != filter {
            self.filter = filter;
            self.mark_dirty();
        }
    }

    pub(crate) fn push_banner(&mut self, title: &str, body: &str) -> u64 {
        self.next_banner_id += 1;
        let id = self.next_banner_id;
        self.banners.push(Banner {
            id,
            title: title.to_string(),
            body: body.to_string(),
        });
        self.mark_dirty();
        id
    }

    pub(crate) fn dismiss_banner(&mut self, id: u64) {
        let before = self.banners.len();
        self.banners.retain(|banner| banner.id != id);
        if self.banners.len() != before {
            self.mark_dirty();
        }
    }

    pub(crate) fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.mark_dirty();
    }

    pub(crate) fn set_push_connected(&mut self, connected: bool) {
        if self.push_connected != connected {
            self.push_connected = connected;
            self.mark_dirty();
        }
    }
}

/// Host part of a URL for card titles; the raw text when it does not parse.
fn display_host(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|parsed| parsed.host_str().map(ToOwned::to_owned))
        .unwrap_or_else(|| raw.to_string())
}
