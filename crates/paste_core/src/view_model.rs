use crate::format::{quality_options, Format};
use crate::update::parse_urls;
use crate::{AppState, CardTone, HistoryRecord, HistoryState, JobId, PathStatus, Theme};

pub const HISTORY_LOADING_TEXT: &str = "Loading...";
pub const HISTORY_EMPTY_TEXT: &str = "No download history";
pub const HISTORY_ERROR_TEXT: &str = "Error loading history";

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub url_input: String,
    pub url_count: usize,
    pub format: Format,
    pub quality_options: Vec<QualityOptionView>,
    pub path_input_visible: bool,
    pub path_input: String,
    pub path_status: Option<PathStatusView>,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub cards: Vec<CardView>,
    pub history: HistoryView,
    pub banners: Vec<BannerView>,
    pub theme: Theme,
    pub theme_icon: &'static str,
    pub push_connected: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStatusView {
    pub message: String,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub job_id: JobId,
    pub title: String,
    pub status: String,
    pub tone: CardTone,
    pub bar_percent: f64,
    pub percent_text: String,
    pub speed: String,
    pub eta: String,
    /// `downloaded / total`.
    pub transfer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryView {
    Loading,
    Empty,
    Failed,
    Rows(Vec<HistoryRowView>),
}

impl HistoryView {
    /// Placeholder text shown instead of rows, if any.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            HistoryView::Loading => Some(HISTORY_LOADING_TEXT),
            HistoryView::Empty => Some(HISTORY_EMPTY_TEXT),
            HistoryView::Failed => Some(HISTORY_ERROR_TEXT),
            HistoryView::Rows(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRowView {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub format: String,
    pub quality: String,
    pub size: String,
    pub path: Option<String>,
    /// False when hidden by the search filter.
    pub visible: bool,
}

impl HistoryRowView {
    fn from_record(record: &HistoryRecord) -> Self {
        Self {
            id: record.id,
            title: or_placeholder(record.title.as_deref(), "Unknown Title"),
            date: record
                .timestamp
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "Unknown date".to_string()),
            format: record.file_format.to_uppercase(),
            quality: or_placeholder(record.quality.as_deref(), "N/A"),
            size: or_placeholder(record.file_size.as_deref(), "N/A"),
            path: record.download_path.clone(),
            visible: true,
        }
    }

    /// Everything the row displays; this is what the search filter matches.
    pub fn visible_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.title, self.date, self.format, self.quality, self.size
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerView {
    pub title: String,
    pub body: String,
}

impl AppViewModel {
    pub(crate) fn project(state: &AppState) -> Self {
        let format = state.format();
        let quality_options = quality_options(format)
            .iter()
            .map(|option| QualityOptionView {
                value: option.value,
                label: option.label,
                selected: option.value == state.quality(),
            })
            .collect();

        let path_status = state.path_status().map(|status| match status {
            PathStatus::Valid(message) => PathStatusView {
                message: message.clone(),
                valid: true,
            },
            PathStatus::Invalid(message) => PathStatusView {
                message: message.clone(),
                valid: false,
            },
        });

        let cards = state
            .cards()
            .iter()
            .map(|card| CardView {
                job_id: card.job_id.clone(),
                title: card.title.clone(),
                status: card.status.clone(),
                tone: card.tone,
                bar_percent: card.bar_percent,
                percent_text: card.percent_text.clone(),
                speed: card.speed.clone(),
                eta: card.eta.clone(),
                transfer: format!("{} / {}", card.downloaded, card.total),
            })
            .collect();

        let (submit_enabled, submit_label) = if state.is_submitting() {
            (false, "Starting...")
        } else {
            (true, "Start Download")
        };

        Self {
            url_input: state.url_input().to_string(),
            url_count: parse_urls(state.url_input()).len(),
            format,
            quality_options,
            path_input_visible: !state.is_mobile(),
            path_input: state.path_input().to_string(),
            path_status,
            submit_enabled,
            submit_label,
            cards,
            history: project_history(state.history(), state.filter()),
            banners: state
                .banners()
                .iter()
                .map(|banner| BannerView {
                    title: banner.title.clone(),
                    body: banner.body.clone(),
                })
                .collect(),
            theme: state.theme(),
            theme_icon: match state.theme() {
                Theme::Dark => "moon",
                Theme::Light => "sun",
            },
            push_connected: state.is_push_connected(),
            dirty: state.is_dirty(),
        }
    }
}

fn project_history(history: &HistoryState, filter: Option<&str>) -> HistoryView {
    match history {
        HistoryState::Loading => HistoryView::Loading,
        HistoryState::Failed => HistoryView::Failed,
        HistoryState::Loaded(records) if records.is_empty() => HistoryView::Empty,
        HistoryState::Loaded(records) => HistoryView::Rows(
            records
                .iter()
                .map(|record| {
                    let mut row = HistoryRowView::from_record(record);
                    if let Some(needle) = filter {
                        row.visible = row.visible_text().to_lowercase().contains(needle);
                    }
                    row
                })
                .collect(),
        ),
    }
}

fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => placeholder.to_string(),
    }
}
