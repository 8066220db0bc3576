use paste_logging::{paste_debug, paste_error, paste_warn};

use crate::effect::{BANNER_DISMISS_DELAY, CARD_REMOVAL_DELAY, HISTORY_RELOAD_DELAY};
use crate::{
    ActiveDownload, AppState, CardTone, ConfirmAction, DownloadOutcome, DownloadRequest, Effect,
    HistoryState, JobId, Msg, PathCheck, PathStatus, ProgressUpdate, TimerKey,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Init | Msg::RefreshHistoryClicked => load_history(),
        Msg::InputChanged(text) => {
            state.set_url_input(text);
            Vec::new()
        }
        Msg::FormatSelected(format) => {
            state.select_format(format);
            Vec::new()
        }
        Msg::QualitySelected(value) => {
            if !state.select_quality(&value) {
                paste_debug!("Ignoring quality {value:?} for format {}", state.format());
            }
            Vec::new()
        }
        Msg::PathChanged(text) => {
            state.set_path_input(text);
            Vec::new()
        }
        Msg::ValidatePathClicked => {
            let path = state.path_input().trim().to_string();
            if path.is_empty() {
                state.set_path_status(PathStatus::Invalid("Please enter a path".to_string()));
                Vec::new()
            } else {
                vec![Effect::ValidatePath { path }]
            }
        }
        Msg::PathValidated(result) => {
            state.set_path_status(path_status(result));
            Vec::new()
        }
        Msg::DownloadClicked { now_ms } => start_download(&mut state, now_ms),
        Msg::DownloadFinished(result) => finish_download(&mut state, result),
        Msg::ArtifactSaved(Ok(path)) => {
            notify(&mut state, "Saved", &format!("File saved to {path}"))
        }
        Msg::ArtifactSaved(Err(message)) => {
            paste_error!("Saving download failed: {message}");
            vec![Effect::Alert {
                message: format!("Could not fetch download: {message}"),
            }]
        }
        Msg::ProgressReceived(progress) => {
            apply_progress(&mut state, progress);
            Vec::new()
        }
        Msg::DownloadCompleted { job_id, title } => complete_download(&mut state, job_id, title),
        Msg::DownloadFailed { job_id, error } => {
            let found = state.with_card(&job_id, |card| {
                card.status = "Error".to_string();
                card.tone = CardTone::Error;
            });
            if found {
                paste_error!(
                    "Download error for {job_id}: {}",
                    error.as_deref().unwrap_or("Unknown error")
                );
            }
            Vec::new()
        }
        Msg::PushConnectionChanged { connected } => {
            state.set_push_connected(connected);
            Vec::new()
        }
        Msg::TimerFired(key) => timer_fired(&mut state, key),
        Msg::HistoryLoaded(Ok(records)) => {
            state.set_history(HistoryState::Loaded(records));
            Vec::new()
        }
        Msg::HistoryLoaded(Err(message)) => {
            paste_error!("Error loading history: {message}");
            state.set_history(HistoryState::Failed);
            Vec::new()
        }
        Msg::CopyPathClicked { id } => match state
            .history_record(id)
            .and_then(|record| record.download_path.clone())
        {
            Some(path) if !path.is_empty() => vec![Effect::CopyToClipboard { text: path }],
            _ => Vec::new(),
        },
        Msg::ClipboardFinished(Ok(())) => {
            notify(&mut state, "Copied!", "File path copied to clipboard")
        }
        Msg::ClipboardFinished(Err(message)) => {
            paste_warn!("Failed to copy: {message}");
            Vec::new()
        }
        Msg::DeleteHistoryClicked { id } => confirm(ConfirmAction::DeleteHistory { id }),
        Msg::ClearHistoryClicked => confirm(ConfirmAction::ClearHistory),
        Msg::ConfirmationAnswered { action, accepted } => {
            if !accepted {
                Vec::new()
            } else {
                match action {
                    ConfirmAction::DeleteHistory { id } => vec![Effect::DeleteHistory { id }],
                    ConfirmAction::ClearHistory => vec![Effect::ClearHistory],
                }
            }
        }
        Msg::HistoryItemDeleted { id, result } => match result {
            Ok(()) => load_history(),
            Err(message) => {
                paste_error!("Error deleting history item {id}: {message}");
                Vec::new()
            }
        },
        Msg::HistoryCleared(Ok(())) => {
            let mut effects = load_history();
            effects.extend(notify(&mut state, "Cleared", "Download history cleared"));
            effects
        }
        Msg::HistoryCleared(Err(message)) => {
            paste_error!("Error clearing history: {message}");
            Vec::new()
        }
        Msg::FilterChanged(text) => {
            state.set_filter(&text);
            Vec::new()
        }
        Msg::ThemeToggled => {
            state.toggle_theme();
            Vec::new()
        }
    };

    (state, effects)
}

/// The rendered list stays in place until the response replaces it.
fn load_history() -> Vec<Effect> {
    vec![Effect::LoadHistory]
}

fn path_status(result: Result<PathCheck, String>) -> PathStatus {
    match result {
        Ok(PathCheck { valid: true, .. }) => PathStatus::Valid("✓ Path is valid".to_string()),
        Ok(PathCheck {
            valid: false,
            message,
        }) => PathStatus::Invalid(format!("✗ {}", message.unwrap_or_default())),
        Err(message) => {
            paste_warn!("Path validation request failed: {message}");
            PathStatus::Invalid("Error validating path".to_string())
        }
    }
}

fn start_download(state: &mut AppState, now_ms: u64) -> Vec<Effect> {
    // The submit control is disabled while a batch is in flight.
    if state.is_submitting() {
        return Vec::new();
    }
    let urls = parse_urls(state.url_input());
    if urls.is_empty() {
        return vec![Effect::Alert {
            message: "Please enter at least one URL".to_string(),
        }];
    }

    let format = state.format();
    let quality = state.quality().to_string();
    let path = if state.is_mobile() {
        String::new()
    } else {
        state.path_input().trim().to_string()
    };

    state.set_submitting(true);
    let mut effects: Vec<Effect> = state
        .clear_active_downloads()
        .into_iter()
        .map(|job_id| Effect::CancelTimer {
            key: TimerKey::CardRemoval(job_id),
        })
        .collect();

    let stamp = state.next_stamp(now_ms);
    let job_ids: Vec<JobId> = (0..urls.len())
        .map(|index| JobId::new(index, stamp))
        .collect();
    for (job_id, url) in job_ids.iter().zip(&urls) {
        state.track_download(
            job_id.clone(),
            ActiveDownload {
                url: url.clone(),
                format,
                quality: quality.clone(),
            },
        );
    }

    effects.push(Effect::SubmitDownload(DownloadRequest {
        urls,
        format,
        quality,
        path,
        job_ids,
    }));
    effects
}

fn finish_download(state: &mut AppState, result: Result<DownloadOutcome, String>) -> Vec<Effect> {
    state.set_submitting(false);
    match result {
        Ok(outcome) if outcome.success => {
            let mut effects = notify(
                state,
                "Downloads Complete!",
                &format!("Successfully downloaded {} file(s)", outcome.completed),
            );
            if let Some(url) = outcome.download_url {
                effects.push(Effect::FetchArtifact { url });
            } else if let Some(path) = outcome.saved_path {
                effects.extend(notify(state, "Saved", &format!("Files saved to {path}")));
            }
            state.set_url_input(String::new());
            effects.push(Effect::ScheduleTimer {
                key: TimerKey::HistoryReload,
                delay: HISTORY_RELOAD_DELAY,
            });
            effects
        }
        Ok(outcome) => {
            let reason = if !outcome.errors.is_empty() {
                outcome.errors.join(", ")
            } else {
                outcome
                    .error
                    .filter(|error| !error.is_empty())
                    .unwrap_or_else(|| "Unknown error".to_string())
            };
            vec![Effect::Alert {
                message: format!("Download failed: {reason}"),
            }]
        }
        Err(message) => {
            paste_error!("Download error: {message}");
            vec![Effect::Alert {
                message: format!("Download failed: {message}"),
            }]
        }
    }
}

fn apply_progress(state: &mut AppState, progress: ProgressUpdate) {
    let ProgressUpdate {
        job_id,
        percent,
        speed,
        eta,
        downloaded,
        total,
        status,
    } = progress;
    state.with_card(&job_id, |card| {
        card.bar_percent = percent.as_deref().map(bar_width).unwrap_or(0.0);
        card.percent_text = percent.unwrap_or_else(|| "0%".to_string());
        card.speed = non_empty_or(speed, "-");
        card.eta = non_empty_or(eta, "-");
        card.downloaded = non_empty_or(downloaded, "0 B");
        card.total = non_empty_or(total, "Unknown");
        card.status = non_empty_or(status, "Downloading...");
    });
}

fn complete_download(state: &mut AppState, job_id: JobId, title: Option<String>) -> Vec<Effect> {
    let found = state.with_card(&job_id, |card| {
        card.bar_percent = 100.0;
        card.percent_text = "100%".to_string();
        card.status = "Complete".to_string();
        card.tone = CardTone::Success;
        card.title = non_empty_or(title, "Download Complete");
        card.removal_scheduled = true;
    });
    if !found {
        return Vec::new();
    }
    vec![Effect::ScheduleTimer {
        key: TimerKey::CardRemoval(job_id),
        delay: CARD_REMOVAL_DELAY,
    }]
}

fn timer_fired(state: &mut AppState, key: TimerKey) -> Vec<Effect> {
    match key {
        TimerKey::CardRemoval(job_id) => {
            state.remove_card(&job_id);
            Vec::new()
        }
        TimerKey::BannerDismiss(id) => {
            state.dismiss_banner(id);
            Vec::new()
        }
        TimerKey::HistoryReload => load_history(),
    }
}

fn confirm(action: ConfirmAction) -> Vec<Effect> {
    vec![Effect::RequestConfirmation {
        action,
        prompt: action.prompt().to_string(),
    }]
}

/// Shows an in-app banner and asks the platform for a system notification.
fn notify(state: &mut AppState, title: &str, body: &str) -> Vec<Effect> {
    let id = state.push_banner(title, body);
    vec![
        Effect::SystemNotification {
            title: title.to_string(),
            body: body.to_string(),
        },
        Effect::ScheduleTimer {
            key: TimerKey::BannerDismiss(id),
            delay: BANNER_DISMISS_DELAY,
        },
    ]
}

pub(crate) fn parse_urls(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn bar_width(percent: &str) -> f64 {
    parse_leading_float(percent)
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 100.0))
        .unwrap_or(0.0)
}

/// Parses the longest numeric prefix (`[+-]digits[.digits][e[+-]digits]`),
/// ignoring leading whitespace and any trailing unit such as `%`.
pub(crate) fn parse_leading_float(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while let Some(&byte) = bytes.get(end) {
        match byte {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits = bytes[exp_end..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        if digits > 0 {
            end = exp_end + digits;
        }
    }
    text[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_float_ignores_units_and_whitespace() {
        assert_eq!(parse_leading_float("  45.3%"), Some(45.3));
        assert_eq!(parse_leading_float("100%"), Some(100.0));
        assert_eq!(parse_leading_float("7."), Some(7.0));
        assert_eq!(parse_leading_float("-2.5"), Some(-2.5));
        assert_eq!(parse_leading_float("1e2%"), Some(100.0));
        assert_eq!(parse_leading_float("2.5E-1"), Some(0.25));
        assert_eq!(parse_leading_float("3e%"), Some(3.0));
        assert_eq!(parse_leading_float("N/A"), None);
        assert_eq!(parse_leading_float("."), None);
        assert_eq!(parse_leading_float(""), None);
    }

    #[test]
    fn bar_width_is_clamped() {
        assert_eq!(bar_width("250%"), 100.0);
        assert_eq!(bar_width("-3%"), 0.0);
        assert_eq!(bar_width("garbage"), 0.0);
        assert_eq!(bar_width("1e2%"), 100.0);
    }

    #[test]
    fn parse_urls_counts_non_blank_lines() {
        assert_eq!(
            parse_urls(" a \n\n\t\n b\r\n"),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
