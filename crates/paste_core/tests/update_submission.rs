use std::sync::Once;

use paste_core::{
    update, AppState, DownloadOutcome, DownloadRequest, Effect, Format, JobId, Msg, TimerKey,
    UserAgentEnvironment, HISTORY_RELOAD_DELAY,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(paste_logging::initialize_for_tests);
}

fn with_input(state: AppState, input: &str) -> AppState {
    update(state, Msg::InputChanged(input.to_string())).0
}

fn submitted_request(effects: &[Effect]) -> &DownloadRequest {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::SubmitDownload(request) => Some(request),
            _ => None,
        })
        .expect("submit effect")
}

#[test]
fn empty_input_alerts_without_request() {
    init_logging();
    let state = with_input(AppState::new(), "  \n\n");
    let (state, effects) = update(state, Msg::DownloadClicked { now_ms: 1_000 });

    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: "Please enter at least one URL".to_string()
        }]
    );
    assert!(state.cards().is_empty());
    assert!(state.view().submit_enabled);
}

#[test]
fn submission_creates_one_card_per_url() {
    init_logging();
    let state = with_input(
        AppState::new(),
        "https://www.youtube.com/watch?v=1\n\n not a url \n",
    );
    let (state, _) = update(state, Msg::FormatSelected(Format::Mp3));
    let (state, _) = update(state, Msg::PathChanged(" /srv/media ".to_string()));
    let (state, effects) = update(state, Msg::DownloadClicked { now_ms: 1_700 });

    assert_eq!(
        effects,
        vec![Effect::SubmitDownload(DownloadRequest {
            urls: vec![
                "https://www.youtube.com/watch?v=1".to_string(),
                "not a url".to_string()
            ],
            format: Format::Mp3,
            quality: "192kbps".to_string(),
            path: "/srv/media".to_string(),
            job_ids: vec![JobId::new(0, 1_700), JobId::new(1, 1_700)],
        })]
    );

    let view = state.view();
    assert!(!view.submit_enabled);
    assert_eq!(view.submit_label, "Starting...");
    let titles: Vec<_> = view.cards.iter().map(|card| card.title.as_str()).collect();
    assert_eq!(titles, vec!["www.youtube.com", "not a url"]);
    let card = &view.cards[0];
    assert_eq!(card.job_id.as_str(), "download_0_1700");
    assert_eq!(card.status, "Initializing...");
    assert_eq!(card.percent_text, "0%");
    assert_eq!(card.transfer, "0 B / Unknown");

    let entry = &state.active_downloads()[&JobId::new(1, 1_700)];
    assert_eq!(entry.url, "not a url");
    assert_eq!(entry.format, Format::Mp3);
}

#[test]
fn mobile_submission_forces_empty_path() {
    let state = AppState::for_environment(&UserAgentEnvironment::new(
        "Mozilla/5.0 (Linux; Android 14; Pixel 8)",
    ));
    let state = with_input(state, "https://example.com/v");
    let (state, _) = update(state, Msg::PathChanged("/sdcard/Download".to_string()));
    let (_state, effects) = update(state, Msg::DownloadClicked { now_ms: 5 });

    assert_eq!(submitted_request(&effects).path, "");
}

#[test]
fn job_ids_never_repeat_within_a_session() {
    let state = with_input(AppState::new(), "a.example\nb.example");
    let (state, first) = update(state, Msg::DownloadClicked { now_ms: 42 });
    let first_ids = submitted_request(&first).job_ids.clone();
    let (state, _) = update(state, Msg::DownloadFinished(Err("boom".to_string())));
    let (_state, second) = update(state, Msg::DownloadClicked { now_ms: 42 });
    let second_ids = &submitted_request(&second).job_ids;

    for id in second_ids {
        assert!(!first_ids.contains(id), "{id} reused");
    }
    assert_eq!(second_ids[0].as_str(), "download_0_43");
}

#[test]
fn new_batch_discards_previous_cards_and_cancels_their_timers() {
    let state = with_input(AppState::new(), "a.example\nb.example");
    let (state, _) = update(state, Msg::DownloadClicked { now_ms: 10 });
    let (state, _) = update(
        state,
        Msg::DownloadCompleted {
            job_id: JobId::new(0, 10),
            title: None,
        },
    );
    let (state, _) = update(state, Msg::DownloadFinished(Err("x".to_string())));
    let state = with_input(state, "c.example");
    let (state, effects) = update(state, Msg::DownloadClicked { now_ms: 20 });

    assert_eq!(
        effects[0],
        Effect::CancelTimer {
            key: TimerKey::CardRemoval(JobId::new(0, 10))
        }
    );
    assert_eq!(state.cards().len(), 1);
    assert_eq!(state.active_downloads().len(), 1);
    assert!(state.card(&JobId::new(1, 10)).is_none());
}

#[test]
fn success_notifies_clears_input_and_reloads_history_later() {
    let state = with_input(AppState::new(), "a.example");
    let (state, _) = update(state, Msg::DownloadClicked { now_ms: 1 });
    let (state, effects) = update(
        state,
        Msg::DownloadFinished(Ok(DownloadOutcome {
            success: true,
            completed: 1,
            download_url: Some("/download_file?path=%2Ftmp%2Fa.mp4".to_string()),
            ..DownloadOutcome::default()
        })),
    );

    let view = state.view();
    assert!(view.submit_enabled);
    assert_eq!(view.url_input, "");
    assert_eq!(view.url_count, 0);
    assert_eq!(view.banners[0].title, "Downloads Complete!");
    assert_eq!(view.banners[0].body, "Successfully downloaded 1 file(s)");
    assert!(effects.contains(&Effect::FetchArtifact {
        url: "/download_file?path=%2Ftmp%2Fa.mp4".to_string()
    }));
    assert!(effects.contains(&Effect::ScheduleTimer {
        key: TimerKey::HistoryReload,
        delay: HISTORY_RELOAD_DELAY,
    }));

    let (_state, effects) = update(state, Msg::TimerFired(TimerKey::HistoryReload));
    assert_eq!(effects, vec![Effect::LoadHistory]);
}

#[test]
fn success_with_saved_path_reports_location() {
    let state = with_input(AppState::new(), "a.example");
    let (state, _) = update(state, Msg::DownloadClicked { now_ms: 1 });
    let (state, effects) = update(
        state,
        Msg::DownloadFinished(Ok(DownloadOutcome {
            success: true,
            completed: 2,
            saved_path: Some("/srv/media".to_string()),
            ..DownloadOutcome::default()
        })),
    );

    let bodies: Vec<_> = state.banners().iter().map(|b| b.body.as_str()).collect();
    assert_eq!(
        bodies,
        vec!["Successfully downloaded 2 file(s)", "Files saved to /srv/media"]
    );
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::FetchArtifact { .. })));
}

#[test]
fn failure_joins_item_errors() {
    let state = with_input(AppState::new(), "a.example");
    let (state, _) = update(state, Msg::DownloadClicked { now_ms: 1 });
    let (state, effects) = update(
        state,
        Msg::DownloadFinished(Ok(DownloadOutcome {
            success: false,
            errors: vec!["Unsupported URL".to_string(), "HTTP 403".to_string()],
            ..DownloadOutcome::default()
        })),
    );

    assert!(state.view().submit_enabled);
    assert_eq!(state.url_input(), "a.example");
    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: "Download failed: Unsupported URL, HTTP 403".to_string()
        }]
    );
}

#[test]
fn failure_without_details_falls_back() {
    let state = with_input(AppState::new(), "a.example");
    let (state, _) = update(state, Msg::DownloadClicked { now_ms: 1 });
    let (state, effects) = update(
        state,
        Msg::DownloadFinished(Ok(DownloadOutcome::default())),
    );
    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: "Download failed: Unknown error".to_string()
        }]
    );

    let (_state, effects) = update(
        state,
        Msg::DownloadFinished(Ok(DownloadOutcome {
            error: Some("Missing required parameters".to_string()),
            ..DownloadOutcome::default()
        })),
    );
    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: "Download failed: Missing required parameters".to_string()
        }]
    );
}

#[test]
fn transport_failure_reenables_submit() {
    init_logging();
    let state = with_input(AppState::new(), "a.example");
    let (state, _) = update(state, Msg::DownloadClicked { now_ms: 1 });
    let (state, effects) = update(
        state,
        Msg::DownloadFinished(Err("network error: connection reset".to_string())),
    );

    assert!(state.view().submit_enabled);
    assert_eq!(state.view().submit_label, "Start Download");
    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: "Download failed: network error: connection reset".to_string()
        }]
    );
}

#[test]
fn artifact_outcomes() {
    let (state, effects) = update(
        AppState::new(),
        Msg::ArtifactSaved(Ok("downloads/a.mp4".to_string())),
    );
    assert_eq!(state.banners()[0].body, "File saved to downloads/a.mp4");
    assert_eq!(effects.len(), 2);

    let (_state, effects) = update(state, Msg::ArtifactSaved(Err("http status 404".to_string())));
    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: "Could not fetch download: http status 404".to_string()
        }]
    );
}

#[test]
fn submit_is_ignored_while_a_batch_is_in_flight() {
    let state = with_input(AppState::new(), "a.example");
    let (state, _) = update(state, Msg::DownloadClicked { now_ms: 1 });
    let (state, effects) = update(state, Msg::DownloadClicked { now_ms: 2 });
    assert!(effects.is_empty());
    assert!(state.card(&JobId::new(0, 1)).is_some());
}
