use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use paste_app::platform::effects::wire_request;
use paste_app::platform::events::{engine_event_to_msg, TimerRegistry};
use paste_core::{DownloadOutcome, DownloadRequest, Format, JobId, Msg, PathCheck, TimerKey};
use paste_engine::{
    CompletePayload, DownloadResponse, DownloadResult, EngineEvent, ErrorPayload, HistoryEntry,
    ItemError, PathValidation, ProgressPayload, PushEvent,
};
use pretty_assertions::assert_eq;

fn map(event: EngineEvent) -> Option<Msg> {
    engine_event_to_msg(event, &mut TimerRegistry::default())
}

#[test]
fn path_verdict_becomes_path_check() {
    assert_eq!(
        map(EngineEvent::PathValidated(Ok(PathValidation {
            valid: false,
            message: Some("No write permission".to_string()),
        }))),
        Some(Msg::PathValidated(Ok(PathCheck {
            valid: false,
            message: Some("No write permission".to_string()),
        })))
    );
}

#[test]
fn batch_response_becomes_outcome() {
    let response = DownloadResponse {
        success: false,
        results: vec![DownloadResult::default(), DownloadResult::default()],
        errors: vec![
            ItemError {
                url: Some("https://a".to_string()),
                error: Some("Unsupported URL".to_string()),
            },
            ItemError {
                url: Some("https://b".to_string()),
                error: None,
            },
        ],
        path: Some("/srv/media".to_string()),
        ..DownloadResponse::default()
    };

    assert_eq!(
        map(EngineEvent::DownloadSubmitted(Ok(response))),
        Some(Msg::DownloadFinished(Ok(DownloadOutcome {
            success: false,
            completed: 2,
            download_url: None,
            saved_path: Some("/srv/media".to_string()),
            errors: vec!["Unsupported URL".to_string()],
            error: None,
        })))
    );
}

#[test]
fn history_entries_become_records_with_parsed_timestamps() {
    let entry = HistoryEntry {
        id: 5,
        url: "https://example.com/v".to_string(),
        title: Some("V".to_string()),
        timestamp: Some("2024-03-09T14:05:00Z".to_string()),
        file_format: "mp4".to_string(),
        quality: Some("720p".to_string()),
        file_size: None,
        download_path: Some("/srv/media/V.mp4".to_string()),
        status: Some("completed".to_string()),
    };

    let Some(Msg::HistoryLoaded(Ok(records))) = map(EngineEvent::HistoryLoaded(Ok(vec![entry])))
    else {
        panic!("expected loaded history");
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 5);
    assert_eq!(
        records[0].timestamp,
        Some(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap())
    );
    assert_eq!(records[0].download_path.as_deref(), Some("/srv/media/V.mp4"));
}

#[test]
fn push_events_address_job_ids() {
    let progress = ProgressPayload {
        download_id: "download_1_99".to_string(),
        percent: Some("50.0%".to_string()),
        speed: None,
        eta: Some("00:10".to_string()),
        downloaded: None,
        total: None,
        status: None,
    };
    let Some(Msg::ProgressReceived(update)) =
        map(EngineEvent::Push(PushEvent::Progress(progress)))
    else {
        panic!("expected progress");
    };
    assert_eq!(update.job_id, JobId::from("download_1_99"));
    assert_eq!(update.eta.as_deref(), Some("00:10"));

    assert_eq!(
        map(EngineEvent::Push(PushEvent::Complete(CompletePayload {
            download_id: "download_0_99".to_string(),
            title: None,
            path: Some("/x".to_string()),
        }))),
        Some(Msg::DownloadCompleted {
            job_id: JobId::from("download_0_99"),
            title: None,
        })
    );
    assert_eq!(
        map(EngineEvent::Push(PushEvent::Error(ErrorPayload {
            download_id: "download_0_99".to_string(),
            error: Some("HTTP 403".to_string()),
        }))),
        Some(Msg::DownloadFailed {
            job_id: JobId::from("download_0_99"),
            error: Some("HTTP 403".to_string()),
        })
    );
}

#[test]
fn saved_artifact_reports_its_path() {
    assert_eq!(
        map(EngineEvent::ArtifactSaved(Ok(PathBuf::from("downloads/a.mp3")))),
        Some(Msg::ArtifactSaved(Ok("downloads/a.mp3".to_string())))
    );
}

#[test]
fn timers_resolve_once_and_ignore_replaced_ids() {
    let mut timers = TimerRegistry::default();
    let key = TimerKey::CardRemoval(JobId::from("download_0_1"));

    let (first, replaced) = timers.schedule(key.clone());
    assert_eq!(replaced, None);
    let (second, replaced) = timers.schedule(key.clone());
    assert_eq!(replaced, Some(first));
    assert_eq!(timers.len(), 1);

    assert_eq!(engine_event_to_msg(EngineEvent::TimerElapsed(first), &mut timers), None);
    assert_eq!(
        engine_event_to_msg(EngineEvent::TimerElapsed(second), &mut timers),
        Some(Msg::TimerFired(key))
    );
    assert!(timers.is_empty());
    assert_eq!(engine_event_to_msg(EngineEvent::TimerElapsed(second), &mut timers), None);
}

#[test]
fn cancelled_timer_never_resolves() {
    let mut timers = TimerRegistry::default();
    let (id, _) = timers.schedule(TimerKey::HistoryReload);
    assert_eq!(timers.cancel(&TimerKey::HistoryReload), Some(id));
    assert_eq!(timers.cancel(&TimerKey::HistoryReload), None);
    assert_eq!(timers.elapsed(id), None);
}

#[test]
fn core_request_goes_out_with_job_ids() {
    let request = DownloadRequest {
        urls: vec!["https://a".to_string(), "https://b".to_string()],
        format: Format::Wav,
        quality: "256kbps".to_string(),
        path: String::new(),
        job_ids: vec![JobId::new(0, 42), JobId::new(1, 42)],
    };

    let wire = wire_request(request);
    assert_eq!(wire.format, "wav");
    assert_eq!(wire.download_ids, vec!["download_0_42", "download_1_42"]);
}
