//! Session resume specs.

use crate::prelude::*;
use fj_core::{SessionId, SESSION_TTL};
use fj_engine::{SessionSource, TriggerOptions};
use std::time::Duration;

#[tokio::test]
async fn session_used_within_a_day_is_continued() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let first = trigger(&manager, "builder").await;
    fleet.clock.advance(Duration::from_secs(23 * 60 * 60));

    let second = trigger(&manager, "builder").await;

    assert_eq!(second.session_source, SessionSource::Resumed);
    assert_eq!(fleet.backend.last_call().unwrap().session_id, first.session_id);
}

#[tokio::test]
async fn session_older_than_a_day_is_ignored_and_run_still_succeeds() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    trigger(&manager, "builder").await;
    fleet.clock.advance(SESSION_TTL + Duration::from_secs(60));

    let second = trigger(&manager, "builder").await;

    assert!(second.success);
    assert_eq!(second.session_source, SessionSource::Expired);
    assert_eq!(fleet.backend.last_call().unwrap().session_id, None);
}

#[tokio::test]
async fn explicit_resume_beats_a_valid_stored_session() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let first = trigger(&manager, "builder").await;

    let second = manager
        .trigger(
            "builder",
            None,
            TriggerOptions::default().resume("sess-operator"),
        )
        .await
        .unwrap();

    assert_eq!(second.session_source, SessionSource::Explicit);
    let sent = fleet.backend.last_call().unwrap().session_id;
    assert_eq!(sent, Some(SessionId::new("sess-operator")));
    assert_ne!(sent, first.session_id);
}

#[tokio::test]
async fn session_record_is_written_to_disk() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let result = trigger(&manager, "auditor").await;

    let path = fleet.state_dir().join("sessions/auditor.json");
    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(record["agent_name"], "auditor");
    assert_eq!(
        record["session_id"],
        result.session_id.unwrap().as_str()
    );
    assert_eq!(record["job_count"], 1);
    assert_eq!(record["mode"], "autonomous");
    assert!(record["created_at"].is_string());
    assert!(record["last_used_at"].is_string());
}
