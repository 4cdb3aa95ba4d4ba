// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Triggering jobs: prompts, sessions, outcomes, and events.

use super::*;
use fj_core::{LogKind, SessionId};

#[tokio::test]
async fn unknown_agent_is_rejected_without_a_job() {
    let ctx = setup();

    let err = ctx
        .manager
        .trigger("ghost", None, TriggerOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, FleetError::AgentNotFound(name) if name == "ghost"));
    assert_eq!(ctx.backend.call_count(), 0);
    assert!(ctx.manager.list_jobs(&JobFilter::default()).unwrap().is_empty());
}

#[tokio::test]
async fn successful_run_completes_and_persists() {
    let ctx = setup();

    let result = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.agent_name, "worker");
    assert_eq!(result.prompt, "check the build");
    assert_eq!(result.session_source, SessionSource::Fresh);
    assert_eq!(result.session_id, Some(SessionId::new("fake-session-1")));
    assert!(result.error.is_none());

    let stored = ctx.manager.get_job(result.job_id.as_str()).unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.completed_at, result.completed_at);
    assert_eq!(stored.trigger, TriggerKind::Manual);
    assert!(ctx.manager.running_jobs().unwrap().is_empty());
}

#[tokio::test]
async fn events_follow_the_job_lifecycle() {
    let ctx = setup();
    let events = record_events(&ctx.manager);

    ctx.manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    assert_eq!(
        lifecycle_names(&events),
        vec!["job:created", "job:started", "job:completed"]
    );
}

#[tokio::test]
async fn failed_run_is_a_result_not_an_error() {
    let ctx = setup();
    ctx.backend.push_run(FakeRun::failure("model overloaded"));
    let events = record_events(&ctx.manager);

    let result = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.status, JobStatus::Failed);
    assert!(result.error.unwrap().contains("model overloaded"));
    assert_eq!(
        lifecycle_names(&events),
        vec!["job:created", "job:started", "job:failed"]
    );
    // A failed job never establishes a session
    assert!(ctx.manager.session("worker").unwrap().is_none());
}

#[tokio::test]
async fn output_is_logged_and_published() {
    let ctx = setup();
    ctx.backend
        .push_run(FakeRun::success().output(["reading files", "all green"]));
    let events = record_events(&ctx.manager);

    let result = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    let lines = ctx
        .manager
        .stream_logs(result.job_id.as_str(), StreamOptions::default())
        .unwrap()
        .collect_lines()
        .await;
    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["reading files", "all green"]);
    assert!(lines.iter().all(|l| l.kind == LogKind::Assistant));
    assert_eq!(lines[1].seq, 1);

    let published: Vec<String> = events
        .lock()
        .iter()
        .filter_map(|e| match e {
            FleetEvent::JobOutput { line, .. } => Some(line.text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(published, vec!["reading files", "all green"]);
}

#[yare::parameterized(
    agent_default   = { None,            None,                "check the build" },
    schedule_prompt = { None,            Some("nightly run"), "nightly run" },
    explicit_wins   = { Some("do it"),   Some("nightly run"), "do it" },
)]
#[test_macro(tokio::test)]
async fn prompt_resolution(explicit: Option<&str>, schedule_prompt: Option<&str>, expected: &str) {
    let ctx = setup();
    let schedule = schedule_prompt.map(|p| ScheduleContext::new("nightly").with_prompt(p));
    let options = TriggerOptions {
        prompt: explicit.map(str::to_string),
        ..TriggerOptions::default()
    };

    let result = ctx.manager.trigger("worker", schedule, options).await.unwrap();

    assert_eq!(result.prompt, expected);
    assert_eq!(ctx.backend.last_call().unwrap().prompt, expected);
}

#[tokio::test]
async fn agent_without_prompt_uses_builtin_default() {
    let ctx = setup();

    let result = ctx
        .manager
        .trigger("reviewer", None, TriggerOptions::default())
        .await
        .unwrap();

    assert_eq!(result.prompt, fj_config::DEFAULT_PROMPT);
}

#[tokio::test]
async fn schedule_provenance_is_recorded() {
    let ctx = setup();

    let result = ctx
        .manager
        .trigger(
            "worker",
            Some(ScheduleContext::new("hourly")),
            TriggerOptions::default(),
        )
        .await
        .unwrap();

    let job = ctx.manager.get_job(result.job_id.as_str()).unwrap().unwrap();
    assert_eq!(job.trigger, TriggerKind::Schedule);
    assert_eq!(job.schedule.as_deref(), Some("hourly"));
    assert_eq!(job.prompt, "check the build");
}

#[tokio::test]
async fn second_trigger_resumes_the_session() {
    let ctx = setup();
    let first = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    ctx.clock.advance(Duration::from_secs(60 * 60));

    let second = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    assert_eq!(second.session_source, SessionSource::Resumed);
    assert_eq!(second.session_id, first.session_id);
    assert_eq!(ctx.backend.last_call().unwrap().session_id, first.session_id);

    let record = ctx.manager.session("worker").unwrap().unwrap();
    assert_eq!(record.job_count, 2);
    assert_eq!(Some(record.session_id), first.session_id);
    assert_eq!(record.last_used_at, ctx.clock.utc_now());
}

#[tokio::test]
async fn sessions_are_per_agent() {
    let ctx = setup();
    ctx.manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    let reviewer = ctx
        .manager
        .trigger("reviewer", None, TriggerOptions::default())
        .await
        .unwrap();

    assert_eq!(reviewer.session_source, SessionSource::Fresh);
    assert_eq!(ctx.backend.last_call().unwrap().session_id, None);
}

#[tokio::test]
async fn stale_session_starts_fresh() {
    let ctx = setup();
    let first = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    ctx.clock.advance(SESSION_TTL);

    let second = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    assert_eq!(second.session_source, SessionSource::Expired);
    assert_eq!(ctx.backend.last_call().unwrap().session_id, None);
    assert_ne!(second.session_id, first.session_id);

    // The new session replaces the stale one
    let record = ctx.manager.session("worker").unwrap().unwrap();
    assert_eq!(record.session_id, second.session_id.unwrap());
}

#[tokio::test]
async fn session_just_inside_window_is_resumed() {
    let ctx = setup();
    ctx.manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    ctx.clock.advance(SESSION_TTL - Duration::from_secs(1));

    let second = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    assert_eq!(second.session_source, SessionSource::Resumed);
}

#[tokio::test]
async fn explicit_resume_overrides_stored_session() {
    let ctx = setup();
    ctx.manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    let result = ctx
        .manager
        .trigger(
            "worker",
            None,
            TriggerOptions::default().resume("sess-pinned"),
        )
        .await
        .unwrap();

    assert_eq!(result.session_source, SessionSource::Explicit);
    assert_eq!(
        ctx.backend.last_call().unwrap().session_id,
        Some(SessionId::new("sess-pinned"))
    );
    let record = ctx.manager.session("worker").unwrap().unwrap();
    assert_eq!(record.session_id, "sess-pinned");
}

#[tokio::test]
async fn backend_reported_session_replaces_the_stored_one() {
    let ctx = setup();
    ctx.manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    ctx.backend.push_run(FakeRun::success().session("sess-rotated"));

    let result = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    assert_eq!(result.session_id, Some(SessionId::new("sess-rotated")));
    let record = ctx.manager.session("worker").unwrap().unwrap();
    assert_eq!(record.session_id, "sess-rotated");
    assert_eq!(record.created_at, ctx.clock.utc_now());
}

#[tokio::test]
async fn concurrent_triggers_each_get_a_job() {
    let ctx = setup();
    ctx.backend
        .set_default_run(FakeRun::success().behavior(FakeBehavior::Delay(Duration::from_millis(20))));

    let handles: Vec<_> = (0..4).map(|_| spawn_trigger(&ctx.manager, "worker")).collect();
    let mut ids = Vec::new();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert!(result.success);
        ids.push(result.job_id);
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 4);
    assert_eq!(ctx.backend.call_count(), 4);
    let record = ctx.manager.session("worker").unwrap().unwrap();
    assert_eq!(record.job_count, 4);
}

#[tokio::test]
async fn panicking_backend_fails_the_job() {
    let ctx = setup();
    ctx.backend.push_run(FakeRun::panicking());
    let events = record_events(&ctx.manager);

    let result = tokio::time::timeout(
        WAIT,
        ctx.manager.trigger("worker", None, TriggerOptions::default()),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(!result.success);
    assert_eq!(result.status, JobStatus::Failed);
    assert!(result.error.unwrap().contains("executor stopped"));

    let stored = ctx.manager.get_job(result.job_id.as_str()).unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(ctx.manager.running_jobs().unwrap().is_empty());
    assert!(ctx.manager.session("worker").unwrap().is_none());
    assert_eq!(
        lifecycle_names(&events),
        vec!["job:created", "job:started", "job:failed"]
    );
}

#[tokio::test]
async fn id_of_a_stored_job_is_redrawn() {
    let ctx = setup_with(
        test_config(),
        ScriptedIds::new(["job-dup", "job-dup", "job-dup"]),
    );
    ctx.manager.initialize().unwrap();
    ctx.backend.push_run(FakeRun::success().output(["first"]));
    ctx.backend.push_run(FakeRun::failure("boom").output(["second"]));

    let first = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default().prompt("A"))
        .await
        .unwrap();
    let second = ctx
        .manager
        .trigger("reviewer", None, TriggerOptions::default().prompt("B"))
        .await
        .unwrap();

    assert_eq!(first.job_id, "job-dup");
    assert_eq!(second.job_id, "job-1");

    let kept = ctx.manager.get_job("job-dup").unwrap().unwrap();
    assert_eq!(kept.agent_name, "worker");
    assert_eq!(kept.prompt, "A");
    assert_eq!(kept.status, JobStatus::Completed);
    assert_eq!(ctx.manager.list_jobs(&JobFilter::default()).unwrap().len(), 2);

    for (job_id, expected) in [("job-dup", "first"), ("job-1", "second")] {
        let lines = ctx
            .manager
            .stream_logs(job_id, StreamOptions::default())
            .unwrap()
            .collect_lines()
            .await;
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec![expected]);
    }
}

#[tokio::test]
async fn id_of_a_running_job_is_redrawn() {
    let ctx = setup_with(test_config(), ScriptedIds::new(["job-dup", "job-dup"]));
    ctx.manager.initialize().unwrap();
    let (running, handle) = start_running(&ctx, FakeRun::until_cancelled()).await;

    let second = ctx
        .manager
        .trigger("reviewer", None, TriggerOptions::default())
        .await
        .unwrap();

    assert_eq!(running, "job-dup");
    assert_eq!(second.job_id, "job-1");
    assert_eq!(ctx.manager.running_jobs().unwrap(), vec![running.clone()]);

    ctx.manager
        .cancel_job(running.as_str(), CancelOptions::default())
        .await
        .unwrap();
    let first = handle.await.unwrap().unwrap();
    assert_eq!(first.agent_name, "worker");
    assert_eq!(first.status, JobStatus::Cancelled);
}
