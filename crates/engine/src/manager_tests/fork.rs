// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forking jobs.

use super::*;
use fj_core::SessionId;

#[tokio::test]
async fn missing_source_is_a_fork_error() {
    let ctx = setup();

    let err = ctx
        .manager
        .fork_job("job-404", ForkOptions::default())
        .await
        .unwrap_err();

    match err {
        FleetError::JobFork { job_id, reason } => {
            assert_eq!(job_id, "job-404");
            assert_eq!(reason, ForkFailure::SourceMissing);
        }
        other => panic!("expected JobFork, got {other:?}"),
    }
    assert_eq!(ctx.backend.call_count(), 0);
}

#[tokio::test]
async fn fork_inherits_prompt_and_session() {
    let ctx = setup();
    let source = ctx
        .manager
        .trigger(
            "worker",
            None,
            TriggerOptions::default().prompt("summarize the incident"),
        )
        .await
        .unwrap();

    let fork = ctx
        .manager
        .fork_job(source.job_id.as_str(), ForkOptions::default())
        .await
        .unwrap();

    assert!(fork.success);
    assert_ne!(fork.job_id, source.job_id);
    assert_eq!(fork.forked_from_job_id, source.job_id);
    assert_eq!(fork.agent_name, "worker");
    assert_eq!(fork.prompt, "summarize the incident");
    assert_eq!(fork.session_id, source.session_id);
    assert_eq!(fork.session_source, SessionSource::Inherited);

    let call = ctx.backend.last_call().unwrap();
    assert_eq!(call.prompt, "summarize the incident");
    assert_eq!(call.session_id, source.session_id);

    let job = ctx.manager.get_job(fork.job_id.as_str()).unwrap().unwrap();
    assert_eq!(job.forked_from, Some(source.job_id.clone()));
    assert_eq!(job.trigger, TriggerKind::Fork);
}

#[tokio::test]
async fn fork_overrides_prompt_and_session() {
    let ctx = setup();
    let source = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    let fork = ctx
        .manager
        .fork_job(
            source.job_id.as_str(),
            ForkOptions::default()
                .prompt("try another approach")
                .session("sess-branch"),
        )
        .await
        .unwrap();

    assert_eq!(fork.prompt, "try another approach");
    assert_eq!(fork.session_source, SessionSource::Explicit);
    let call = ctx.backend.last_call().unwrap();
    assert_eq!(call.session_id, Some(SessionId::new("sess-branch")));
}

#[tokio::test]
async fn fork_of_agent_removed_from_config_fails() {
    let ctx = setup();
    let source = ctx
        .manager
        .trigger("reviewer", None, TriggerOptions::default())
        .await
        .unwrap();
    let mut config = test_config();
    config.remove_agent("reviewer");
    ctx.manager.apply_config(config).unwrap();

    let err = ctx
        .manager
        .fork_job(source.job_id.as_str(), ForkOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FleetError::JobFork {
            reason: ForkFailure::AgentRemoved(ref agent),
            ..
        } if agent == "reviewer"
    ));
    assert_eq!(ctx.backend.call_count(), 1);
}

#[tokio::test]
async fn failed_and_cancelled_jobs_can_be_forked() {
    let ctx = setup();
    ctx.backend.push_run(FakeRun::failure("flaky"));
    let failed = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    assert_eq!(failed.status, JobStatus::Failed);

    let retry = ctx
        .manager
        .fork_job(failed.job_id.as_str(), ForkOptions::default())
        .await
        .unwrap();

    assert!(retry.success);
    assert_eq!(retry.forked_from_job_id, failed.job_id);
    // The source never had a session, so neither does the fork's request
    assert_eq!(ctx.backend.last_call().unwrap().session_id, None);
}

#[tokio::test]
async fn running_job_can_be_forked() {
    let ctx = setup();
    let gate = Arc::new(Notify::new());
    let (source_id, source_handle) = start_running(&ctx, FakeRun::gated(Arc::clone(&gate))).await;

    let fork = ctx
        .manager
        .fork_job(source_id.as_str(), ForkOptions::default())
        .await
        .unwrap();
    assert!(fork.success);
    assert_eq!(fork.forked_from_job_id, source_id);
    assert!(ctx.manager.running_jobs().unwrap().contains(&source_id));

    gate.notify_one();
    let source = source_handle.await.unwrap().unwrap();
    assert!(source.success);
}

#[tokio::test]
async fn fork_announces_itself_after_creation() {
    let ctx = setup();
    let source = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    let events = record_events(&ctx.manager);

    let fork = ctx
        .manager
        .fork_job(source.job_id.as_str(), ForkOptions::default())
        .await
        .unwrap();

    assert_eq!(
        lifecycle_names(&events),
        vec!["job:created", "job:forked", "job:started", "job:completed"]
    );
    let forked = events
        .lock()
        .iter()
        .find_map(|e| match e {
            FleetEvent::JobForked {
                job,
                original_job,
                agent_name,
            } => Some((job.id.clone(), original_job.id.clone(), agent_name.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(forked, (fork.job_id, source.job_id, "worker".to_string()));
}

#[tokio::test]
async fn fork_updates_the_agent_session_like_a_trigger() {
    let ctx = setup();
    let source = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    ctx.manager
        .fork_job(source.job_id.as_str(), ForkOptions::default())
        .await
        .unwrap();

    let record = ctx.manager.session("worker").unwrap().unwrap();
    assert_eq!(record.job_count, 2);
}
