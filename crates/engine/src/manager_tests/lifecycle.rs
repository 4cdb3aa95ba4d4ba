// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Initialization gate, orphan recovery, and configuration reloads.

use super::*;
use fj_config::AgentDef;
use fj_core::Job;
use fj_storage::JobStore;

#[tokio::test]
async fn calls_before_initialize_are_rejected() {
    let ctx = setup_uninitialized();
    let m = &ctx.manager;

    let trigger = m.trigger("worker", None, TriggerOptions::default()).await;
    assert!(matches!(trigger, Err(FleetError::InvalidState(_))));

    let cancel = m.cancel_job("job-1", CancelOptions::default()).await;
    assert!(matches!(cancel, Err(FleetError::InvalidState(_))));

    let fork = m.fork_job("job-1", ForkOptions::default()).await;
    assert!(matches!(fork, Err(FleetError::InvalidState(_))));

    let stream = m.stream_logs("job-1", StreamOptions::default());
    assert!(matches!(stream, Err(FleetError::InvalidState(_))));

    assert!(matches!(m.reload(), Err(FleetError::InvalidState(_))));
    assert_eq!(ctx.backend.call_count(), 0);
}

#[tokio::test]
async fn initialize_opens_the_gate_once() {
    let ctx = setup_uninitialized();
    assert!(!ctx.manager.is_initialized());

    ctx.manager.initialize().unwrap();
    assert!(ctx.manager.is_initialized());

    let again = ctx.manager.initialize();
    assert!(matches!(again, Err(FleetError::InvalidState(_))));
    assert!(ctx.manager.is_initialized());
}

#[tokio::test]
async fn failed_initialize_leaves_gate_closed() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    let manager = FleetManager::new(
        FleetDeps::new(fj_adapters::FakeBackend::new(), fj_core::FakeClock::new())
            .with_state_dir(dir.path()),
        missing,
    );

    assert!(matches!(manager.initialize(), Err(FleetError::Config(_))));
    assert!(!manager.is_initialized());
    assert!(!manager.status().initialized);
}

#[tokio::test]
async fn initialize_fails_jobs_left_running() {
    let ctx = setup_uninitialized();
    let jobs = JobStore::open(&ctx.state_dir).unwrap();
    jobs.save(&Job::builder().id("job-left").status(JobStatus::Running).build())
        .unwrap();
    jobs.save(&Job::builder().id("job-queued").status(JobStatus::Pending).build())
        .unwrap();
    jobs.save(
        &Job::builder()
            .id("job-done")
            .status(JobStatus::Completed)
            .build(),
    )
    .unwrap();
    let events = record_events(&ctx.manager);

    ctx.manager.initialize().unwrap();

    for id in ["job-left", "job-queued"] {
        let job = ctx.manager.get_job(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some(INTERRUPTED_ERROR));
        assert!(job.completed_at.is_some());
    }
    let done = ctx.manager.get_job("job-done").unwrap().unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(lifecycle_names(&events), vec!["job:failed", "job:failed"]);
}

#[tokio::test]
async fn apply_config_swaps_catalog_and_announces_it() {
    let ctx = setup();
    let events = record_events(&ctx.manager);

    let config = test_config().with_agent(AgentDef::new("scout"));
    let agents = ctx.manager.apply_config(config).unwrap();

    assert_eq!(agents, vec!["reviewer", "scout", "worker"]);
    assert!(ctx.manager.agent("scout").is_some());
    let recorded = events.lock().clone();
    assert_eq!(
        recorded,
        vec![FleetEvent::ConfigReloaded {
            agents: agents.clone()
        }]
    );

    let result = ctx
        .manager
        .trigger("scout", None, TriggerOptions::default())
        .await
        .unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn removed_agent_can_no_longer_be_triggered() {
    let ctx = setup();
    let mut config = test_config();
    config.remove_agent("reviewer");
    ctx.manager.apply_config(config).unwrap();

    let err = ctx
        .manager
        .trigger("reviewer", None, TriggerOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::AgentNotFound(name) if name == "reviewer"));
}

#[tokio::test]
async fn apply_config_rejects_invalid_config() {
    let ctx = setup();
    let mut zero_timeout = test_config();
    zero_timeout.fleet.cancel_timeout_ms = 0;
    let bad_name = test_config().with_agent(AgentDef::new("a/b"));

    for config in [zero_timeout, bad_name] {
        let err = ctx.manager.apply_config(config).unwrap_err();
        assert!(matches!(err, FleetError::Config(_)), "{err}");
    }
    assert_eq!(ctx.manager.config().fleet.cancel_timeout_ms, 200);
    assert_eq!(ctx.manager.status().agents, vec!["reviewer", "worker"]);
}

#[test]
fn initialize_rejects_invalid_inline_config() {
    let ctx = setup_with_config(test_config().with_agent(AgentDef::new("..")));
    assert!(matches!(ctx.manager.initialize(), Err(FleetError::Config(_))));
    assert!(!ctx.manager.is_initialized());
}

#[tokio::test]
async fn reload_rereads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    std::fs::write(&path, "[fleet]\nname = \"ops\"\n\n[agents.alpha]\n").unwrap();
    let manager = FleetManager::new(
        FleetDeps::new(fj_adapters::FakeBackend::new(), fj_core::FakeClock::new())
            .with_state_dir(dir.path().join("state")),
        path.clone(),
    );
    manager.initialize().unwrap();
    assert_eq!(manager.status().agents, vec!["alpha"]);

    std::fs::write(&path, "[fleet]\nname = \"ops\"\n\n[agents.alpha]\n\n[agents.beta]\n").unwrap();
    let agents = manager.reload().unwrap();

    assert_eq!(agents, vec!["alpha", "beta"]);
    assert_eq!(manager.config().fleet.name.as_deref(), Some("ops"));
}

#[tokio::test]
async fn reload_with_broken_file_keeps_current_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    std::fs::write(&path, "[agents.alpha]\n").unwrap();
    let manager = FleetManager::new(
        FleetDeps::new(fj_adapters::FakeBackend::new(), fj_core::FakeClock::new())
            .with_state_dir(dir.path().join("state")),
        path.clone(),
    );
    manager.initialize().unwrap();

    std::fs::write(&path, "[agents.alpha\n").unwrap();
    assert!(matches!(manager.reload(), Err(FleetError::Config(_))));
    assert_eq!(manager.status().agents, vec!["alpha"]);
}

#[tokio::test]
async fn status_reports_fleet_and_running_jobs() {
    let ctx = setup_uninitialized();
    let before = ctx.manager.status();
    assert!(!before.initialized);
    assert!(before.agents.is_empty());

    ctx.manager.initialize().unwrap();
    let (job_id, handle) = start_running(&ctx, FakeRun::until_cancelled()).await;

    let status = ctx.manager.status();
    assert!(status.initialized);
    assert_eq!(status.fleet_name.as_deref(), Some("test-fleet"));
    assert_eq!(status.agents, vec!["reviewer", "worker"]);
    assert_eq!(status.running, vec![job_id.clone()]);
    assert_eq!(ctx.manager.running_jobs().unwrap(), vec![job_id.clone()]);

    ctx.manager
        .cancel_job(job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();
    handle.await.unwrap().unwrap();
    assert!(ctx.manager.status().running.is_empty());
}

#[tokio::test]
async fn list_jobs_filters_by_agent_and_status() {
    let ctx = setup();
    ctx.backend.push_run(FakeRun::failure("boom"));
    ctx.manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    ctx.manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    ctx.manager
        .trigger("reviewer", None, TriggerOptions::default())
        .await
        .unwrap();

    let all = ctx.manager.list_jobs(&JobFilter::default()).unwrap();
    assert_eq!(all.len(), 3);

    let workers = ctx
        .manager
        .list_jobs(&JobFilter {
            agent_name: Some("worker".to_string()),
            ..JobFilter::default()
        })
        .unwrap();
    assert_eq!(workers.len(), 2);

    let failed = ctx
        .manager
        .list_jobs(&JobFilter {
            status: Some(JobStatus::Failed),
            ..JobFilter::default()
        })
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].agent_name, "worker");
}

#[tokio::test]
async fn failing_listener_does_not_disturb_jobs() {
    let ctx = setup();
    ctx.manager
        .events()
        .on("job:created", |_| Err("listener broke".into()));
    ctx.manager.events().on("job:started", |_| panic!("listener panicked"));

    let result = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn state_dir_falls_back_to_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.fleet.state_dir = Some(dir.path().join("from-config"));
    let manager = FleetManager::new(
        FleetDeps::new(fj_adapters::FakeBackend::new(), fj_core::FakeClock::new()),
        config,
    );

    manager.initialize().unwrap();
    manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    assert!(dir.path().join("from-config/jobs").is_dir());
}

#[tokio::test]
async fn session_can_be_cleared() {
    let ctx = setup();
    ctx.manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    assert!(ctx.manager.session("worker").unwrap().is_some());

    assert!(ctx.manager.clear_session("worker").unwrap());
    assert!(!ctx.manager.clear_session("worker").unwrap());

    let next = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    assert_eq!(next.session_source, SessionSource::Fresh);
}

#[test]
fn custom_config_is_used_verbatim() {
    let ctx = setup_with_config(test_config().with_agent(AgentDef::new("extra")));
    ctx.manager.initialize().unwrap();
    assert_eq!(ctx.manager.status().agents, vec!["extra", "reviewer", "worker"]);
}
