// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancelling jobs: graceful, forced, and already stopped.

use super::*;
use fj_core::Job;
use fj_storage::JobStore;

#[tokio::test]
async fn unknown_job_is_not_found() {
    let ctx = setup();

    let err = ctx
        .manager
        .cancel_job("job-404", CancelOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, FleetError::JobNotFound(id) if id == "job-404"));
}

#[tokio::test]
async fn finished_job_is_already_stopped() {
    let ctx = setup();
    let done = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();
    let events = record_events(&ctx.manager);

    let first = ctx
        .manager
        .cancel_job(done.job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();
    let second = ctx
        .manager
        .cancel_job(done.job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();

    assert!(first.success);
    assert_eq!(first.termination_type, TerminationType::AlreadyStopped);
    assert_eq!(first.canceled_at, done.completed_at);
    assert_eq!(first, second);
    assert!(events.lock().is_empty());

    let job = ctx.manager.get_job(done.job_id.as_str()).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn running_job_stops_gracefully() {
    let ctx = setup();
    let (job_id, handle) = start_running(&ctx, FakeRun::until_cancelled()).await;
    let events = record_events(&ctx.manager);

    let result = ctx
        .manager
        .cancel_job(job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.termination_type, TerminationType::Cancelled);
    assert_eq!(result.canceled_at, Some(ctx.clock.utc_now()));

    let triggered = handle.await.unwrap().unwrap();
    assert!(!triggered.success);
    assert_eq!(triggered.status, JobStatus::Cancelled);

    let job = ctx.manager.get_job(job_id.as_str()).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(job.canceled_at.is_some());
    assert!(ctx.manager.running_jobs().unwrap().is_empty());

    let recorded = events.lock().clone();
    assert_eq!(
        recorded,
        vec![FleetEvent::JobCancelled {
            job_id: job_id.clone(),
            termination_type: TerminationType::Cancelled,
            canceled_at: ctx.clock.utc_now(),
        }]
    );
}

#[tokio::test]
async fn job_ignoring_cancel_is_forced_after_timeout() {
    let ctx = setup();
    let (job_id, handle) = start_running(&ctx, FakeRun::stubborn()).await;
    let (_, mut rx) = ctx.manager.events().channel();

    let result = tokio::time::timeout(
        WAIT,
        ctx.manager
            .cancel_job(job_id.as_str(), CancelOptions::timeout(Duration::from_millis(30))),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(result.success);
    assert_eq!(result.termination_type, TerminationType::Forced);

    let event = wait_for_event(&mut rx, "job:cancelled").await;
    assert!(matches!(
        event,
        FleetEvent::JobCancelled {
            termination_type: TerminationType::Forced,
            ..
        }
    ));

    let triggered = handle.await.unwrap().unwrap();
    assert_eq!(triggered.status, JobStatus::Cancelled);
    let job = ctx.manager.get_job(job_id.as_str()).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(ctx.manager.running_jobs().unwrap().is_empty());
}

#[tokio::test]
async fn default_timeout_comes_from_config() {
    let ctx = setup();
    let (job_id, handle) = start_running(&ctx, FakeRun::stubborn()).await;

    let started = std::time::Instant::now();
    let result = ctx
        .manager
        .cancel_job(job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();

    assert_eq!(result.termination_type, TerminationType::Forced);
    assert!(started.elapsed() >= Duration::from_millis(200));
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn forced_job_does_not_update_session() {
    let ctx = setup();
    let (job_id, handle) = start_running(&ctx, FakeRun::stubborn()).await;

    ctx.manager
        .cancel_job(job_id.as_str(), CancelOptions::timeout(Duration::from_millis(10)))
        .await
        .unwrap();
    handle.await.unwrap().unwrap();

    assert!(ctx.manager.session("worker").unwrap().is_none());
}

#[tokio::test]
async fn cancel_is_idempotent_after_stop() {
    let ctx = setup();
    let (job_id, handle) = start_running(&ctx, FakeRun::until_cancelled()).await;

    let first = ctx
        .manager
        .cancel_job(job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();
    handle.await.unwrap().unwrap();
    let second = ctx
        .manager
        .cancel_job(job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();

    assert_eq!(first.termination_type, TerminationType::Cancelled);
    assert_eq!(second.termination_type, TerminationType::AlreadyStopped);
    assert_eq!(second.canceled_at, first.canceled_at);
}

#[tokio::test]
async fn concurrent_cancels_agree() {
    let ctx = setup();
    let (job_id, handle) = start_running(&ctx, FakeRun::until_cancelled()).await;

    let (a, b) = tokio::join!(
        ctx.manager.cancel_job(job_id.as_str(), CancelOptions::default()),
        ctx.manager.cancel_job(job_id.as_str(), CancelOptions::default()),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(a.success && b.success);
    for result in [&a, &b] {
        assert!(matches!(
            result.termination_type,
            TerminationType::Cancelled | TerminationType::AlreadyStopped
        ));
    }
    assert_eq!(a.canceled_at, b.canceled_at);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn job_without_executor_is_cancelled_in_place() {
    let ctx = setup();
    let jobs = JobStore::open(&ctx.state_dir).unwrap();
    jobs.save(&Job::builder().id("job-stray").status(JobStatus::Running).build())
        .unwrap();
    let events = record_events(&ctx.manager);

    let result = ctx
        .manager
        .cancel_job("job-stray", CancelOptions::default())
        .await
        .unwrap();

    assert_eq!(result.termination_type, TerminationType::Cancelled);
    let job = ctx.manager.get_job("job-stray").unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(lifecycle_names(&events), vec!["job:cancelled"]);
}

#[tokio::test]
async fn cancel_all_stops_every_running_job() {
    let ctx = setup();
    let (first, first_handle) = start_running(&ctx, FakeRun::until_cancelled()).await;
    let (second, second_handle) = start_running(&ctx, FakeRun::stubborn()).await;

    let results = ctx
        .manager
        .cancel_all(CancelOptions::timeout(Duration::from_millis(30)))
        .await
        .unwrap();

    let summary: Vec<_> = results
        .iter()
        .map(|r| (r.job_id.clone(), r.termination_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            (first, TerminationType::Cancelled),
            (second, TerminationType::Forced),
        ]
    );
    first_handle.await.unwrap().unwrap();
    second_handle.await.unwrap().unwrap();
    assert!(ctx.manager.running_jobs().unwrap().is_empty());
}

#[tokio::test]
async fn backend_panicking_on_cancel_still_cancels() {
    let ctx = setup();
    let (job_id, handle) = start_running(
        &ctx,
        FakeRun::success().behavior(FakeBehavior::PanicOnCancel),
    )
    .await;

    let result = tokio::time::timeout(
        WAIT,
        ctx.manager
            .cancel_job(job_id.as_str(), CancelOptions::timeout(Duration::from_secs(1))),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(result.termination_type, TerminationType::Cancelled);
    let triggered = tokio::time::timeout(WAIT, handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(triggered.status, JobStatus::Cancelled);
    let job = ctx.manager.get_job(job_id.as_str()).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(ctx.manager.running_jobs().unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_cancels_both_report_a_forced_stop() {
    let ctx = setup();
    let (job_id, handle) = start_running(&ctx, FakeRun::stubborn()).await;

    let (short, long) = tokio::join!(
        ctx.manager
            .cancel_job(job_id.as_str(), CancelOptions::timeout(Duration::from_millis(30))),
        ctx.manager
            .cancel_job(job_id.as_str(), CancelOptions::timeout(WAIT)),
    );

    assert_eq!(short.unwrap().termination_type, TerminationType::Forced);
    assert_eq!(long.unwrap().termination_type, TerminationType::Forced);
    handle.await.unwrap().unwrap();
}
