// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming job logs.

use super::*;
use fj_core::LogLine;

fn texts(lines: &[LogLine]) -> Vec<&str> {
    lines.iter().map(|l| l.text.as_str()).collect()
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let ctx = setup();

    let err = ctx
        .manager
        .stream_logs("job-404", StreamOptions::default())
        .err()
        .unwrap();

    assert!(matches!(err, FleetError::JobNotFound(_)));
}

#[tokio::test]
async fn finished_job_replays_history() {
    let ctx = setup();
    ctx.backend.push_run(FakeRun::success().output(["one", "two", "three"]));
    let done = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    let stream = ctx
        .manager
        .stream_logs(done.job_id.as_str(), StreamOptions::default())
        .unwrap();
    assert_eq!(stream.job_id(), &done.job_id);

    let lines = stream.collect_lines().await;
    assert_eq!(texts(&lines), vec!["one", "two", "three"]);
}

#[tokio::test]
async fn live_only_on_finished_job_is_empty() {
    let ctx = setup();
    ctx.backend.push_run(FakeRun::success().output(["one"]));
    let done = ctx
        .manager
        .trigger("worker", None, TriggerOptions::default())
        .await
        .unwrap();

    let lines = ctx
        .manager
        .stream_logs(done.job_id.as_str(), StreamOptions::live_only())
        .unwrap()
        .collect_lines()
        .await;

    assert!(lines.is_empty());
}

#[tokio::test]
async fn running_job_streams_until_it_finishes() {
    let ctx = setup();
    let gate = Arc::new(Notify::new());
    let run = FakeRun::gated(Arc::clone(&gate)).output(["planning", "editing"]);
    let (job_id, handle) = start_running(&ctx, run).await;

    let stream = ctx
        .manager
        .stream_logs(job_id.as_str(), StreamOptions::default())
        .unwrap();
    let reader = tokio::spawn(stream.collect_lines());

    gate.notify_one();
    let result = handle.await.unwrap().unwrap();
    assert!(result.success);

    let lines = tokio::time::timeout(WAIT, reader).await.unwrap().unwrap();
    assert_eq!(texts(&lines), vec!["planning", "editing"]);
}

#[tokio::test]
async fn live_only_skips_lines_written_before_subscribing() {
    let ctx = setup();
    let gate = Arc::new(Notify::new());
    let run = FakeRun::gated(Arc::clone(&gate)).output(["early"]);
    let (_, mut rx) = ctx.manager.events().channel();
    ctx.backend.push_run(run);
    let handle = spawn_trigger(&ctx.manager, "worker");
    let output = wait_for_event(&mut rx, "job:output").await;
    let job_id = output.job_id().cloned().unwrap();

    let stream = ctx
        .manager
        .stream_logs(job_id.as_str(), StreamOptions::live_only())
        .unwrap();
    gate.notify_one();
    handle.await.unwrap().unwrap();

    let lines = tokio::time::timeout(WAIT, stream.collect_lines())
        .await
        .unwrap();
    assert!(lines.is_empty());
}

#[tokio::test]
async fn stream_ends_when_job_is_cancelled() {
    let ctx = setup();
    let run = FakeRun::until_cancelled().output(["working"]);
    let (job_id, handle) = start_running(&ctx, run).await;
    let stream = ctx
        .manager
        .stream_logs(job_id.as_str(), StreamOptions::default())
        .unwrap();
    let reader = tokio::spawn(stream.collect_lines());

    ctx.manager
        .cancel_job(job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();
    handle.await.unwrap().unwrap();

    let lines = tokio::time::timeout(WAIT, reader).await.unwrap().unwrap();
    assert_eq!(texts(&lines), vec!["working"]);
}

#[tokio::test]
async fn dropping_a_stream_leaves_the_job_alone() {
    let ctx = setup();
    let gate = Arc::new(Notify::new());
    let (job_id, handle) = start_running(&ctx, FakeRun::gated(Arc::clone(&gate))).await;

    let stream = ctx
        .manager
        .stream_logs(job_id.as_str(), StreamOptions::default())
        .unwrap();
    drop(stream);

    gate.notify_one();
    let result = handle.await.unwrap().unwrap();
    assert!(result.success);
}
