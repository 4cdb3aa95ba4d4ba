//! Log streaming specs.

use crate::prelude::*;
use fj_adapters::FakeRun;
use fj_engine::{StreamOptions, TriggerOptions};
use std::sync::Arc;
use tokio::sync::Notify;

#[tokio::test]
async fn live_only_stream_on_an_idle_job_is_iterable() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let gate = Arc::new(Notify::new());
    fleet.backend.push_run(FakeRun::gated(Arc::clone(&gate)));
    let running = manager.clone();
    let handle = tokio::spawn(async move {
        running
            .trigger("builder", None, TriggerOptions::default())
            .await
    });
    assert!(wait_for(SPEC_WAIT_MAX, || !manager.running_jobs().unwrap().is_empty()).await);
    let job_id = manager.running_jobs().unwrap().remove(0);

    let mut stream = manager
        .stream_logs(job_id.as_str(), StreamOptions::live_only())
        .unwrap();
    let idle = tokio::time::timeout(std::time::Duration::from_millis(20), stream.next()).await;
    assert!(idle.is_err(), "no output yet, the stream should be waiting");

    gate.notify_one();
    handle.await.unwrap().unwrap();
    assert!(tokio::time::timeout(SPEC_WAIT_MAX, stream.next())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn history_survives_a_restart() {
    let fleet = Fleet::new();
    fleet
        .backend
        .push_run(FakeRun::success().output(["step one", "step two"]));
    let job_id = trigger(&fleet.started(), "builder").await.job_id;

    let restarted = fleet.started();
    let lines = restarted
        .stream_logs(job_id.as_str(), StreamOptions::default())
        .unwrap()
        .collect_lines()
        .await;

    let texts: Vec<_> = lines.into_iter().map(|l| l.text).collect();
    assert_eq!(texts, vec!["step one", "step two"]);
}
