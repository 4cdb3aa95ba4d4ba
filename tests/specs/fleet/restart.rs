//! Restart and persistence specs.

use crate::prelude::*;
use fj_adapters::FakeRun;
use fj_core::{FleetEvent, JobStatus};
use fj_engine::{TriggerOptions, INTERRUPTED_ERROR};

#[tokio::test]
async fn jobs_persist_across_managers() {
    let fleet = Fleet::new();
    let first = trigger(&fleet.started(), "builder").await;

    let restarted = fleet.started();
    let job = restarted.get_job(first.job_id.as_str()).unwrap().unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.prompt, first.prompt);
    // The stored session is picked up by the new process
    let second = trigger(&restarted, "builder").await;
    assert_eq!(second.session_id, first.session_id);
}

#[tokio::test]
async fn job_abandoned_by_a_dead_process_is_failed_on_startup() {
    let fleet = Fleet::new();
    let crashed = fleet.started();
    fleet.backend.push_run(FakeRun::stubborn());
    let running = crashed.clone();
    let handle = tokio::spawn(async move {
        running
            .trigger("builder", None, TriggerOptions::default())
            .await
    });
    assert!(wait_for(SPEC_WAIT_MAX, || !crashed.running_jobs().unwrap().is_empty()).await);
    let job_id = crashed.running_jobs().unwrap().remove(0);
    let persisted_running = || {
        crashed
            .get_job(job_id.as_str())
            .unwrap()
            .is_some_and(|job| job.status == JobStatus::Running)
    };
    assert!(wait_for(SPEC_WAIT_MAX, persisted_running).await);
    handle.abort();

    let restarted = fleet.manager();
    let events = record_events(&restarted);
    restarted.initialize().unwrap();

    let job = restarted.get_job(job_id.as_str()).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some(INTERRUPTED_ERROR));
    let failed: Vec<_> = events
        .lock()
        .iter()
        .filter_map(|e| match e {
            FleetEvent::JobFailed { job, .. } => Some(job.id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec![job_id]);
}
