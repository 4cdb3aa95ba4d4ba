//! Cancellation specs.

use crate::prelude::*;
use fj_adapters::FakeRun;
use fj_core::{FleetEvent, JobStatus, TerminationType};
use fj_engine::{CancelOptions, FleetError, TriggerOptions};
use std::time::Duration;

#[tokio::test]
async fn cancelling_an_unknown_job_is_not_found() {
    let fleet = Fleet::new();
    let manager = fleet.started();

    let err = manager
        .cancel_job("job-2026-01-01-000000", CancelOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, FleetError::JobNotFound(_)));
}

#[tokio::test]
async fn cancelling_twice_always_succeeds() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    fleet.backend.push_run(FakeRun::until_cancelled());
    let running = manager.clone();
    let handle = tokio::spawn(async move {
        running
            .trigger("builder", None, TriggerOptions::default())
            .await
    });
    assert!(wait_for(SPEC_WAIT_MAX, || !manager.running_jobs().unwrap().is_empty()).await);
    let job_id = manager.running_jobs().unwrap().remove(0);

    let first = manager
        .cancel_job(job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();
    let second = manager
        .cancel_job(job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();

    assert!(first.success);
    assert_eq!(first.termination_type, TerminationType::Cancelled);
    assert!(second.success);
    assert_eq!(second.termination_type, TerminationType::AlreadyStopped);

    let result = handle.await.unwrap().unwrap();
    assert_eq!(result.status, JobStatus::Cancelled);
    assert!(!result.success);
}

#[tokio::test]
async fn unresponsive_job_is_forced_and_its_slot_released() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let events = record_events(&manager);
    fleet.backend.push_run(FakeRun::stubborn());
    let running = manager.clone();
    let handle = tokio::spawn(async move {
        running
            .trigger("builder", None, TriggerOptions::default())
            .await
    });
    assert!(wait_for(SPEC_WAIT_MAX, || !manager.running_jobs().unwrap().is_empty()).await);
    let job_id = manager.running_jobs().unwrap().remove(0);

    let result = manager
        .cancel_job(job_id.as_str(), CancelOptions::timeout(Duration::from_millis(20)))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.termination_type, TerminationType::Forced);
    assert!(manager.running_jobs().unwrap().is_empty());
    assert_eq!(handle.await.unwrap().unwrap().status, JobStatus::Cancelled);

    let persisted = manager.get_job(job_id.as_str()).unwrap().unwrap();
    assert_eq!(persisted.status, JobStatus::Cancelled);
    let cancelled: Vec<_> = events
        .lock()
        .iter()
        .filter_map(|e| match e {
            FleetEvent::JobCancelled {
                job_id: id,
                termination_type,
                ..
            } => Some((id.clone(), *termination_type)),
            _ => None,
        })
        .collect();
    assert_eq!(cancelled, vec![(job_id, TerminationType::Forced)]);
}
