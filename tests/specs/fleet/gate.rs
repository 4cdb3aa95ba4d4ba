//! Initialization gate specs.

use crate::prelude::*;
use fj_engine::{CancelOptions, FleetError, ForkOptions, StreamOptions, TriggerOptions};

#[tokio::test]
async fn every_job_control_call_before_initialize_is_invalid_state() {
    let fleet = Fleet::new();
    let manager = fleet.manager();

    let trigger = manager.trigger("builder", None, TriggerOptions::default()).await;
    let cancel = manager.cancel_job("job-1", CancelOptions::default()).await;
    let fork = manager.fork_job("job-1", ForkOptions::default()).await;
    let stream = manager.stream_logs("job-1", StreamOptions::default());

    assert!(matches!(trigger, Err(FleetError::InvalidState(_))));
    assert!(matches!(cancel, Err(FleetError::InvalidState(_))));
    assert!(matches!(fork, Err(FleetError::InvalidState(_))));
    assert!(matches!(stream, Err(FleetError::InvalidState(_))));
    assert_eq!(fleet.backend.call_count(), 0);
}

#[tokio::test]
async fn calls_succeed_once_initialized() {
    let fleet = Fleet::new();
    let manager = fleet.manager();
    manager.initialize().unwrap();

    let result = trigger(&manager, "builder").await;
    assert!(result.success);
}

#[tokio::test]
async fn clones_share_the_gate() {
    let fleet = Fleet::new();
    let manager = fleet.manager();
    let clone = manager.clone();

    manager.initialize().unwrap();

    assert!(clone.is_initialized());
    assert!(trigger(&clone, "auditor").await.success);
}
