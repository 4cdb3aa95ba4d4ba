//! End-to-end scenarios.

use crate::prelude::*;
use fj_core::TerminationType;
use fj_engine::{CancelOptions, FleetError, ForkFailure, ForkOptions};

#[tokio::test]
async fn trigger_then_cancel_reports_already_stopped() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let job = trigger(&manager, "builder").await;

    let result = manager
        .cancel_job(job.job_id.as_str(), CancelOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.termination_type, TerminationType::AlreadyStopped);
}

#[tokio::test]
async fn fork_without_override_inherits_prompt() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let job = trigger_with_prompt(&manager, "builder", "Original prompt").await;

    let fork = manager
        .fork_job(job.job_id.as_str(), ForkOptions::default())
        .await
        .unwrap();

    assert_eq!(fork.prompt, "Original prompt");
}

#[tokio::test]
async fn fork_with_override_uses_it_exactly() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let job = trigger_with_prompt(&manager, "builder", "Original prompt").await;

    let fork = manager
        .fork_job(
            job.job_id.as_str(),
            ForkOptions::default().prompt("Modified prompt"),
        )
        .await
        .unwrap();

    assert_eq!(fork.prompt, "Modified prompt");
    assert_eq!(fleet.backend.last_call().unwrap().prompt, "Modified prompt");
}

#[tokio::test]
async fn fork_after_agent_removed_from_config_fails() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let job = trigger(&manager, "builder").await;

    fleet.write_agents(&["auditor"]);
    let agents = manager.reload().unwrap();
    assert_eq!(agents, vec!["auditor"]);

    let err = manager
        .fork_job(job.job_id.as_str(), ForkOptions::default())
        .await
        .unwrap_err();
    match err {
        FleetError::JobFork { job_id, reason } => {
            assert_eq!(job_id, job.job_id);
            assert_eq!(reason, ForkFailure::AgentRemoved("builder".to_string()));
        }
        other => panic!("expected JobFork, got {other:?}"),
    }
}

#[tokio::test]
async fn traced_backend_drives_jobs_end_to_end() {
    let fleet = Fleet::new();
    let manager = fj_engine::FleetManager::new(
        fj_engine::FleetDeps::new(
            fj_adapters::TracedBackend::new(fleet.backend.clone()),
            fleet.clock.clone(),
        )
        .with_state_dir(fleet.state_dir()),
        fleet.config_path(),
    );
    manager.initialize().unwrap();

    let result = manager
        .trigger("auditor", None, fj_engine::TriggerOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(fleet.backend.call_count(), 1);
}
