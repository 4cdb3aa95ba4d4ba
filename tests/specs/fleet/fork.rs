//! Fork specs.

use crate::prelude::*;
use fj_engine::{FleetError, ForkFailure, ForkOptions};

#[tokio::test]
async fn forking_an_unknown_job_fails() {
    let fleet = Fleet::new();
    let manager = fleet.started();

    let err = manager
        .fork_job("job-2026-01-01-000000", ForkOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FleetError::JobFork {
            reason: ForkFailure::SourceMissing,
            ..
        }
    ));
}

#[tokio::test]
async fn fork_has_its_own_id_and_points_at_the_source() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let source = trigger(&manager, "builder").await;

    for _ in 0..3 {
        let fork = manager
            .fork_job(source.job_id.as_str(), ForkOptions::default())
            .await
            .unwrap();
        assert_eq!(fork.forked_from_job_id, source.job_id);
        assert_ne!(fork.job_id, source.job_id);
    }

    let jobs = manager.list_jobs(&Default::default()).unwrap();
    assert_eq!(jobs.len(), 4);
    let forks = jobs.iter().filter(|j| j.forked_from.is_some()).count();
    assert_eq!(forks, 3);
}

#[tokio::test]
async fn fork_of_a_fork_chains_lineage() {
    let fleet = Fleet::new();
    let manager = fleet.started();
    let source = trigger_with_prompt(&manager, "auditor", "scan dependencies").await;
    let child = manager
        .fork_job(source.job_id.as_str(), ForkOptions::default())
        .await
        .unwrap();

    let grandchild = manager
        .fork_job(child.job_id.as_str(), ForkOptions::default())
        .await
        .unwrap();

    assert_eq!(grandchild.forked_from_job_id, child.job_id);
    assert_eq!(grandchild.prompt, "scan dependencies");
}
