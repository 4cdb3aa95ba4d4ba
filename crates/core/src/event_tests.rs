// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::log::LogKind;

fn sample_job(id: &str) -> Job {
    Job::builder().id(id).agent_name("reviewer").build()
}

#[test]
fn serializes_with_type_tag() {
    let event = FleetEvent::JobCreated {
        job: sample_job("job-1"),
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "job:created");
    assert_eq!(value["job"]["id"], "job-1");
}

#[test]
fn name_matches_serialized_tag() {
    let job = sample_job("job-1");
    let events = vec![
        FleetEvent::JobCreated { job: job.clone() },
        FleetEvent::JobStarted { job: job.clone() },
        FleetEvent::JobOutput {
            job_id: job.id.clone(),
            line: LogLine {
                seq: 0,
                timestamp: job.started_at,
                kind: LogKind::Assistant,
                text: "hi".to_string(),
            },
        },
        FleetEvent::JobCompleted { job: job.clone() },
        FleetEvent::JobFailed {
            job: job.clone(),
            error: "boom".to_string(),
        },
        FleetEvent::JobCancelled {
            job_id: job.id.clone(),
            termination_type: TerminationType::Forced,
            canceled_at: job.started_at,
        },
        FleetEvent::JobForked {
            job: sample_job("job-2"),
            original_job: job.clone(),
            agent_name: "reviewer".to_string(),
        },
        FleetEvent::ConfigReloaded {
            agents: vec!["reviewer".to_string()],
        },
    ];

    for event in events {
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.name());
        let parsed: FleetEvent = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, event);
    }
}

#[test]
fn job_id_points_at_new_job_for_forks() {
    let event = FleetEvent::JobForked {
        job: sample_job("job-2"),
        original_job: sample_job("job-1"),
        agent_name: "reviewer".to_string(),
    };
    assert_eq!(event.job_id().map(JobId::as_str), Some("job-2"));
    assert!(FleetEvent::ConfigReloaded { agents: vec![] }
        .job_id()
        .is_none());
}

#[yare::parameterized(
    cancelled       = { TerminationType::Cancelled,      "cancelled" },
    forced          = { TerminationType::Forced,         "forced" },
    already_stopped = { TerminationType::AlreadyStopped, "already_stopped" },
)]
fn termination_type_wire_names(kind: TerminationType, expected: &str) {
    assert_eq!(kind.to_string(), expected);
    assert_eq!(
        serde_json::to_value(kind).unwrap(),
        serde_json::Value::String(expected.to_string())
    );
}
