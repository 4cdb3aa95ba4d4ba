// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{Clock, FakeClock};

fn pending_job() -> Job {
    let clock = FakeClock::new();
    let config = JobConfig::new(JobId::new("job-1"), "reviewer", "Review the PR");
    Job::new(config, clock.utc_now())
}

#[test]
fn new_job_is_pending_with_start_time() {
    let clock = FakeClock::new();
    let job = Job::new(
        JobConfig::new(JobId::new("job-1"), "reviewer", "Review the PR"),
        clock.utc_now(),
    );

    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.agent_name, "reviewer");
    assert_eq!(job.prompt, "Review the PR");
    assert_eq!(job.started_at, clock.utc_now());
    assert!(job.completed_at.is_none());
    assert!(job.canceled_at.is_none());
    assert_eq!(job.trigger, TriggerKind::Manual);
}

#[test]
fn happy_path_records_backend_session() {
    let mut job = pending_job();
    job.session_id = Some(SessionId::new("sess-old"));
    job.start().unwrap();
    assert_eq!(job.status, JobStatus::Running);

    let at = job.started_at + chrono::Duration::seconds(5);
    job.complete(at, Some(SessionId::new("sess-new"))).unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.completed_at, Some(at));
    assert_eq!(job.session_id, Some(SessionId::new("sess-new")));
}

#[test]
fn complete_without_backend_session_keeps_existing() {
    let mut job = pending_job();
    job.session_id = Some(SessionId::new("sess-1"));
    job.start().unwrap();
    job.complete(job.started_at, None).unwrap();
    assert_eq!(job.session_id, Some(SessionId::new("sess-1")));
}

#[test]
fn fail_retains_error_detail() {
    let mut job = pending_job();
    job.start().unwrap();
    job.fail(job.started_at, "backend exploded").unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("backend exploded"));
    assert!(job.completed_at.is_some());
}

#[test]
fn cancel_sets_both_timestamps() {
    let mut job = pending_job();
    job.start().unwrap();
    let at = job.started_at + chrono::Duration::seconds(1);
    job.cancel(at).unwrap();

    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.canceled_at, Some(at));
    assert_eq!(job.finished_at(), Some(at));
}

#[yare::parameterized(
    completed = { JobStatus::Completed },
    failed    = { JobStatus::Failed },
    cancelled = { JobStatus::Cancelled },
)]
fn terminal_states_are_final(status: JobStatus) {
    let mut job = Job::builder().status(status).build();
    let at = job.started_at;

    assert!(job.start().is_err());
    assert!(job.complete(at, None).is_err());
    assert!(job.fail(at, "x").is_err());
    assert!(job.cancel(at).is_err());
    assert_eq!(job.status, status);
}

#[test]
fn complete_requires_running() {
    let mut job = pending_job();
    let err = job.complete(job.started_at, None).unwrap_err();
    assert_eq!(err.from, JobStatus::Pending);
    assert_eq!(err.to, JobStatus::Completed);
    assert!(err.to_string().contains("pending -> completed"));
}

#[yare::parameterized(
    pending   = { JobStatus::Pending,   false },
    running   = { JobStatus::Running,   false },
    completed = { JobStatus::Completed, true },
    failed    = { JobStatus::Failed,    true },
    cancelled = { JobStatus::Cancelled, true },
)]
fn status_terminality(status: JobStatus, terminal: bool) {
    assert_eq!(status.is_terminal(), terminal);
}

#[test]
fn serialized_record_uses_lineage_field_name() {
    let job = Job::builder().id("job-2").forked_from("job-1").build();
    let value = serde_json::to_value(&job).unwrap();

    assert_eq!(value["forked_from_job_id"], "job-1");
    assert_eq!(value["trigger"], "fork");
    assert_eq!(value["status"], "pending");
    assert!(value.get("canceled_at").is_none());

    let parsed: Job = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, job);
}
