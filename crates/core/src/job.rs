// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and state machine.
//!
//! A job moves `pending -> running -> {completed | failed | cancelled}`.
//! Terminal states are final: every transition method refuses to leave one.

use crate::session::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a job.
    ///
    /// Generated as `job-YYYY-MM-DD-xxxxxxxxxxxx` so ids sort by creation day and
    /// stay readable in logs.
    pub struct JobId;
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions occur)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// What caused a job to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    #[default]
    Manual,
    Schedule,
    Fork,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::Manual => write!(f, "manual"),
            TriggerKind::Schedule => write!(f, "schedule"),
            TriggerKind::Fork => write!(f, "fork"),
        }
    }
}

/// Rejected status transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job transition for {job_id}: {from} -> {to}")]
pub struct TransitionError {
    pub job_id: JobId,
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Configuration for creating a new job
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub id: JobId,
    pub agent_name: String,
    pub prompt: String,
    pub session_id: Option<SessionId>,
    pub forked_from: Option<JobId>,
    pub trigger: TriggerKind,
    /// Schedule name when `trigger` is `Schedule`.
    pub schedule: Option<String>,
}

impl JobConfig {
    pub fn new(id: JobId, agent_name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id,
            agent_name: agent_name.into(),
            prompt: prompt.into(),
            session_id: None,
            forked_from: None,
            trigger: TriggerKind::Manual,
            schedule: None,
        }
    }
}

/// A job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Agent lookup key; the agent may vanish from configuration later.
    pub agent_name: String,
    pub status: JobStatus,
    pub prompt: String,
    /// Conversational session this job continues (or, once completed, the
    /// session the backend reported).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(
        default,
        rename = "forked_from_job_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub forked_from: Option<JobId>,
    #[serde(default)]
    pub trigger: TriggerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    pub started_at: DateTime<Utc>,
    /// Set on any terminal transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Create a new pending job
    pub fn new(config: JobConfig, started_at: DateTime<Utc>) -> Self {
        Self {
            id: config.id,
            agent_name: config.agent_name,
            status: JobStatus::Pending,
            prompt: config.prompt,
            session_id: config.session_id,
            forked_from: config.forked_from,
            trigger: config.trigger,
            schedule: config.schedule,
            started_at,
            completed_at: None,
            canceled_at: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// When the job stopped, preferring the cancellation time.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.canceled_at.or(self.completed_at)
    }

    /// `pending -> running`
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.check(JobStatus::Running, &[JobStatus::Pending])?;
        self.status = JobStatus::Running;
        Ok(())
    }

    /// `running -> completed`, adopting the session the backend reported.
    pub fn complete(
        &mut self,
        at: DateTime<Utc>,
        session_id: Option<SessionId>,
    ) -> Result<(), TransitionError> {
        self.check(JobStatus::Completed, &[JobStatus::Running])?;
        self.status = JobStatus::Completed;
        self.completed_at = Some(at);
        if session_id.is_some() {
            self.session_id = session_id;
        }
        Ok(())
    }

    /// `pending | running -> failed`
    pub fn fail(
        &mut self,
        at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.check(JobStatus::Failed, &[JobStatus::Pending, JobStatus::Running])?;
        self.status = JobStatus::Failed;
        self.completed_at = Some(at);
        self.error = Some(error.into());
        Ok(())
    }

    /// `pending | running -> cancelled`
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.check(
            JobStatus::Cancelled,
            &[JobStatus::Pending, JobStatus::Running],
        )?;
        self.status = JobStatus::Cancelled;
        self.completed_at = Some(at);
        self.canceled_at = Some(at);
        Ok(())
    }

    fn check(&self, to: JobStatus, allowed_from: &[JobStatus]) -> Result<(), TransitionError> {
        if allowed_from.contains(&self.status) {
            Ok(())
        } else {
            Err(TransitionError {
                job_id: self.id.clone(),
                from: self.status,
                to,
            })
        }
    }
}

/// Builder for `Job` with test defaults.
#[cfg(any(test, feature = "test-support"))]
pub struct JobBuilder {
    job: Job,
}

#[cfg(any(test, feature = "test-support"))]
impl Job {
    /// Create a builder with test defaults.
    pub fn builder() -> JobBuilder {
        JobBuilder {
            job: Job::new(
                JobConfig::new(JobId::new("job-1"), "worker", "do the thing"),
                DateTime::<Utc>::default(),
            ),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl JobBuilder {
    pub fn id(mut self, v: impl Into<String>) -> Self {
        self.job.id = JobId::new(v);
        self
    }
    pub fn agent_name(mut self, v: impl Into<String>) -> Self {
        self.job.agent_name = v.into();
        self
    }
    pub fn prompt(mut self, v: impl Into<String>) -> Self {
        self.job.prompt = v.into();
        self
    }
    pub fn status(mut self, v: JobStatus) -> Self {
        self.job.status = v;
        self
    }
    pub fn session_id(mut self, v: impl Into<String>) -> Self {
        self.job.session_id = Some(SessionId::new(v));
        self
    }
    pub fn forked_from(mut self, v: impl Into<String>) -> Self {
        self.job.forked_from = Some(JobId::new(v));
        self.job.trigger = TriggerKind::Fork;
        self
    }
    pub fn started_at(mut self, v: DateTime<Utc>) -> Self {
        self.job.started_at = v;
        self
    }
    pub fn completed_at(mut self, v: DateTime<Utc>) -> Self {
        self.job.completed_at = Some(v);
        self
    }
    pub fn build(self) -> Job {
        self.job
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
