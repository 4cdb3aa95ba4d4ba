// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Call options and results for the fleet manager

use crate::session_policy::SessionSource;
use chrono::{DateTime, Utc};
use fj_core::{Job, JobId, JobStatus, SessionId, TerminationType};
use serde::Serialize;
use std::time::Duration;

/// Context supplied when a schedule fires a trigger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleContext {
    /// Schedule name, recorded on the job
    pub name: String,
    /// Prompt configured on the schedule, used when the caller gives none
    pub prompt: Option<String>,
}

impl ScheduleContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerOptions {
    /// Overrides the schedule and agent prompts
    pub prompt: Option<String>,
    /// Session to continue; wins over the stored session
    pub resume: Option<SessionId>,
}

impl TriggerOptions {
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn resume(mut self, session_id: impl Into<SessionId>) -> Self {
        self.resume = Some(session_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelOptions {
    /// Grace period before forcing; defaults to `fleet.cancel_timeout_ms`
    pub timeout: Option<Duration>,
}

impl CancelOptions {
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForkOptions {
    /// Replaces the source job's prompt
    pub prompt: Option<String>,
    /// Replaces the session inherited from the source job
    pub session_id: Option<SessionId>,
}

impl ForkOptions {
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOptions {
    /// Replay persisted lines before live output
    pub include_history: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            include_history: true,
        }
    }
}

impl StreamOptions {
    pub fn live_only() -> Self {
        Self {
            include_history: false,
        }
    }
}

/// Outcome of a completed `trigger` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerResult {
    pub job_id: JobId,
    pub agent_name: String,
    /// `true` only when the job completed
    pub success: bool,
    pub status: JobStatus,
    pub prompt: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forked_from_job_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub session_source: SessionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TriggerResult {
    pub(crate) fn new(job: Job, session_source: SessionSource) -> Self {
        Self {
            success: job.status == JobStatus::Completed,
            status: job.status,
            completed_at: job.completed_at,
            started_at: job.started_at,
            job_id: job.id,
            agent_name: job.agent_name,
            prompt: job.prompt,
            forked_from_job_id: job.forked_from,
            session_id: job.session_id,
            session_source,
            error: job.error,
        }
    }
}

/// Outcome of a `cancel_job` call. Cancellation itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelResult {
    pub job_id: JobId,
    pub success: bool,
    pub termination_type: TerminationType,
    /// When the job stopped; the completion time for jobs already stopped
    pub canceled_at: Option<DateTime<Utc>>,
}

impl CancelResult {
    pub(crate) fn already_stopped(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            success: true,
            termination_type: TerminationType::AlreadyStopped,
            canceled_at: job.canceled_at.or(job.completed_at),
        }
    }

    pub(crate) fn cancelled(job: &Job, termination_type: TerminationType) -> Self {
        Self {
            job_id: job.id.clone(),
            success: true,
            termination_type,
            canceled_at: job.canceled_at,
        }
    }
}

/// Outcome of a completed `fork_job` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForkResult {
    pub job_id: JobId,
    pub forked_from_job_id: JobId,
    pub agent_name: String,
    pub prompt: String,
    pub started_at: DateTime<Utc>,
    pub success: bool,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub session_source: SessionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ForkResult {
    pub(crate) fn new(job: Job, source_id: JobId, session_source: SessionSource) -> Self {
        Self {
            success: job.status == JobStatus::Completed,
            status: job.status,
            started_at: job.started_at,
            job_id: job.id,
            forked_from_job_id: source_id,
            agent_name: job.agent_name,
            prompt: job.prompt,
            session_id: job.session_id,
            session_source,
            error: job.error,
        }
    }
}

/// Snapshot of the manager's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetStatus {
    pub initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fleet_name: Option<String>,
    pub agents: Vec<String>,
    pub running: Vec<JobId>,
}
