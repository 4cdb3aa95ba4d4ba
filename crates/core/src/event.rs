// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events published to fleet listeners

use crate::job::{Job, JobId};
use crate::log::LogLine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a cancellation request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationType {
    /// The executor acknowledged the request within the timeout
    Cancelled,
    /// The timeout elapsed and the engine stopped the job unilaterally
    Forced,
    /// The job was already terminal; nothing was done
    AlreadyStopped,
}

impl fmt::Display for TerminationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationType::Cancelled => write!(f, "cancelled"),
            TerminationType::Forced => write!(f, "forced"),
            TerminationType::AlreadyStopped => write!(f, "already_stopped"),
        }
    }
}

/// Events emitted by the fleet manager.
///
/// Serializes with `{"type": "job:created", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FleetEvent {
    #[serde(rename = "job:created")]
    JobCreated { job: Job },

    #[serde(rename = "job:started")]
    JobStarted { job: Job },

    #[serde(rename = "job:output")]
    JobOutput { job_id: JobId, line: LogLine },

    #[serde(rename = "job:completed")]
    JobCompleted { job: Job },

    #[serde(rename = "job:failed")]
    JobFailed { job: Job, error: String },

    #[serde(rename = "job:cancelled")]
    JobCancelled {
        job_id: JobId,
        termination_type: TerminationType,
        canceled_at: DateTime<Utc>,
    },

    #[serde(rename = "job:forked")]
    JobForked {
        job: Job,
        original_job: Job,
        agent_name: String,
    },

    #[serde(rename = "config:reloaded")]
    ConfigReloaded { agents: Vec<String> },
}

impl FleetEvent {
    /// Channel name listeners subscribe to.
    pub fn name(&self) -> &'static str {
        match self {
            FleetEvent::JobCreated { .. } => "job:created",
            FleetEvent::JobStarted { .. } => "job:started",
            FleetEvent::JobOutput { .. } => "job:output",
            FleetEvent::JobCompleted { .. } => "job:completed",
            FleetEvent::JobFailed { .. } => "job:failed",
            FleetEvent::JobCancelled { .. } => "job:cancelled",
            FleetEvent::JobForked { .. } => "job:forked",
            FleetEvent::ConfigReloaded { .. } => "config:reloaded",
        }
    }

    /// Job this event concerns, if any.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            FleetEvent::JobCreated { job }
            | FleetEvent::JobStarted { job }
            | FleetEvent::JobCompleted { job }
            | FleetEvent::JobFailed { job, .. }
            | FleetEvent::JobForked { job, .. } => Some(&job.id),
            FleetEvent::JobOutput { job_id, .. } | FleetEvent::JobCancelled { job_id, .. } => {
                Some(job_id)
            }
            FleetEvent::ConfigReloaded { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
