// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the fleet manager

use fj_config::ConfigError;
use fj_core::JobId;
use fj_storage::StoreError;
use std::fmt;
use thiserror::Error;

/// Why a fork could not be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForkFailure {
    /// No job with the requested id exists
    SourceMissing,
    /// The source job's agent is no longer configured
    AgentRemoved(String),
}

impl fmt::Display for ForkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForkFailure::SourceMissing => write!(f, "source job not found"),
            ForkFailure::AgentRemoved(agent) => {
                write!(f, "agent '{}' is no longer configured", agent)
            }
        }
    }
}

/// Errors returned by fleet manager calls.
///
/// A job that runs and fails is not an error; it is a `failed` job in a
/// successfully returned result.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("job not found: {0}")]
    JobNotFound(JobId),
    #[error("cannot fork job {job_id}: {reason}")]
    JobFork { job_id: JobId, reason: ForkFailure },
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl FleetError {
    pub(crate) fn not_initialized() -> Self {
        FleetError::InvalidState("fleet manager is not initialized")
    }
}
