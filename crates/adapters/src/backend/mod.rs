// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution backends
//!
//! An `ExecutionBackend` runs one job's prompt against one agent. The engine
//! hands it:
//! - the resolved request (agent, prompt, session to resume)
//! - a channel for incremental output, one chunk per log line
//! - a cancellation token the backend must honor cooperatively
//!
//! The backend returns once the run reaches a terminal outcome. A backend
//! that ignores cancellation is aborted by the engine after the configured
//! grace period.

mod command;
mod stream_json;

pub use command::{CommandBackend, DEFAULT_PROGRAM};
pub use stream_json::{parse_stream_line, StreamLine};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecCall, FakeBackend, FakeBehavior, FakeRun};

use async_trait::async_trait;
use fj_config::AgentDef;
use fj_core::{JobId, LogKind, SessionId};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors from a backend run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("execution failed: {0}")]
    Failed(String),
    #[error("io error: {0}")]
    Io(String),
    /// The run stopped because its cancellation token fired
    #[error("cancelled")]
    Cancelled,
}

/// Everything a backend needs to run one job
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub job_id: JobId,
    pub agent: AgentDef,
    pub prompt: String,
    /// Session to resume, if any
    pub session_id: Option<SessionId>,
}

impl ExecutionRequest {
    pub fn new(job_id: JobId, agent: AgentDef, prompt: impl Into<String>) -> Self {
        Self {
            job_id,
            agent,
            prompt: prompt.into(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }
}

/// One line of output produced during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub kind: LogKind,
    pub text: String,
}

impl OutputChunk {
    pub fn new(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(LogKind::Assistant, text)
    }
}

/// Successful terminal outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOutcome {
    /// Session the run ended on. `None` leaves the job's session unchanged.
    pub session_id: Option<SessionId>,
}

/// Adapter for running agent prompts
#[async_trait]
pub trait ExecutionBackend: Clone + Send + Sync + 'static {
    /// Run a prompt to completion.
    ///
    /// Output chunks are sent on `output` in the order produced. A closed
    /// receiver is not an error; the backend keeps running. When `cancel`
    /// fires the backend stops its work and returns `BackendError::Cancelled`.
    async fn execute(
        &self,
        request: ExecutionRequest,
        output: mpsc::Sender<OutputChunk>,
        cancel: CancellationToken,
    ) -> Result<BackendOutcome, BackendError>;
}
