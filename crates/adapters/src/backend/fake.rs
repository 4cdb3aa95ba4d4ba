// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake execution backend for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{BackendError, BackendOutcome, ExecutionBackend, ExecutionRequest, OutputChunk};
use async_trait::async_trait;
use fj_core::{JobId, SessionId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

/// Recorded call to FakeBackend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub job_id: JobId,
    pub agent_name: String,
    pub prompt: String,
    pub session_id: Option<SessionId>,
}

/// How a scripted run behaves after emitting its output
#[derive(Debug, Clone, Default)]
pub enum FakeBehavior {
    /// Finish right away
    #[default]
    Immediate,
    /// Finish after a delay, or stop early on cancellation
    Delay(Duration),
    /// Wait for the notify (or cancellation) before finishing
    WaitFor(Arc<Notify>),
    /// Run until cancelled
    UntilCancelled,
    /// Never finish, even when cancelled
    IgnoreCancel,
    /// Panic instead of finishing
    Panic,
    /// Run until cancelled, then panic
    PanicOnCancel,
}

/// A scripted run
#[derive(Debug, Clone)]
pub struct FakeRun {
    pub output: Vec<String>,
    pub behavior: FakeBehavior,
    /// `Err` makes the run fail with that message
    pub result: Result<Option<SessionId>, String>,
    /// Mint a fresh session id when the request had none and `result` names none
    pub mint_session: bool,
}

impl FakeRun {
    /// A run that succeeds, keeping or minting a session.
    pub fn success() -> Self {
        Self {
            output: Vec::new(),
            behavior: FakeBehavior::Immediate,
            result: Ok(None),
            mint_session: true,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
            ..Self::success()
        }
    }

    /// A run that only ends when cancelled.
    pub fn until_cancelled() -> Self {
        Self::success().behavior(FakeBehavior::UntilCancelled)
    }

    /// A run that ignores cancellation entirely.
    pub fn stubborn() -> Self {
        Self::success().behavior(FakeBehavior::IgnoreCancel)
    }

    /// A run whose backend call panics.
    pub fn panicking() -> Self {
        Self::success().behavior(FakeBehavior::Panic)
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self::success().behavior(FakeBehavior::WaitFor(gate))
    }

    pub fn output<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn behavior(mut self, behavior: FakeBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// End the run on this session id.
    pub fn session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.result = Ok(Some(session_id.into()));
        self
    }
}

/// Fake execution backend for testing
///
/// Runs are popped from a script in call order; once the script is empty
/// every call uses the default run. All calls are recorded.
#[derive(Clone)]
pub struct FakeBackend {
    inner: Arc<Mutex<FakeBackendState>>,
}

struct FakeBackendState {
    calls: Vec<ExecCall>,
    script: VecDeque<FakeRun>,
    default_run: FakeRun,
    minted: u64,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeBackendState {
                calls: Vec::new(),
                script: VecDeque::new(),
                default_run: FakeRun::success(),
                minted: 0,
            })),
        }
    }

    /// Queue a run for the next unscripted call.
    pub fn push_run(&self, run: FakeRun) {
        self.inner.lock().script.push_back(run);
    }

    /// Replace the run used once the script is exhausted.
    pub fn set_default_run(&self, run: FakeRun) {
        self.inner.lock().default_run = run;
    }

    pub fn calls(&self) -> Vec<ExecCall> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    pub fn last_call(&self) -> Option<ExecCall> {
        self.inner.lock().calls.last().cloned()
    }

    /// Pick the run for a request and the session it would end on.
    fn next_run(&self, request: &ExecutionRequest) -> (FakeRun, Option<SessionId>) {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecCall {
            job_id: request.job_id.clone(),
            agent_name: request.agent.name.clone(),
            prompt: request.prompt.clone(),
            session_id: request.session_id.clone(),
        });
        let run = match inner.script.pop_front() {
            Some(run) => run,
            None => inner.default_run.clone(),
        };
        let session = match &run.result {
            Ok(Some(id)) => Some(id.clone()),
            Ok(None) => match &request.session_id {
                Some(id) => Some(id.clone()),
                None if run.mint_session => {
                    inner.minted += 1;
                    Some(SessionId::new(format!("fake-session-{}", inner.minted)))
                }
                None => None,
            },
            Err(_) => None,
        };
        (run, session)
    }
}

#[async_trait]
impl ExecutionBackend for FakeBackend {
    async fn execute(
        &self,
        request: ExecutionRequest,
        output: mpsc::Sender<OutputChunk>,
        cancel: CancellationToken,
    ) -> Result<BackendOutcome, BackendError> {
        let (run, session_id) = self.next_run(&request);

        for line in run.output {
            let _ = output.send(OutputChunk::assistant(line)).await;
        }

        match run.behavior {
            FakeBehavior::Immediate => {}
            FakeBehavior::Delay(delay) => {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(BackendError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            FakeBehavior::WaitFor(gate) => {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(BackendError::Cancelled),
                    _ = gate.notified() => {}
                }
            }
            FakeBehavior::UntilCancelled => {
                cancel.cancelled().await;
                return Err(BackendError::Cancelled);
            }
            FakeBehavior::IgnoreCancel => std::future::pending::<()>().await,
            FakeBehavior::Panic => fake_panic(&request.job_id),
            FakeBehavior::PanicOnCancel => {
                cancel.cancelled().await;
                fake_panic(&request.job_id)
            }
        }

        match run.result {
            Ok(_) => Ok(BackendOutcome { session_id }),
            Err(message) => Err(BackendError::Failed(message)),
        }
    }
}

#[allow(clippy::panic)]
fn fake_panic(job_id: &JobId) -> ! {
    panic!("fake backend panicked running {job_id}")
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
