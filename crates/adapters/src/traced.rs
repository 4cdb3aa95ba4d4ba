// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced backend wrapper for consistent observability

use crate::backend::{
    BackendError, BackendOutcome, ExecutionBackend, ExecutionRequest, OutputChunk,
};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Wrapper that adds tracing to any ExecutionBackend
#[derive(Clone)]
pub struct TracedBackend<B> {
    inner: B,
}

impl<B> TracedBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: ExecutionBackend> ExecutionBackend for TracedBackend<B> {
    async fn execute(
        &self,
        request: ExecutionRequest,
        output: mpsc::Sender<OutputChunk>,
        cancel: CancellationToken,
    ) -> Result<BackendOutcome, BackendError> {
        let span = tracing::info_span!(
            "backend.execute",
            job_id = %request.job_id,
            agent = %request.agent.name,
        );
        async {
            tracing::info!(
                resume = request.session_id.is_some(),
                prompt_len = request.prompt.len(),
                "starting"
            );
            let start = std::time::Instant::now();
            let result = self.inner.execute(request, output, cancel).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(outcome) => tracing::info!(
                    elapsed_ms,
                    session_id = outcome.session_id.as_ref().map(|s| s.as_str()),
                    "completed"
                ),
                Err(BackendError::Cancelled) => tracing::info!(elapsed_ms, "cancelled"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "execution failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
