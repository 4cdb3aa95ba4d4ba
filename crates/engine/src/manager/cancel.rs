// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job cancellation

use super::{CancelOptions, CancelResult, FleetManager, Shared};
use crate::error::FleetError;
use crate::executor;
use crate::in_flight::{wait_terminal, InFlightJob};
use fj_adapters::ExecutionBackend;
use fj_core::{Clock, FleetEvent, JobId, JobStatus, TerminationType};
use std::sync::Arc;
use std::time::Duration;

impl<B, C> FleetManager<B, C>
where
    B: ExecutionBackend,
    C: Clock,
{
    /// Stop a job, waiting up to the cancel timeout for it to wind down.
    ///
    /// Terminal jobs are left alone and reported as `already_stopped`. A job
    /// that ignores the request past the timeout is stopped unilaterally and
    /// reported as `forced`. If its executor does not record the forced stop
    /// within another timeout, the job is settled here.
    pub async fn cancel_job(
        &self,
        job_id: &str,
        options: CancelOptions,
    ) -> Result<CancelResult, FleetError> {
        let stores = self.shared.stores()?;

        let Some(entry) = self.shared.in_flight.get(job_id) else {
            let mut job = stores
                .jobs
                .load(job_id)?
                .ok_or_else(|| FleetError::JobNotFound(JobId::new(job_id)))?;
            if job.is_terminal() {
                return Ok(CancelResult::already_stopped(&job));
            }

            // Non-terminal on disk with no executor behind it
            let now = self.shared.clock.utc_now();
            if job.cancel(now).is_err() {
                return Ok(CancelResult::already_stopped(&job));
            }
            stores.jobs.save(&job)?;
            tracing::info!(job_id = %job.id, "cancelled orphaned job");
            self.shared.bus.emit(&FleetEvent::JobCancelled {
                job_id: job.id.clone(),
                termination_type: TerminationType::Cancelled,
                canceled_at: now,
            });
            return Ok(CancelResult::cancelled(&job, TerminationType::Cancelled));
        };

        let timeout = options
            .timeout
            .unwrap_or_else(|| self.shared.catalog().fleet.cancel_timeout());
        Ok(stop(&self.shared, &entry, timeout).await)
    }

    /// Cancel every in-flight job concurrently.
    pub async fn cancel_all(&self, options: CancelOptions) -> Result<Vec<CancelResult>, FleetError> {
        self.shared.stores()?;
        let timeout = options
            .timeout
            .unwrap_or_else(|| self.shared.catalog().fleet.cancel_timeout());
        let entries = self.shared.in_flight.entries();
        let mut results =
            futures::future::join_all(entries.iter().map(|entry| stop(&self.shared, entry, timeout))).await;
        results.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        Ok(results)
    }
}

async fn stop<B, C: Clock>(
    shared: &Shared<B, C>,
    entry: &Arc<InFlightJob>,
    timeout: Duration,
) -> CancelResult {
    let mut progress = entry.subscribe();
    {
        let job = entry.job.lock().await;
        if job.is_terminal() {
            return CancelResult::already_stopped(&job);
        }
        tracing::info!(job_id = %job.id, timeout_ms = timeout.as_millis() as u64, "cancelling job");
    }

    entry.cancel.cancel();
    let graceful = tokio::time::timeout(timeout, wait_terminal(&mut progress))
        .await
        .is_ok();
    if !graceful {
        let job_id = entry.job.lock().await.id.clone();
        tracing::warn!(job_id = %job_id, "cancel timed out, forcing stop");
        entry.hard_stop.cancel();
        let settled = tokio::time::timeout(timeout, wait_terminal(&mut progress))
            .await
            .is_ok();
        if !settled && !executor::abandon(shared, entry, "executor unresponsive").await {
            // The executor is finishing up; it holds no backend call anymore
            wait_terminal(&mut progress).await;
        }
    }

    let job = entry.job.lock().await;
    if job.status != JobStatus::Cancelled {
        // Finished on its own before the request landed
        return CancelResult::already_stopped(&job);
    }
    // Another caller may have forced the stop
    let termination_type = if entry.was_forced() {
        TerminationType::Forced
    } else {
        TerminationType::Cancelled
    };
    CancelResult::cancelled(&job, termination_type)
}
