// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job executor: one backend call per in-flight job
//!
//! The executor is the only writer of an in-flight job's status. Cancel
//! requests reach it through the job's two tokens:
//! - `cancel` is handed to the backend and asks it to stop
//! - `hard_stop` drops the backend call outright
//!
//! Either way the executor records the final state, updates the agent's
//! session on success, and releases the in-flight slot. If the executor
//! task dies, a supervising task does that bookkeeping instead.

use crate::in_flight::InFlightJob;
use crate::manager::{Shared, Stores};
use fj_adapters::{BackendError, BackendOutcome, ExecutionBackend, ExecutionRequest, OutputChunk};
use fj_config::AgentDef;
use fj_core::{Clock, FleetEvent, Job, JobId, JobStatus, LogLine, SessionMode, TerminationType};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Output chunks buffered between the backend and the log writer.
const OUTPUT_BUFFER: usize = 64;

enum RunOutcome {
    Finished(Result<BackendOutcome, BackendError>),
    /// The cancel timeout elapsed and the backend call was dropped
    Forced,
}

/// Run the job on its own task, supervised so the job is settled even if
/// that task panics.
pub(crate) fn spawn<B, C>(shared: Arc<Shared<B, C>>, entry: Arc<InFlightJob>, agent: AgentDef)
where
    B: ExecutionBackend,
    C: Clock,
{
    let task = tokio::spawn(run_job(Arc::clone(&shared), Arc::clone(&entry), agent));
    tokio::spawn(async move {
        let Err(e) = task.await else {
            return;
        };
        let reason = format!("executor stopped: {e}");
        if !abandon(&shared, &entry, &reason).await {
            // Died partway through finalize
            let job_id = entry.job.lock().await.id.clone();
            shared.in_flight.remove(job_id.as_str());
            entry.mark_terminal(entry.hard_stop.is_cancelled());
        }
    });
}

async fn run_job<B, C>(shared: Arc<Shared<B, C>>, entry: Arc<InFlightJob>, agent: AgentDef)
where
    B: ExecutionBackend,
    C: Clock,
{
    let Ok(stores) = shared.stores() else {
        return;
    };

    let job = {
        let mut job = entry.job.lock().await;
        if let Err(e) = job.start() {
            tracing::warn!(job_id = %job.id, error = %e, "job could not start");
        }
        persist(stores, &job);
        job.clone()
    };
    tracing::info!(job_id = %job.id, agent = %job.agent_name, "job started");
    shared.bus.emit(&FleetEvent::JobStarted { job: job.clone() });

    let request = ExecutionRequest::new(job.id.clone(), agent.clone(), job.prompt.clone())
        .with_session(job.session_id.clone());
    let (output_tx, output_rx) = mpsc::channel(OUTPUT_BUFFER);

    let execution = async {
        let (result, ()) = tokio::join!(
            shared
                .backend
                .execute(request, output_tx, entry.cancel.clone()),
            pump_output(&shared, stores, &entry, &job.id, output_rx),
        );
        result
    };
    let outcome = tokio::select! {
        biased;
        _ = entry.hard_stop.cancelled() => RunOutcome::Forced,
        result = execution => RunOutcome::Finished(result),
    };

    finalize(&shared, stores, &entry, agent.session_mode, outcome).await;
}

/// Append backend output to the job log, in order, until the backend is done.
async fn pump_output<B, C: Clock>(
    shared: &Shared<B, C>,
    stores: &Stores,
    entry: &InFlightJob,
    job_id: &JobId,
    mut output_rx: mpsc::Receiver<OutputChunk>,
) {
    let mut seq = 0;
    while let Some(chunk) = output_rx.recv().await {
        let line = LogLine {
            seq,
            timestamp: shared.clock.utc_now(),
            kind: chunk.kind,
            text: chunk.text,
        };
        seq += 1;
        if let Err(e) = stores.jobs.append_log(job_id.as_str(), &line) {
            tracing::warn!(job_id = %job_id, error = %e, "failed to append log line");
        }
        entry.line_appended();
        shared.bus.emit(&FleetEvent::JobOutput {
            job_id: job_id.clone(),
            line,
        });
    }
}

async fn finalize<B, C: Clock>(
    shared: &Shared<B, C>,
    stores: &Stores,
    entry: &InFlightJob,
    session_mode: SessionMode,
    outcome: RunOutcome,
) {
    let now = shared.clock.utc_now();
    let forced = matches!(outcome, RunOutcome::Forced);
    let cancelled = forced
        || entry.cancel.is_cancelled()
        || matches!(outcome, RunOutcome::Finished(Err(BackendError::Cancelled)));

    let job = {
        let mut job = entry.job.lock().await;
        if job.is_terminal() {
            // Settled by `abandon`
            return;
        }
        let transition = match outcome {
            _ if cancelled => job.cancel(now),
            RunOutcome::Finished(Ok(result)) => job.complete(now, result.session_id),
            RunOutcome::Finished(Err(e)) => job.fail(now, e.to_string()),
            RunOutcome::Forced => job.cancel(now),
        };
        if let Err(e) = transition {
            tracing::warn!(job_id = %job.id, error = %e, "unexpected job transition");
        }
        persist(stores, &job);
        job.clone()
    };

    if job.status == JobStatus::Completed {
        record_session(shared, stores, &job, session_mode).await;
    }

    log_finished(&job, forced);
    shared.in_flight.remove(job.id.as_str());
    if let Some(event) = terminal_event(&job, forced) {
        shared.bus.emit(&event);
    }
    entry.mark_terminal(forced);
}

/// Settle a job whose executor can no longer do it: a cancelled job is
/// recorded as cancelled, anything else as failed with `reason`.
///
/// Returns `false` without touching anything if the job already reached a
/// final state.
pub(crate) async fn abandon<B, C: Clock>(
    shared: &Shared<B, C>,
    entry: &InFlightJob,
    reason: &str,
) -> bool {
    let now = shared.clock.utc_now();
    let forced = entry.hard_stop.is_cancelled();
    let job = {
        let mut job = entry.job.lock().await;
        if job.is_terminal() {
            return false;
        }
        let transition = if entry.cancel.is_cancelled() {
            job.cancel(now)
        } else {
            job.fail(now, reason)
        };
        if let Err(e) = transition {
            tracing::warn!(job_id = %job.id, error = %e, "unexpected job transition");
        }
        if let Ok(stores) = shared.stores() {
            persist(stores, &job);
        }
        job.clone()
    };

    tracing::error!(job_id = %job.id, status = %job.status, reason, "job executor abandoned");
    shared.in_flight.remove(job.id.as_str());
    if let Some(event) = terminal_event(&job, forced) {
        shared.bus.emit(&event);
    }
    entry.mark_terminal(forced);
    true
}

fn terminal_event(job: &Job, forced: bool) -> Option<FleetEvent> {
    match job.status {
        JobStatus::Completed => Some(FleetEvent::JobCompleted { job: job.clone() }),
        JobStatus::Failed => Some(FleetEvent::JobFailed {
            error: job.error.clone().unwrap_or_default(),
            job: job.clone(),
        }),
        JobStatus::Cancelled => Some(FleetEvent::JobCancelled {
            job_id: job.id.clone(),
            termination_type: if forced {
                TerminationType::Forced
            } else {
                TerminationType::Cancelled
            },
            canceled_at: job.canceled_at.unwrap_or(job.started_at),
        }),
        JobStatus::Pending | JobStatus::Running => None,
    }
}

fn persist(stores: &Stores, job: &Job) {
    if let Err(e) = stores.jobs.save(job) {
        tracing::error!(job_id = %job.id, status = %job.status, error = %e, "failed to persist job");
    }
}

fn log_finished(job: &Job, forced: bool) {
    match job.status {
        JobStatus::Completed => tracing::info!(job_id = %job.id, "job completed"),
        JobStatus::Failed => tracing::warn!(
            job_id = %job.id,
            error = job.error.as_deref().unwrap_or(""),
            "job failed"
        ),
        JobStatus::Cancelled => tracing::info!(job_id = %job.id, forced, "job cancelled"),
        status => tracing::warn!(job_id = %job.id, %status, "job finished in non-terminal state"),
    }
}

/// Create-or-update the agent's session. Serialized per agent so updates
/// land in completion order.
async fn record_session<B, C: Clock>(
    shared: &Shared<B, C>,
    stores: &Stores,
    job: &Job,
    mode: SessionMode,
) {
    let Some(session_id) = job.session_id.clone() else {
        return;
    };
    let _guard = shared.session_locks.lock(&job.agent_name).await;
    let now = shared.clock.utc_now();
    match stores
        .sessions
        .record_use(&job.agent_name, session_id, mode, now)
    {
        Ok(record) => tracing::debug!(
            agent = %job.agent_name,
            session_id = %record.session_id,
            job_count = record.job_count,
            "session updated"
        ),
        Err(e) => tracing::warn!(agent = %job.agent_name, error = %e, "failed to update session"),
    }
}
