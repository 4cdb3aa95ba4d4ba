// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job creation: `trigger` and `fork_job` share one launch path

use super::{FleetManager, ForkOptions, ForkResult, ScheduleContext, TriggerOptions, TriggerResult};
use crate::error::{FleetError, ForkFailure};
use crate::executor;
use crate::in_flight::{wait_terminal, InFlightJob};
use crate::session_policy::{resolve_session, SessionSource};
use fj_adapters::ExecutionBackend;
use fj_config::{AgentCatalog, AgentDef};
use fj_core::{Clock, FleetEvent, Job, JobConfig, JobId, TriggerKind};
use std::sync::Arc;

/// Ids drawn before giving up on finding one that is not taken.
const ID_ATTEMPTS: usize = 8;

impl<B, C> FleetManager<B, C>
where
    B: ExecutionBackend,
    C: Clock,
{
    /// Run an agent once and wait for the job to finish.
    ///
    /// Only precondition failures are errors. A job that runs and fails
    /// returns `Ok` with `success == false`.
    pub async fn trigger(
        &self,
        agent_name: &str,
        schedule: Option<ScheduleContext>,
        options: TriggerOptions,
    ) -> Result<TriggerResult, FleetError> {
        let stores = self.shared.stores()?;
        let agent = self
            .shared
            .catalog()
            .agent(agent_name)
            .ok_or_else(|| FleetError::AgentNotFound(agent_name.to_string()))?;

        let now = self.shared.clock.utc_now();
        let stored = stores.sessions.get(agent_name)?;
        let session = resolve_session(options.resume, stored.as_ref(), now);
        let prompt = agent.resolve_prompt(
            options.prompt.as_deref(),
            schedule.as_ref().and_then(|s| s.prompt.as_deref()),
        );

        let mut config = JobConfig::new(self.next_job_id(), agent_name, prompt);
        config.session_id = session.session_id;
        if let Some(schedule) = schedule {
            config.trigger = TriggerKind::Schedule;
            config.schedule = Some(schedule.name);
        }

        let job = self.launch(agent, config, None).await?;
        Ok(TriggerResult::new(job, session.source))
    }

    /// Clone a job's agent, prompt, and session into a new job and run it.
    ///
    /// The source may be in any state. Fails with [`FleetError::JobFork`]
    /// if it does not exist or its agent has since been removed.
    pub async fn fork_job(
        &self,
        job_id: &str,
        options: ForkOptions,
    ) -> Result<ForkResult, FleetError> {
        let stores = self.shared.stores()?;
        let fork_error = |reason| FleetError::JobFork {
            job_id: JobId::new(job_id),
            reason,
        };

        let source = stores
            .jobs
            .load(job_id)?
            .ok_or_else(|| fork_error(ForkFailure::SourceMissing))?;
        let agent = self
            .shared
            .catalog()
            .agent(&source.agent_name)
            .ok_or_else(|| fork_error(ForkFailure::AgentRemoved(source.agent_name.clone())))?;

        let session_source = if options.session_id.is_some() {
            SessionSource::Explicit
        } else {
            SessionSource::Inherited
        };
        let prompt = options.prompt.unwrap_or_else(|| source.prompt.clone());
        let mut config = JobConfig::new(self.next_job_id(), &source.agent_name, prompt);
        config.session_id = options.session_id.or_else(|| source.session_id.clone());
        config.forked_from = Some(source.id.clone());
        config.trigger = TriggerKind::Fork;

        let source_id = source.id.clone();
        let job = self.launch(agent, config, Some(source)).await?;
        Ok(ForkResult::new(job, source_id, session_source))
    }

    fn next_job_id(&self) -> JobId {
        JobId::new(self.shared.ids.next(self.shared.clock.utc_now()))
    }

    /// Create the job, announce it, execute it, and wait for the final state.
    async fn launch(
        &self,
        agent: AgentDef,
        mut config: JobConfig,
        fork_source: Option<Job>,
    ) -> Result<Job, FleetError> {
        let stores = self.shared.stores()?;
        let now = self.shared.clock.utc_now();
        let mut attempts = 1;
        let (job, entry) = loop {
            let job = Job::new(config.clone(), now);
            let entry = InFlightJob::new(job.clone());
            // Claimed before the disk check: a job leaves the table only
            // after its record is saved, so no live or stored job shares it
            if self.shared.in_flight.claim(job.id.clone(), Arc::clone(&entry)) {
                if !stores.jobs.exists(job.id.as_str()) {
                    break (job, entry);
                }
                self.shared.in_flight.remove(job.id.as_str());
            }
            if attempts >= ID_ATTEMPTS {
                return Err(FleetError::InvalidState("no unused job id available"));
            }
            attempts += 1;
            tracing::warn!(job_id = %job.id, "job id already taken, drawing another");
            config.id = self.next_job_id();
        };
        let mut progress = entry.subscribe();

        if let Err(e) = stores.jobs.save(&job) {
            self.shared.in_flight.remove(job.id.as_str());
            return Err(e.into());
        }

        tracing::info!(
            job_id = %job.id,
            agent = %job.agent_name,
            session_id = job.session_id.as_ref().map(|s| s.as_str()),
            forked_from = job.forked_from.as_ref().map(|j| j.as_str()),
            "job created"
        );
        self.shared
            .bus
            .emit(&FleetEvent::JobCreated { job: job.clone() });
        if let Some(original_job) = fork_source {
            self.shared.bus.emit(&FleetEvent::JobForked {
                agent_name: job.agent_name.clone(),
                job: job.clone(),
                original_job,
            });
        }

        executor::spawn(Arc::clone(&self.shared), Arc::clone(&entry), agent);

        wait_terminal(&mut progress).await;
        let job = entry.job.lock().await.clone();
        Ok(job)
    }
}
