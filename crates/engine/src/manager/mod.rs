// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet manager: the job control engine
//!
//! Owns the agent catalog, the stores, the event bus, and the table of
//! in-flight jobs. Every job-control call checks the initialization gate
//! first and fails with [`FleetError::InvalidState`] until
//! [`FleetManager::initialize`] has succeeded.

mod cancel;
mod launch;
mod types;

pub use types::{
    CancelOptions, CancelResult, FleetStatus, ForkOptions, ForkResult, ScheduleContext,
    StreamOptions, TriggerOptions, TriggerResult,
};

use crate::error::FleetError;
use crate::event_bus::EventBus;
use crate::in_flight::InFlightTable;
use crate::keyed_lock::KeyedLocks;
use crate::log_stream::LogStream;
use fj_adapters::ExecutionBackend;
use fj_config::{AgentCatalog, AgentDef, ConfigSource, FleetConfig};
use fj_core::{Clock, DatedIdGen, FleetEvent, IdGen, Job, JobId, SessionRecord};
use fj_storage::{JobFilter, JobStore, LogCursor, SessionStore};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Error recorded on jobs a previous process left running.
pub const INTERRUPTED_ERROR: &str = "interrupted: engine restarted";

/// Adapter and environment dependencies for a manager
pub struct FleetDeps<B, C> {
    pub backend: B,
    pub clock: C,
    pub ids: Arc<dyn IdGen>,
    /// Overrides `[fleet].state_dir` and the environment
    pub state_dir: Option<PathBuf>,
}

impl<B, C> FleetDeps<B, C> {
    pub fn new(backend: B, clock: C) -> Self {
        Self {
            backend,
            clock,
            ids: Arc::new(DatedIdGen),
            state_dir: None,
        }
    }

    pub fn with_ids(mut self, ids: impl IdGen) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(state_dir.into());
        self
    }
}

pub(crate) struct Stores {
    pub(crate) jobs: JobStore,
    pub(crate) sessions: SessionStore,
}

/// State shared between the manager and its executor tasks
pub(crate) struct Shared<B, C> {
    pub(crate) backend: B,
    pub(crate) clock: C,
    pub(crate) ids: Arc<dyn IdGen>,
    pub(crate) bus: EventBus,
    pub(crate) in_flight: InFlightTable,
    pub(crate) session_locks: KeyedLocks,
    source: Mutex<ConfigSource>,
    catalog: RwLock<Arc<FleetConfig>>,
    state_dir: Option<PathBuf>,
    /// Set exactly once, by `initialize`; doubles as the readiness flag
    stores: OnceLock<Stores>,
    init_lock: Mutex<()>,
}

impl<B, C> Shared<B, C> {
    pub(crate) fn stores(&self) -> Result<&Stores, FleetError> {
        self.stores.get().ok_or_else(FleetError::not_initialized)
    }

    pub(crate) fn catalog(&self) -> Arc<FleetConfig> {
        Arc::clone(&self.catalog.read())
    }
}

/// The job control engine.
///
/// Cheap to clone; clones share the same state.
pub struct FleetManager<B, C> {
    shared: Arc<Shared<B, C>>,
}

impl<B, C> Clone for FleetManager<B, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B, C> FleetManager<B, C>
where
    B: ExecutionBackend,
    C: Clock,
{
    pub fn new(deps: FleetDeps<B, C>, source: impl Into<ConfigSource>) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend: deps.backend,
                clock: deps.clock,
                ids: deps.ids,
                bus: EventBus::new(),
                in_flight: InFlightTable::default(),
                session_locks: KeyedLocks::default(),
                source: Mutex::new(source.into()),
                catalog: RwLock::new(Arc::new(FleetConfig::default())),
                state_dir: deps.state_dir,
                stores: OnceLock::new(),
                init_lock: Mutex::new(()),
            }),
        }
    }

    /// Event bus listeners subscribe on. Usable before initialization.
    pub fn events(&self) -> &EventBus {
        &self.shared.bus
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.stores.get().is_some()
    }

    /// Load configuration, open the stores, and open the gate.
    ///
    /// Jobs a previous process left `pending` or `running` are marked
    /// failed. Calling this twice is an error.
    pub fn initialize(&self) -> Result<(), FleetError> {
        let _guard = self.shared.init_lock.lock();
        if self.is_initialized() {
            return Err(FleetError::InvalidState(
                "fleet manager is already initialized",
            ));
        }

        let config = self.shared.source.lock().load()?;
        let state_dir = match (&self.shared.state_dir, &config.fleet.state_dir) {
            (Some(dir), _) | (None, Some(dir)) => dir.clone(),
            (None, None) => fj_config::env::state_dir()?,
        };
        let stores = Stores {
            jobs: JobStore::open(&state_dir)?,
            sessions: SessionStore::open(&state_dir)?,
        };
        let interrupted = self.reconcile_orphans(&stores)?;

        let agents = config.agent_names();
        *self.shared.catalog.write() = Arc::new(config);
        let _ = self.shared.stores.set(stores);

        tracing::info!(
            state_dir = %state_dir.display(),
            agents = agents.len(),
            interrupted,
            "fleet initialized"
        );
        Ok(())
    }

    fn reconcile_orphans(&self, stores: &Stores) -> Result<usize, FleetError> {
        let now = self.shared.clock.utc_now();
        let mut count = 0;
        for mut job in stores.jobs.list(&JobFilter::default())? {
            if job.is_terminal() {
                continue;
            }
            if job.fail(now, INTERRUPTED_ERROR).is_err() {
                continue;
            }
            stores.jobs.save(&job)?;
            tracing::warn!(job_id = %job.id, agent = %job.agent_name, "marked interrupted job failed");
            self.shared.bus.emit(&FleetEvent::JobFailed {
                error: INTERRUPTED_ERROR.to_string(),
                job,
            });
            count += 1;
        }
        Ok(count)
    }

    /// Re-read the configuration source and swap the agent catalog.
    ///
    /// In-flight jobs are untouched. Returns the new agent names.
    pub fn reload(&self) -> Result<Vec<String>, FleetError> {
        self.shared.stores()?;
        let config = self.shared.source.lock().load()?;
        Ok(self.swap_catalog(config))
    }

    /// Swap in an already-parsed configuration (until the next `reload`).
    ///
    /// The configuration is validated like a loaded file; on error the
    /// current catalog stays.
    pub fn apply_config(&self, config: FleetConfig) -> Result<Vec<String>, FleetError> {
        self.shared.stores()?;
        fj_config::validate(&config)?;
        Ok(self.swap_catalog(config))
    }

    fn swap_catalog(&self, config: FleetConfig) -> Vec<String> {
        let agents = config.agent_names();
        *self.shared.catalog.write() = Arc::new(config);
        tracing::info!(agents = ?agents, "configuration reloaded");
        self.shared.bus.emit(&FleetEvent::ConfigReloaded {
            agents: agents.clone(),
        });
        agents
    }

    /// The current configuration.
    pub fn config(&self) -> Arc<FleetConfig> {
        self.shared.catalog()
    }

    pub fn agent(&self, name: &str) -> Option<AgentDef> {
        self.shared.catalog().agent(name)
    }

    /// Stream a job's log lines.
    ///
    /// With `include_history` the stream starts at the first persisted
    /// line, otherwise at the current end of the log. It ends once the job
    /// is terminal and all lines have been yielded.
    pub fn stream_logs(&self, job_id: &str, options: StreamOptions) -> Result<LogStream, FleetError> {
        let stores = self.shared.stores()?;
        // Subscribe before positioning the cursor so no line is missed
        let progress = self.shared.in_flight.get(job_id).map(|entry| entry.subscribe());
        if progress.is_none() && !stores.jobs.exists(job_id) {
            return Err(FleetError::JobNotFound(JobId::new(job_id)));
        }
        let cursor = if options.include_history {
            LogCursor::start()
        } else {
            stores.jobs.log_end(job_id)?
        };
        Ok(LogStream::new(
            JobId::new(job_id),
            stores.jobs.clone(),
            cursor,
            progress,
        ))
    }

    pub fn get_job(&self, job_id: &str) -> Result<Option<Job>, FleetError> {
        Ok(self.shared.stores()?.jobs.load(job_id)?)
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, FleetError> {
        Ok(self.shared.stores()?.jobs.list(filter)?)
    }

    /// Ids of jobs currently executing, sorted.
    pub fn running_jobs(&self) -> Result<Vec<JobId>, FleetError> {
        self.shared.stores()?;
        Ok(self.shared.in_flight.ids())
    }

    /// The agent's stored session, expired or not.
    pub fn session(&self, agent_name: &str) -> Result<Option<SessionRecord>, FleetError> {
        Ok(self.shared.stores()?.sessions.get(agent_name)?)
    }

    /// Forget the agent's session so its next trigger starts fresh.
    pub fn clear_session(&self, agent_name: &str) -> Result<bool, FleetError> {
        let cleared = self.shared.stores()?.sessions.clear(agent_name)?;
        if cleared {
            tracing::info!(agent = agent_name, "session cleared");
        }
        Ok(cleared)
    }

    pub fn status(&self) -> FleetStatus {
        let config = self.shared.catalog();
        FleetStatus {
            initialized: self.is_initialized(),
            fleet_name: config.fleet.name.clone(),
            agents: config.agent_names(),
            running: self.shared.in_flight.ids(),
        }
    }
}

#[cfg(test)]
#[path = "../manager_tests/mod.rs"]
mod tests;
