// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::{FleetDeps, FleetManager};
use fj_adapters::FakeBackend;
use fj_config::{AgentDef, FleetConfig, FleetSettings};
use chrono::{DateTime, Utc};
use fj_core::{FakeClock, FleetEvent, IdGen, SequentialIdGen};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Convenience alias for the fully-typed test manager.
pub(crate) type TestManager = FleetManager<FakeBackend, FakeClock>;

/// Test context holding the manager, its fakes, and the state directory.
pub(crate) struct TestContext {
    pub manager: TestManager,
    pub backend: FakeBackend,
    pub clock: FakeClock,
    pub state_dir: PathBuf,
    _dir: TempDir,
}

/// Two agents, `worker` and `reviewer`, with a short cancel timeout.
pub(crate) fn test_config() -> FleetConfig {
    FleetConfig {
        fleet: FleetSettings {
            name: Some("test-fleet".to_string()),
            cancel_timeout_ms: 200,
            state_dir: None,
        },
        ..FleetConfig::default()
    }
    .with_agent(AgentDef {
        prompt: Some("check the build".to_string()),
        ..AgentDef::new("worker")
    })
    .with_agent(AgentDef::new("reviewer"))
}

/// Create a manager over [`test_config`] without initializing it.
pub(crate) fn setup_uninitialized() -> TestContext {
    setup_with_config(test_config())
}

pub(crate) fn setup_with_config(config: FleetConfig) -> TestContext {
    setup_with(config, SequentialIdGen::default())
}

pub(crate) fn setup_with(config: FleetConfig, ids: impl IdGen) -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().to_path_buf();
    let backend = FakeBackend::new();
    let clock = FakeClock::new();
    let manager = FleetManager::new(
        FleetDeps::new(backend.clone(), clock.clone())
            .with_ids(ids)
            .with_state_dir(&state_dir),
        config,
    );
    TestContext {
        manager,
        backend,
        clock,
        state_dir,
        _dir: dir,
    }
}

/// Create and initialize a manager over [`test_config`].
pub(crate) fn setup() -> TestContext {
    let ctx = setup_uninitialized();
    ctx.manager.initialize().unwrap();
    ctx
}

/// Record every event the manager emits.
pub(crate) fn record_events(manager: &TestManager) -> Arc<Mutex<Vec<FleetEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    manager.events().on_any(move |event| {
        sink.lock().push(event.clone());
        Ok(())
    });
    events
}

/// Event names in emission order, excluding `job:output`.
pub(crate) fn lifecycle_names(events: &Mutex<Vec<FleetEvent>>) -> Vec<&'static str> {
    events
        .lock()
        .iter()
        .map(FleetEvent::name)
        .filter(|name| *name != "job:output")
        .collect()
}

/// Hands out the given ids in order, then `job-1`, `job-2`, ...
pub(crate) struct ScriptedIds {
    ids: Mutex<VecDeque<String>>,
    rest: SequentialIdGen,
}

impl ScriptedIds {
    pub(crate) fn new<const N: usize>(ids: [&str; N]) -> Self {
        Self {
            ids: Mutex::new(ids.iter().map(|id| id.to_string()).collect()),
            rest: SequentialIdGen::default(),
        }
    }
}

impl IdGen for ScriptedIds {
    fn next(&self, now: DateTime<Utc>) -> String {
        let scripted = self.ids.lock().pop_front();
        scripted.unwrap_or_else(|| self.rest.next(now))
    }
}
