//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL around a fleet on disk: a config file, a state
//! directory, and managers built over them.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use fj_adapters::FakeBackend;
use fj_core::{FakeClock, FleetEvent};
use fj_engine::{FleetDeps, FleetManager, TriggerOptions, TriggerResult};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::time::Duration;

/// Upper bound on any single wait in a spec.
pub const SPEC_WAIT_MAX: Duration = Duration::from_secs(5);

/// Cancel timeout written into every spec config.
pub const SPEC_CANCEL_TIMEOUT_MS: u64 = 100;

pub type SpecManager = FleetManager<FakeBackend, FakeClock>;

/// Install a test subscriber once; honors `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

// =============================================================================
// Fleet
// =============================================================================

/// Temporary fleet: a config file and an isolated state directory.
pub struct Fleet {
    dir: tempfile::TempDir,
    pub backend: FakeBackend,
    pub clock: FakeClock,
}

impl Fleet {
    /// A fleet with agents `builder` and `auditor`.
    pub fn new() -> Self {
        Self::with_agents(&["builder", "auditor"])
    }

    pub fn with_agents(agents: &[&str]) -> Self {
        init_tracing();
        let fleet = Self {
            dir: tempfile::tempdir().unwrap(),
            backend: FakeBackend::new(),
            clock: FakeClock::new(),
        };
        fleet.write_agents(agents);
        fleet
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("fleet.toml")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    /// Rewrite the config file with exactly these agents.
    pub fn write_agents(&self, agents: &[&str]) {
        let mut content = format!(
            "[fleet]\nname = \"spec-fleet\"\ncancel_timeout_ms = {}\n",
            SPEC_CANCEL_TIMEOUT_MS
        );
        for agent in agents {
            content.push_str(&format!("\n[agents.{agent}]\nworking_dir = \"/tmp\"\n"));
        }
        std::fs::write(self.config_path(), content).unwrap();
    }

    /// A new, uninitialized manager over this fleet's files.
    pub fn manager(&self) -> SpecManager {
        FleetManager::new(
            FleetDeps::new(self.backend.clone(), self.clock.clone())
                .with_state_dir(self.state_dir()),
            self.config_path(),
        )
    }

    /// A manager that has already passed `initialize`.
    pub fn started(&self) -> SpecManager {
        let manager = self.manager();
        manager.initialize().unwrap();
        manager
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub async fn trigger(manager: &SpecManager, agent: &str) -> TriggerResult {
    manager
        .trigger(agent, None, TriggerOptions::default())
        .await
        .unwrap()
}

pub async fn trigger_with_prompt(manager: &SpecManager, agent: &str, prompt: &str) -> TriggerResult {
    manager
        .trigger(agent, None, TriggerOptions::default().prompt(prompt))
        .await
        .unwrap()
}

/// Collect every published event.
pub fn record_events(manager: &SpecManager) -> Arc<Mutex<Vec<FleetEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    manager.events().on_any(move |event| {
        sink.lock().push(event.clone());
        Ok(())
    });
    events
}

/// Poll a condition until it returns true or the timeout is reached.
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
