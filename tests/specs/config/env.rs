//! Environment resolution specs.
//!
//! These mutate process environment variables, so they run serially.

use crate::prelude::*;
use fj_config::ConfigSource;
use fj_engine::{FleetDeps, FleetManager};
use serial_test::serial;

#[tokio::test]
#[serial(env)]
async fn state_dir_comes_from_environment_when_not_configured() {
    let fleet = Fleet::new();
    let state = fleet.path().join("env-state");
    std::env::set_var("FJ_STATE_DIR", &state);

    let manager = FleetManager::new(
        FleetDeps::new(fleet.backend.clone(), fleet.clock.clone()),
        fleet.config_path(),
    );
    manager.initialize().unwrap();
    trigger(&manager, "builder").await;
    std::env::remove_var("FJ_STATE_DIR");

    assert!(state.join("jobs").is_dir());
    assert!(state.join("sessions/builder.json").is_file());
}

#[test]
#[serial(env)]
fn config_source_comes_from_environment() {
    let fleet = Fleet::new();
    std::env::set_var("FJ_CONFIG", fleet.config_path());

    let source = ConfigSource::from_env().unwrap();
    std::env::remove_var("FJ_CONFIG");

    let config = source.load().unwrap();
    assert_eq!(config.fleet.name.as_deref(), Some("spec-fleet"));
    assert_eq!(config.fleet.cancel_timeout_ms, SPEC_CANCEL_TIMEOUT_MS);
}
