// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where the fleet configuration comes from.

use crate::{load_config, validate, ConfigError, FleetConfig};
use std::path::PathBuf;

/// Location of the fleet configuration, re-read on every reload.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    File(PathBuf),
    Inline(FleetConfig),
}

impl ConfigSource {
    /// `FJ_CONFIG` if set.
    pub fn from_env() -> Option<Self> {
        crate::env::config_path().map(ConfigSource::File)
    }

    pub fn load(&self) -> Result<FleetConfig, ConfigError> {
        match self {
            ConfigSource::File(path) => load_config(path),
            ConfigSource::Inline(config) => {
                validate(config)?;
                Ok(config.clone())
            }
        }
    }
}

impl From<FleetConfig> for ConfigSource {
    fn from(config: FleetConfig) -> Self {
        ConfigSource::Inline(config)
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::File(path)
    }
}
