// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.

use crate::ConfigError;
use std::path::PathBuf;

/// Resolve state directory: FJ_STATE_DIR > XDG_STATE_HOME/fj > ~/.local/state/fj
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("FJ_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("fj"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/fj"))
}

/// Default configuration file, from `FJ_CONFIG`.
pub fn config_path() -> Option<PathBuf> {
    std::env::var("FJ_CONFIG").ok().map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
