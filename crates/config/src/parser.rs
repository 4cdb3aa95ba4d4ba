// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet configuration parsing (TOML and JSON)

use crate::{AgentCatalog, AgentDef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default bound on how long `cancel_job` waits for a graceful stop.
pub const DEFAULT_CANCEL_TIMEOUT_MS: u64 = 10_000;

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Pick a format from a file extension; anything but `.json` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid format for {location}: {message}")]
    InvalidFormat { location: String, message: String },

    #[error("could not resolve state directory (set FJ_STATE_DIR or HOME)")]
    NoStateDir,
}

/// Fleet-wide settings (`[fleet]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_cancel_timeout_ms")]
    pub cancel_timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

fn default_cancel_timeout_ms() -> u64 {
    DEFAULT_CANCEL_TIMEOUT_MS
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            name: None,
            cancel_timeout_ms: DEFAULT_CANCEL_TIMEOUT_MS,
            state_dir: None,
        }
    }
}

impl FleetSettings {
    pub fn cancel_timeout(&self) -> Duration {
        Duration::from_millis(self.cancel_timeout_ms)
    }
}

/// A parsed fleet configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub fleet: FleetSettings,
    #[serde(default, alias = "agent")]
    pub agents: BTreeMap<String, AgentDef>,
}

impl FleetConfig {
    /// Add an agent definition (builder style, used when assembling config in code).
    pub fn with_agent(mut self, agent: AgentDef) -> Self {
        self.agents.insert(agent.name.clone(), agent);
        self
    }

    /// Remove an agent definition, returning it if present.
    pub fn remove_agent(&mut self, name: &str) -> Option<AgentDef> {
        self.agents.remove(name)
    }
}

impl AgentCatalog for FleetConfig {
    fn agent(&self, name: &str) -> Option<AgentDef> {
        self.agents.get(name).cloned()
    }

    fn agent_names(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }
}

/// Parse a fleet configuration from TOML content (convenience wrapper)
pub fn parse_config(content: &str) -> Result<FleetConfig, ConfigError> {
    parse_config_with_format(content, Format::Toml)
}

/// Parse a fleet configuration from the given content in the specified format
pub fn parse_config_with_format(content: &str, format: Format) -> Result<FleetConfig, ConfigError> {
    // 1. Serde does the heavy lifting
    let mut config: FleetConfig = match format {
        Format::Toml => toml::from_str(content)?,
        Format::Json => serde_json::from_str(content)?,
    };

    // 2. Name fixup: inject map keys into .name fields
    for (name, agent) in &mut config.agents {
        agent.name = name.clone();
    }

    validate(&config)?;
    Ok(config)
}

/// Read and parse a configuration file, picking the format from its extension.
pub fn load_config(path: &Path) -> Result<FleetConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config_with_format(&content, Format::from_path(path))?;
    tracing::debug!(
        path = %path.display(),
        agents = config.agents.len(),
        "loaded fleet config"
    );
    Ok(config)
}

/// Check settings and agent names. Every loaded or applied config passes
/// through here.
pub fn validate(config: &FleetConfig) -> Result<(), ConfigError> {
    if config.fleet.cancel_timeout_ms == 0 {
        return Err(ConfigError::InvalidFormat {
            location: "fleet.cancel_timeout_ms".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    // Agent names key on-disk session files
    for name in config.agents.keys() {
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidFormat {
                location: "agent".to_string(),
                message: "agent name must not be empty".to_string(),
            });
        }
        if name.contains(['/', '\\']) || name.contains("..") {
            return Err(ConfigError::InvalidFormat {
                location: format!("agent.{}", name),
                message: "agent name must not contain path separators or '..'".to_string(),
            });
        }
    }

    for (name, agent) in &config.agents {
        if agent.max_turns == Some(0) {
            return Err(ConfigError::InvalidFormat {
                location: format!("agent.{}.max_turns", name),
                message: "must be greater than zero".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
