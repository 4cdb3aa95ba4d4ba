// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent definitions

use fj_core::SessionMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prompt used when neither the caller, the schedule, nor the agent supplies one.
pub const DEFAULT_PROMPT: &str = "Execute your configured task.";

/// A configured agent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentDef {
    /// Agent name (injected from the map key)
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Directory the backend runs the agent in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Default prompt for triggers that do not supply one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub session_mode: SessionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,
}

impl AgentDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Resolve the prompt for a run: explicit override, then schedule prompt,
    /// then the agent's default, then [`DEFAULT_PROMPT`].
    pub fn resolve_prompt(&self, explicit: Option<&str>, schedule: Option<&str>) -> String {
        explicit
            .or(schedule)
            .or(self.prompt.as_deref())
            .unwrap_or(DEFAULT_PROMPT)
            .to_string()
    }
}

/// Read access to the live agent catalog.
///
/// Re-queried on every trigger and fork; an agent that disappears on reload
/// simply stops resolving.
pub trait AgentCatalog: Send + Sync {
    fn agent(&self, name: &str) -> Option<AgentDef>;

    /// Configured agent names, sorted.
    fn agent_names(&self) -> Vec<String>;

    fn contains(&self, name: &str) -> bool {
        self.agent(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        explicit_wins    = { Some("explicit"), Some("schedule"), Some("agent"), "explicit" },
        schedule_next    = { None,             Some("schedule"), Some("agent"), "schedule" },
        agent_default    = { None,             None,             Some("agent"), "agent" },
        builtin_fallback = { None,             None,             None,          DEFAULT_PROMPT },
    )]
    fn prompt_precedence(
        explicit: Option<&str>,
        schedule: Option<&str>,
        agent_prompt: Option<&str>,
        expected: &str,
    ) {
        let agent = AgentDef {
            prompt: agent_prompt.map(str::to_string),
            ..AgentDef::new("reviewer")
        };
        assert_eq!(agent.resolve_prompt(explicit, schedule), expected);
    }
}
