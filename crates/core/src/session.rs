// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversational session records.
//!
//! Each agent has at most one live session. A session is only resumed while
//! it is fresh; stale records are ignored and overwritten by the next
//! successful job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

crate::define_id! {
    /// Continuation token issued by the execution backend.
    pub struct SessionId;
}

/// How long after its last use a session may still be resumed.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How the agent's session is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Interactive,
    #[default]
    Autonomous,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Interactive => write!(f, "interactive"),
            SessionMode::Autonomous => write!(f, "autonomous"),
        }
    }
}

/// Persisted per-agent session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub agent_name: String,
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub job_count: u64,
    #[serde(default)]
    pub mode: SessionMode,
}

impl SessionRecord {
    /// A record for a session first seen at `now`, counting the job that created it.
    pub fn new(
        agent_name: impl Into<String>,
        session_id: SessionId,
        mode: SessionMode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            session_id,
            created_at: now,
            last_used_at: now,
            job_count: 1,
            mode,
        }
    }

    /// Whether the session is too old to resume at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.last_used_at).num_milliseconds() >= SESSION_TTL.as_millis() as i64
    }

    /// Record another job against this agent's session.
    ///
    /// A different `session_id` replaces the stored one; `created_at` is
    /// reset only when the session is replaced.
    pub fn touch(&mut self, session_id: SessionId, now: DateTime<Utc>) {
        if self.session_id != session_id {
            self.session_id = session_id;
            self.created_at = now;
        }
        self.last_used_at = now;
        self.job_count += 1;
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
