// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session resume policy
//!
//! Decides which conversational session a new job continues:
//! 1. an explicit `resume` id always wins
//! 2. otherwise the agent's stored session, if used within [`SESSION_TTL`]
//! 3. otherwise a fresh start
//!
//! [`SESSION_TTL`]: fj_core::SESSION_TTL

use chrono::{DateTime, Utc};
use fj_core::{SessionId, SessionRecord};
use serde::{Deserialize, Serialize};

/// Where a job's session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    /// Caller passed `resume`
    Explicit,
    /// Continued the agent's stored session
    Resumed,
    /// No stored session
    Fresh,
    /// A stored session existed but was too old to resume
    Expired,
    /// Inherited from the job being forked
    Inherited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResolution {
    pub session_id: Option<SessionId>,
    pub source: SessionSource,
}

pub fn resolve_session(
    explicit: Option<SessionId>,
    stored: Option<&SessionRecord>,
    now: DateTime<Utc>,
) -> SessionResolution {
    if let Some(session_id) = explicit {
        return SessionResolution {
            session_id: Some(session_id),
            source: SessionSource::Explicit,
        };
    }
    match stored {
        Some(record) if !record.is_expired(now) => SessionResolution {
            session_id: Some(record.session_id.clone()),
            source: SessionSource::Resumed,
        },
        Some(_) => SessionResolution {
            session_id: None,
            source: SessionSource::Expired,
        },
        None => SessionResolution {
            session_id: None,
            source: SessionSource::Fresh,
        },
    }
}

#[cfg(test)]
#[path = "session_policy_tests.rs"]
mod tests;
