// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent session persistence.
//!
//! One JSON file per agent under `<state_dir>/sessions/<agent>.json`.
//! The store does no locking of its own: callers serialize updates per
//! agent name.

use crate::atomic::{is_safe_key, read_json, write_json};
use crate::StoreError;
use chrono::{DateTime, Utc};
use fj_core::{SessionId, SessionMode, SessionRecord};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Open (creating if needed) the session directory under `state_dir`.
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        let dir = state_dir.join("sessions");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, agent_name: &str) -> Result<PathBuf, StoreError> {
        if !is_safe_key(agent_name) {
            return Err(StoreError::InvalidKey(agent_name.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", agent_name)))
    }

    /// The stored record for an agent, expired or not.
    pub fn get(&self, agent_name: &str) -> Result<Option<SessionRecord>, StoreError> {
        read_json(&self.path_for(agent_name)?)
    }

    /// The stored record if it can still be resumed at `now`.
    pub fn get_valid(
        &self,
        agent_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self
            .get(agent_name)?
            .filter(|record| !record.is_expired(now)))
    }

    pub fn put(&self, record: &SessionRecord) -> Result<(), StoreError> {
        write_json(&self.path_for(&record.agent_name)?, record)
    }

    /// Create-or-update the agent's session after a job used it.
    ///
    /// Refreshes `last_used_at`, increments `job_count`, and replaces the
    /// session id if the backend issued a new one.
    pub fn record_use(
        &self,
        agent_name: &str,
        session_id: SessionId,
        mode: SessionMode,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, StoreError> {
        let record = match self.get(agent_name)? {
            Some(mut record) => {
                record.touch(session_id, now);
                record.mode = mode;
                record
            }
            None => SessionRecord::new(agent_name, session_id, mode, now),
        };
        self.put(&record)?;
        tracing::debug!(
            agent = agent_name,
            session_id = %record.session_id,
            job_count = record.job_count,
            "session recorded"
        );
        Ok(record)
    }

    /// Forget an agent's session so the next job starts fresh.
    ///
    /// Returns whether a record existed.
    pub fn clear(&self, agent_name: &str) -> Result<bool, StoreError> {
        match fs::remove_file(self.path_for(agent_name)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// All stored records, sorted by agent name.
    pub fn list(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(record) = read_json::<SessionRecord>(&path)? {
                records.push(record);
            }
        }
        records.sort_by(|a, b| a.agent_name.cmp(&b.agent_name));
        Ok(records)
    }
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;
