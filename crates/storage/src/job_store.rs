// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job records and their append-only logs.
//!
//! Layout under `<state_dir>/jobs/`:
//!   `<job_id>.json` – the job record, rewritten atomically on each transition
//!   `<job_id>.log`  – JSON lines, one [`LogLine`] per line, append-only

use crate::atomic::{is_safe_key, read_json, write_json};
use crate::StoreError;
use fj_core::{Job, JobStatus, LogLine};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Read position in a job log.
///
/// Only complete (newline-terminated) lines are consumed, so a cursor never
/// lands in the middle of a line that is still being written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCursor {
    offset: u64,
}

impl LogCursor {
    /// Cursor at the start of the log.
    pub fn start() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Filter for [`JobStore::list`].
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub agent_name: Option<String>,
    pub status: Option<JobStatus>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        self.agent_name
            .as_deref()
            .map_or(true, |name| job.agent_name == name)
            && self.status.map_or(true, |status| job.status == status)
    }
}

#[derive(Debug, Clone)]
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    /// Open (creating if needed) the jobs directory under `state_dir`.
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        let dir = state_dir.join("jobs");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn record_path(&self, job_id: &str) -> Option<PathBuf> {
        is_safe_key(job_id).then(|| self.dir.join(format!("{}.json", job_id)))
    }

    fn log_path(&self, job_id: &str) -> Option<PathBuf> {
        is_safe_key(job_id).then(|| self.dir.join(format!("{}.log", job_id)))
    }

    pub fn save(&self, job: &Job) -> Result<(), StoreError> {
        let path = self
            .record_path(job.id.as_str())
            .ok_or_else(|| StoreError::InvalidKey(job.id.to_string()))?;
        write_json(&path, job)
    }

    /// Load a job record. Ids that could never name a record load as `None`.
    pub fn load(&self, job_id: &str) -> Result<Option<Job>, StoreError> {
        match self.record_path(job_id) {
            Some(path) => read_json(&path),
            None => Ok(None),
        }
    }

    pub fn exists(&self, job_id: &str) -> bool {
        self.record_path(job_id).is_some_and(|p| p.exists())
    }

    /// All matching jobs, oldest first.
    pub fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        let mut jobs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(job) = read_json::<Job>(&path)? {
                if filter.matches(&job) {
                    jobs.push(job);
                }
            }
        }
        jobs.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        Ok(jobs)
    }

    /// Append one line to the job's log.
    ///
    /// Each call opens, writes, and closes the file.
    pub fn append_log(&self, job_id: &str, line: &LogLine) -> Result<(), StoreError> {
        let path = self
            .log_path(job_id)
            .ok_or_else(|| StoreError::InvalidKey(job_id.to_string()))?;
        let mut encoded = serde_json::to_vec(line)?;
        encoded.push(b'\n');
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Every persisted line for the job, in append order.
    pub fn read_logs(&self, job_id: &str) -> Result<Vec<LogLine>, StoreError> {
        let mut cursor = LogCursor::start();
        self.read_logs_since(job_id, &mut cursor)
    }

    /// Lines appended after `cursor`, advancing it past them.
    pub fn read_logs_since(
        &self,
        job_id: &str,
        cursor: &mut LogCursor,
    ) -> Result<Vec<LogLine>, StoreError> {
        let Some(path) = self.log_path(job_id) else {
            return Ok(Vec::new());
        };
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        file.seek(SeekFrom::Start(cursor.offset))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        // Stop at the last complete line
        let Some(end) = buf.iter().rposition(|b| *b == b'\n') else {
            return Ok(Vec::new());
        };
        let complete = &buf[..=end];
        cursor.offset += complete.len() as u64;

        let mut lines = Vec::new();
        for raw in complete.split(|b| *b == b'\n').filter(|l| !l.is_empty()) {
            match serde_json::from_slice::<LogLine>(raw) {
                Ok(line) => lines.push(line),
                Err(e) => tracing::warn!(job_id, error = %e, "skipping malformed log line"),
            }
        }
        Ok(lines)
    }

    /// Cursor positioned after every complete line currently in the log.
    pub fn log_end(&self, job_id: &str) -> Result<LogCursor, StoreError> {
        let mut cursor = LogCursor::start();
        self.read_logs_since(job_id, &mut cursor)?;
        Ok(cursor)
    }
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
