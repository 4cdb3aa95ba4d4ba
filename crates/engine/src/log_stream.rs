// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lazy log streaming: persisted history, then live lines until the job ends.

use crate::in_flight::Progress;
use fj_core::{JobId, LogLine};
use fj_storage::{JobStore, LogCursor};
use futures::Stream;
use std::collections::VecDeque;
use tokio::sync::watch;

/// Stream of a job's log lines.
///
/// Backed by a byte cursor over the job's log file plus a subscription to
/// the job's progress. Dropping the stream has no effect on the job.
pub struct LogStream {
    job_id: JobId,
    jobs: JobStore,
    cursor: LogCursor,
    /// `None` once the job is known to be finished
    progress: Option<watch::Receiver<Progress>>,
    buffered: VecDeque<LogLine>,
    done: bool,
}

impl LogStream {
    pub(crate) fn new(
        job_id: JobId,
        jobs: JobStore,
        cursor: LogCursor,
        progress: Option<watch::Receiver<Progress>>,
    ) -> Self {
        Self {
            job_id,
            jobs,
            cursor,
            progress,
            buffered: VecDeque::new(),
            done: false,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Next line, waiting for new output while the job is running.
    ///
    /// Returns `None` once the job is terminal and every line has been read.
    pub async fn next(&mut self) -> Option<LogLine> {
        loop {
            if let Some(line) = self.buffered.pop_front() {
                return Some(line);
            }
            if self.done {
                return None;
            }

            // Observe progress before reading so no append can slip between
            let terminal = match &mut self.progress {
                Some(rx) => rx.borrow_and_update().terminal,
                None => true,
            };

            match self.jobs.read_logs_since(self.job_id.as_str(), &mut self.cursor) {
                Ok(lines) => self.buffered.extend(lines),
                Err(e) => {
                    tracing::warn!(job_id = %self.job_id, error = %e, "log stream read failed");
                    self.done = true;
                    continue;
                }
            }
            if !self.buffered.is_empty() {
                continue;
            }
            if terminal {
                self.done = true;
                continue;
            }

            if let Some(rx) = &mut self.progress {
                if rx.changed().await.is_err() {
                    // Handle dropped: the job has been finalized
                    self.progress = None;
                }
            }
        }
    }

    /// Adapt into a `futures::Stream`.
    pub fn into_stream(self) -> impl Stream<Item = LogLine> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next().await.map(|line| (line, stream))
        })
    }

    /// Drain the stream to completion.
    pub async fn collect_lines(mut self) -> Vec<LogLine> {
        let mut lines = Vec::new();
        while let Some(line) = self.next().await {
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
#[path = "log_stream_tests.rs"]
mod tests;
