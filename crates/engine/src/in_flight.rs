// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-flight executor table.

use fj_core::{Job, JobId};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Observable progress of a running job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Progress {
    /// Log lines appended so far
    pub lines: u64,
    /// Set once the job's final state is persisted
    pub terminal: bool,
}

/// Live handle for one executing job.
///
/// `job` is the job's exclusive section: every status transition happens
/// while holding it.
pub(crate) struct InFlightJob {
    pub job: tokio::sync::Mutex<Job>,
    /// Cooperative stop request passed to the backend
    pub cancel: CancellationToken,
    /// Drops the backend call without waiting for it
    pub hard_stop: CancellationToken,
    /// Set with the final state when the backend call was dropped
    forced: AtomicBool,
    progress: watch::Sender<Progress>,
}

impl InFlightJob {
    pub(crate) fn new(job: Job) -> Arc<Self> {
        let (progress, _) = watch::channel(Progress::default());
        Arc::new(Self {
            job: tokio::sync::Mutex::new(job),
            cancel: CancellationToken::new(),
            hard_stop: CancellationToken::new(),
            forced: AtomicBool::new(false),
            progress,
        })
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Called after a line is durably appended to the job's log.
    pub(crate) fn line_appended(&self) {
        self.progress.send_modify(|p| p.lines += 1);
    }

    pub(crate) fn mark_terminal(&self, forced: bool) {
        self.forced.store(forced, Ordering::SeqCst);
        self.progress.send_modify(|p| p.terminal = true);
    }

    /// Whether the recorded stop was forced. Meaningful once terminal.
    pub(crate) fn was_forced(&self) -> bool {
        self.forced.load(Ordering::SeqCst)
    }
}

/// Resolves once the job is terminal (or its handle is gone).
pub(crate) async fn wait_terminal(rx: &mut watch::Receiver<Progress>) {
    // An Err means the sender was dropped, which only happens after cleanup
    let _ = rx.wait_for(|p| p.terminal).await;
}

/// Job id -> live handle, present only while the job is non-terminal.
#[derive(Default)]
pub(crate) struct InFlightTable {
    jobs: Mutex<HashMap<JobId, Arc<InFlightJob>>>,
}

impl InFlightTable {
    /// Register a handle unless the id is already taken.
    pub(crate) fn claim(&self, id: JobId, entry: Arc<InFlightJob>) -> bool {
        match self.jobs.lock().entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    pub(crate) fn get(&self, id: &str) -> Option<Arc<InFlightJob>> {
        self.jobs.lock().get(id).cloned()
    }

    pub(crate) fn remove(&self, id: &str) -> Option<Arc<InFlightJob>> {
        self.jobs.lock().remove(id)
    }

    /// Ids of every in-flight job, sorted.
    pub(crate) fn ids(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.jobs.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub(crate) fn entries(&self) -> Vec<Arc<InFlightJob>> {
        self.jobs.lock().values().cloned().collect()
    }
}
