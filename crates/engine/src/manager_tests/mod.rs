// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod cancel;
mod fork;
mod lifecycle;
mod stream;
mod trigger;

use super::*;
use crate::error::ForkFailure;
use crate::session_policy::SessionSource;
use crate::test_helpers::{
    lifecycle_names, record_events, setup, setup_uninitialized, setup_with, setup_with_config,
    test_config, ScriptedIds, TestContext, TestManager,
};
use fj_adapters::{FakeBehavior, FakeRun};
use fj_core::{JobStatus, TerminationType, TriggerKind, SESSION_TTL};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Notify;

/// Upper bound on any single wait in these tests.
const WAIT: Duration = Duration::from_secs(5);

/// Run `trigger` on a background task.
fn spawn_trigger(manager: &TestManager, agent: &str) -> TriggerHandle {
    let manager = manager.clone();
    let agent = agent.to_string();
    tokio::spawn(async move {
        manager
            .trigger(&agent, None, TriggerOptions::default())
            .await
    })
}

/// Wait for the next event with the given name.
async fn wait_for_event(rx: &mut UnboundedReceiver<FleetEvent>, name: &str) -> FleetEvent {
    tokio::time::timeout(WAIT, async {
        loop {
            let event = rx.recv().await.expect("event bus closed");
            if event.name() == name {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
}

type TriggerHandle = tokio::task::JoinHandle<Result<TriggerResult, FleetError>>;

/// Trigger `worker` with the given run and wait until it is running.
async fn start_running(ctx: &TestContext, run: FakeRun) -> (JobId, TriggerHandle) {
    let (_, mut rx) = ctx.manager.events().channel();
    ctx.backend.push_run(run);
    let handle = spawn_trigger(&ctx.manager, "worker");
    let started = wait_for_event(&mut rx, "job:started").await;
    let job_id = started.job_id().cloned().unwrap();
    (job_id, handle)
}
