// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fj-core: shared types for the fleet job engine

pub mod clock;
pub mod event;
pub mod id;
pub mod job;
pub mod log;
pub mod session;

pub use clock::{Clock, SystemClock};
pub use event::{FleetEvent, TerminationType};
pub use id::{DatedIdGen, IdGen, SequentialIdGen};
pub use job::{Job, JobConfig, JobId, JobStatus, TransitionError, TriggerKind};
pub use log::{LogKind, LogLine};
pub use session::{SessionId, SessionMode, SessionRecord, SESSION_TTL};

#[cfg(any(test, feature = "test-support"))]
pub use clock::{FakeClock, FAKE_CLOCK_START_MS};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
