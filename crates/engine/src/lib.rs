// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Fleet job control engine: triggering, cancelling, forking, and
//! streaming agent jobs

mod error;
mod event_bus;
mod executor;
mod in_flight;
mod keyed_lock;
mod log_stream;
mod manager;
mod session_policy;

#[cfg(test)]
mod test_helpers;

pub use error::{FleetError, ForkFailure};
pub use event_bus::{EventBus, ListenerError, SubscriptionId};
pub use log_stream::LogStream;
pub use manager::{
    CancelOptions, CancelResult, FleetDeps, FleetManager, FleetStatus, ForkOptions, ForkResult,
    ScheduleContext, StreamOptions, TriggerOptions, TriggerResult, INTERRUPTED_ERROR,
};
pub use session_policy::{resolve_session, SessionResolution, SessionSource};
