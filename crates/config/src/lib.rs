// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Fleet configuration: agent catalog, settings, and file loading

mod agent;
pub mod env;
mod parser;
mod source;

pub use agent::{AgentCatalog, AgentDef, DEFAULT_PROMPT};
pub use parser::{
    load_config, parse_config, parse_config_with_format, validate, ConfigError, FleetConfig,
    FleetSettings, Format, DEFAULT_CANCEL_TIMEOUT_MS,
};
pub use source::ConfigSource;
