// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job log lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Engine bookkeeping (started, cancelled, ...)
    System,
    /// Text produced by the agent
    #[default]
    Assistant,
    /// Tool invocation or result reported by the backend
    Tool,
    Error,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogKind::System => write!(f, "system"),
            LogKind::Assistant => write!(f, "assistant"),
            LogKind::Tool => write!(f, "tool"),
            LogKind::Error => write!(f, "error"),
        }
    }
}

/// One timestamped line in a job's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// Position in the job's log, starting at 0.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub kind: LogKind,
    pub text: String,
}

impl fmt::Display for LogLine {
    /// Format: `2026-01-30T08:14:09Z [assistant] message`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
            self.kind,
            self.text
        )
    }
}
