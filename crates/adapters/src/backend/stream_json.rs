// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsing for the agent CLI's `stream-json` output.

use super::OutputChunk;
use fj_core::{LogKind, SessionId};

/// What a single stdout line contributed to the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamLine {
    /// Session id reported by the CLI, if this record carried one
    pub session_id: Option<SessionId>,
    pub chunks: Vec<OutputChunk>,
    /// Set when the final `result` record reports an error
    pub error: Option<String>,
}

fn get_str<'a>(obj: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(|v| v.as_str())
}

/// Parse one line of backend stdout.
///
/// Lines that are not JSON objects are passed through as assistant text so
/// plain-text programs still produce a readable log.
pub fn parse_stream_line(line: &str) -> StreamLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return StreamLine::default();
    }

    let json = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(v) if v.is_object() => v,
        _ => {
            return StreamLine {
                chunks: vec![OutputChunk::assistant(trimmed)],
                ..StreamLine::default()
            }
        }
    };

    let mut parsed = StreamLine {
        session_id: get_str(&json, "session_id").map(SessionId::new),
        ..StreamLine::default()
    };

    match get_str(&json, "type").unwrap_or("") {
        "assistant" => {
            let content = json
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_array());
            for block in content.into_iter().flatten() {
                match get_str(block, "type") {
                    Some("text") => {
                        if let Some(text) = get_str(block, "text").map(str::trim) {
                            if !text.is_empty() {
                                parsed.chunks.push(OutputChunk::assistant(text));
                            }
                        }
                    }
                    Some("tool_use") => {
                        let name = get_str(block, "name").unwrap_or("tool");
                        parsed
                            .chunks
                            .push(OutputChunk::new(LogKind::Tool, describe_tool(name, block)));
                    }
                    _ => {}
                }
            }
        }
        "result" => {
            if json.get("is_error").and_then(|v| v.as_bool()) == Some(true) {
                let message = get_str(&json, "result")
                    .or_else(|| get_str(&json, "subtype"))
                    .unwrap_or("agent reported an error")
                    .to_string();
                parsed
                    .chunks
                    .push(OutputChunk::new(LogKind::Error, message.clone()));
                parsed.error = Some(message);
            }
        }
        "system" => {
            if get_str(&json, "subtype") == Some("init") {
                if let Some(id) = &parsed.session_id {
                    parsed.chunks.push(OutputChunk::new(
                        LogKind::System,
                        format!("session {}", id),
                    ));
                }
            }
        }
        _ => {}
    }

    parsed
}

fn describe_tool(name: &str, block: &serde_json::Value) -> String {
    let input = block.get("input");
    let detail = input.and_then(|i| {
        get_str(i, "command")
            .or_else(|| get_str(i, "file_path"))
            .or_else(|| get_str(i, "pattern"))
    });
    match detail {
        Some(detail) => format!("{}: {}", name, detail),
        None => name.to_string(),
    }
}

#[cfg(test)]
#[path = "stream_json_tests.rs"]
mod tests;
