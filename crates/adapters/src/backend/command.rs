// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess backend that drives an agent CLI in print mode.

use super::{
    parse_stream_line, BackendError, BackendOutcome, ExecutionBackend, ExecutionRequest,
    OutputChunk,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Program invoked when none is configured.
pub const DEFAULT_PROGRAM: &str = "claude";

/// Characters of stderr kept in a failure message.
const STDERR_TAIL_CHARS: usize = 500;

/// Runs each job as `<program> -p <prompt> --output-format stream-json ...`.
///
/// Stdout is parsed line by line; the last session id the CLI reports
/// becomes the job's session. The child is killed when the job is
/// cancelled or the run future is dropped.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: PathBuf,
    base_args: Vec<String>,
}

impl Default for CommandBackend {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl CommandBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    /// Arguments placed before the generated ones.
    pub fn with_base_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments for one run, after `base_args`.
    pub fn build_args(&self, request: &ExecutionRequest) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend([
            "-p".to_string(),
            request.prompt.clone(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ]);
        if let Some(session_id) = &request.session_id {
            args.extend(["--resume".to_string(), session_id.to_string()]);
        }
        if let Some(model) = &request.agent.model {
            args.extend(["--model".to_string(), model.clone()]);
        }
        if let Some(max_turns) = request.agent.max_turns {
            args.extend(["--max-turns".to_string(), max_turns.to_string()]);
        }
        args
    }

    fn command(&self, request: &ExecutionRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.build_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &request.agent.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "failed to kill backend process");
    }
}

fn tail(s: &str, max_chars: usize) -> &str {
    let s = s.trim();
    let count = s.chars().count();
    if count <= max_chars {
        return s;
    }
    match s.char_indices().nth(count - max_chars) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[async_trait]
impl ExecutionBackend for CommandBackend {
    async fn execute(
        &self,
        request: ExecutionRequest,
        output: mpsc::Sender<OutputChunk>,
        cancel: CancellationToken,
    ) -> Result<BackendOutcome, BackendError> {
        let mut child = self.command(&request).spawn().map_err(|e| {
            BackendError::SpawnFailed(format!("{}: {}", self.program.display(), e))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BackendError::Io("stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| BackendError::Io("stderr not captured".to_string()))?;

        // Drain stderr concurrently so a chatty child cannot block on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut session_id = request.session_id.clone();
        let mut reported_error = None;

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    kill(&mut child).await;
                    return Err(BackendError::Cancelled);
                }
                next = lines.next_line() => next,
            };
            match next {
                Ok(Some(line)) => {
                    let parsed = parse_stream_line(&line);
                    if parsed.session_id.is_some() {
                        session_id = parsed.session_id;
                    }
                    if parsed.error.is_some() {
                        reported_error = parsed.error;
                    }
                    for chunk in parsed.chunks {
                        // A dropped receiver only means nobody is listening
                        let _ = output.send(chunk).await;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    kill(&mut child).await;
                    return Err(BackendError::Io(e.to_string()));
                }
            }
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                kill(&mut child).await;
                return Err(BackendError::Cancelled);
            }
            status = child.wait() => status.map_err(|e| BackendError::Io(e.to_string()))?,
        };
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let detail = reported_error.unwrap_or_else(|| tail(&stderr, STDERR_TAIL_CHARS).to_string());
            return Err(BackendError::Failed(if detail.is_empty() {
                format!("exited with status {}", code)
            } else {
                format!("exited with status {}: {}", code, detail)
            }));
        }
        if let Some(error) = reported_error {
            return Err(BackendError::Failed(error));
        }

        Ok(BackendOutcome { session_id })
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
