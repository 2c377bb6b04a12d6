//! Subprocess execution with streamed output

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::models::outcome::CommandOutcome;
use crate::models::request::ProgressSink;
use crate::process::prompt::PromptPolicy;

/// Options for one subprocess run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub cwd: PathBuf,

    /// Full replacement environment; `None` inherits the ambient one
    pub env: Option<HashMap<String, String>>,

    /// Prompt answering policy, when the command may turn interactive
    pub prompt: Option<PromptPolicy>,
}

impl RunOptions {
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            env: None,
            prompt: None,
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_prompt(mut self, prompt: PromptPolicy) -> Self {
        self.prompt = Some(prompt);
        self
    }
}

/// Runs one external command to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Spawn `program` with an argument vector (never through a shell),
    /// stream its output to `sink`, and resolve to an outcome. Spawn
    /// failures resolve to a failed outcome rather than an error.
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        options: &RunOptions,
        sink: &ProgressSink,
    ) -> CommandOutcome;
}

/// `tokio::process` backed runner
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        options: &RunOptions,
        sink: &ProgressSink,
    ) -> CommandOutcome {
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&options.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(env) = &options.env {
            command.env_clear();
            command.envs(env);
        }

        debug!("Spawning {} {}", program.display(), args.join(" "));
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", program.display(), e);
                return CommandOutcome::spawn_failure(format!(
                    "Failed to spawn {}: {}",
                    program.display(),
                    e
                ));
            }
        };

        // Without a prompt policy, close stdin immediately so the child
        // never blocks waiting for input.
        let mut stdin = child.stdin.take();
        if options.prompt.is_none() {
            stdin = None;
        }

        let (Some(mut stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return CommandOutcome::spawn_failure("Subprocess pipes were not captured");
        };
        let mut stderr_lines = BufReader::new(stderr).lines();

        let mut captured_stdout = String::new();
        let mut captured_stderr = String::new();
        // stdout is read chunk-wise: interactive prompts usually render
        // without a trailing newline, so line reads would never see them.
        let mut pending_line = String::new();
        let mut chunk = [0u8; 4096];
        let mut answered = false;
        let mut stdout_done = false;
        let mut stderr_done = false;

        while !(stdout_done && stderr_done) {
            tokio::select! {
                read = stdout.read(&mut chunk), if !stdout_done => match read {
                    Ok(0) => stdout_done = true,
                    Ok(n) => {
                        let text = String::from_utf8_lossy(&chunk[..n]);
                        captured_stdout.push_str(&text);
                        pending_line.push_str(&text);
                        while let Some(pos) = pending_line.find('\n') {
                            let line: String = pending_line.drain(..=pos).collect();
                            emit(sink, line.trim_end_matches(['\n', '\r']));
                        }
                        if !answered
                            && options
                                .prompt
                                .as_ref()
                                .is_some_and(|p| p.matches(&captured_stdout))
                        {
                            answered = true;
                            if !pending_line.is_empty() {
                                emit(sink, pending_line.trim_end());
                            }
                            if let (Some(policy), Some(mut writer)) =
                                (options.prompt.as_ref(), stdin.take())
                            {
                                tokio::time::sleep(policy.settle_delay).await;
                                if let Err(e) = writer.write_all(policy.response.as_bytes()).await {
                                    warn!("Failed to answer prompt: {}", e);
                                }
                                let _ = writer.shutdown().await;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("stdout read failed: {}", e);
                        stdout_done = true;
                    }
                },
                line = stderr_lines.next_line(), if !stderr_done => match line {
                    Ok(Some(line)) => {
                        captured_stderr.push_str(&line);
                        captured_stderr.push('\n');
                        emit(sink, &line);
                    }
                    Ok(None) => stderr_done = true,
                    Err(e) => {
                        warn!("stderr read failed: {}", e);
                        stderr_done = true;
                    }
                },
            }
        }
        if !pending_line.is_empty() {
            emit(sink, pending_line.trim_end());
        }
        drop(stdin);

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => {
                return CommandOutcome {
                    success: false,
                    stdout: captured_stdout,
                    error: Some(format!("Failed to wait for {}: {}", program.display(), e)),
                }
            }
        };

        if status.success() {
            CommandOutcome {
                success: true,
                stdout: captured_stdout,
                error: None,
            }
        } else {
            let stderr_text = captured_stderr.trim();
            let error = if stderr_text.is_empty() {
                format!("Process exited with code {}", status.code().unwrap_or(-1))
            } else {
                stderr_text.to_string()
            };
            CommandOutcome {
                success: false,
                stdout: captured_stdout,
                error: Some(error),
            }
        }
    }
}

/// Mirror one raw output line to the diagnostic log and the caller's sink
fn emit(sink: &ProgressSink, line: &str) {
    if line.is_empty() {
        return;
    }
    debug!(target: "shipwright::process", "{}", line);
    (sink)(line);
}
