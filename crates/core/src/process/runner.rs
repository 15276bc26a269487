//! Tokio child-process runner.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, error, info, warn};

use super::error::ProcessError;
use super::traits::ProcessRunner;
use super::types::{Invocation, OutputLine, OutputOrigin, ProcessOutcome};
use crate::events::{EventStream, RunEvent};

/// Configuration for [`CommandRunner`].
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Working directory for spawned processes. `None` inherits the server's.
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables.
    pub env: BTreeMap<String, String>,
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    config: RunnerConfig,
}

impl CommandRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Start the process without waiting for it.
    pub fn spawn(&self, invocation: &Invocation) -> Result<RunningProcess, ProcessError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.config.working_dir {
            if !dir.is_dir() {
                return Err(ProcessError::WorkingDirMissing { path: dir.clone() });
            }
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| ProcessError::from_spawn(&invocation.program, e))?;

        let stdout = child.stdout.take().map(LineReader::new);
        let stderr = child.stderr.take().map(LineReader::new);

        debug!(pid = child.id(), "Spawned {}", invocation);

        Ok(RunningProcess {
            stage: invocation.stage.clone(),
            child,
            stdout,
            stderr,
        })
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    fn name(&self) -> &str {
        "command"
    }

    async fn run(&self, invocation: &Invocation, events: &EventStream) -> ProcessOutcome {
        info!("Starting {}", invocation);

        let mut process = match self.spawn(invocation) {
            Ok(process) => process,
            Err(e) => {
                error!("{} failed to start: {}", invocation.stage, e);
                return ProcessOutcome::LaunchFailure {
                    message: format!("{} failed to start: {}", invocation.stage, e),
                };
            }
        };

        while let Some(line) = process.next_output().await {
            match line.origin {
                OutputOrigin::Stdout => info!(stage = %invocation.stage, "[stdout] {}", line.text),
                OutputOrigin::Stderr => warn!(stage = %invocation.stage, "[stderr] {}", line.text),
            }
            events.push(line.into_event()).await;
        }

        let outcome = process.wait().await;
        info!(
            "{} finished with exit code {:?}",
            invocation.stage,
            outcome.code()
        );
        events
            .push(RunEvent::close(&invocation.stage, outcome.code()))
            .await;
        outcome
    }
}

/// A started child process whose output is consumed incrementally.
#[derive(Debug)]
pub struct RunningProcess {
    stage: String,
    child: Child,
    stdout: Option<LineReader<ChildStdout>>,
    stderr: Option<LineReader<ChildStderr>>,
}

impl RunningProcess {
    /// OS process id, while the process is running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Next line from either stream, in the order lines become available.
    ///
    /// Returns `None` once both streams reached end of file. Blank lines are
    /// skipped.
    pub async fn next_output(&mut self) -> Option<OutputLine> {
        loop {
            let (origin, result) = match (self.stdout.as_mut(), self.stderr.as_mut()) {
                (None, None) => return None,
                (Some(out), None) => (OutputOrigin::Stdout, out.next_line().await),
                (None, Some(err)) => (OutputOrigin::Stderr, err.next_line().await),
                (Some(out), Some(err)) => tokio::select! {
                    line = out.next_line() => (OutputOrigin::Stdout, line),
                    line = err.next_line() => (OutputOrigin::Stderr, line),
                },
            };

            match result {
                Ok(Some(line)) => {
                    let text = line.trim_end();
                    if !text.is_empty() {
                        return Some(OutputLine::new(origin, text));
                    }
                }
                Ok(None) => self.finish(origin),
                Err(e) => {
                    warn!("{}: failed reading {:?}: {}", self.stage, origin, e);
                    self.finish(origin);
                }
            }
        }
    }

    fn finish(&mut self, origin: OutputOrigin) {
        match origin {
            OutputOrigin::Stdout => self.stdout = None,
            OutputOrigin::Stderr => self.stderr = None,
        }
    }

    /// Wait for the process to exit.
    pub async fn wait(mut self) -> ProcessOutcome {
        // Unread output would block a child writing into a full pipe.
        self.stdout = None;
        self.stderr = None;

        match self.child.wait().await {
            Ok(status) if status.success() => ProcessOutcome::Success,
            Ok(status) => {
                let message = match status.code() {
                    Some(code) => format!("{} exited with code {}", self.stage, code),
                    None => format!("{} was terminated by a signal", self.stage),
                };
                ProcessOutcome::Failure {
                    code: status.code(),
                    message,
                }
            }
            Err(e) => ProcessOutcome::Failure {
                code: None,
                message: format!("{}: failed to wait for exit: {}", self.stage, e),
            },
        }
    }
}

/// Line reader that tolerates non-UTF-8 output and is safe to race in `select!`.
#[derive(Debug)]
struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        // Bytes read before a cancellation stay in `buf` and are picked up
        // by the next call.
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Ok(Some(line))
    }
}
