//! Types for the process module.

use std::fmt;

use crate::events::RunEvent;

/// A single execution request for an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Name reported in `close` events and logs (the stage script).
    pub stage: String,
    /// Program to execute.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(
        stage: impl Into<String>,
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            stage: stage.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Stream a line of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputOrigin {
    Stdout,
    Stderr,
}

/// One line of process output, trailing whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub origin: OutputOrigin,
    pub text: String,
}

impl OutputLine {
    pub fn new(origin: OutputOrigin, text: impl Into<String>) -> Self {
        Self {
            origin,
            text: text.into(),
        }
    }

    pub fn stdout(text: impl Into<String>) -> Self {
        Self::new(OutputOrigin::Stdout, text)
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self::new(OutputOrigin::Stderr, text)
    }

    pub fn into_event(self) -> RunEvent {
        match self.origin {
            OutputOrigin::Stdout => RunEvent::stdout(self.text),
            OutputOrigin::Stderr => RunEvent::stderr(self.text),
        }
    }
}

/// How a stage process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Exited with status zero.
    Success,
    /// Exited nonzero, or was killed (`code` is `None` for signals).
    Failure { code: Option<i32>, message: String },
    /// Never started; there is no exit status.
    LaunchFailure { message: String },
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Exit status, if the process ran to termination.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Success => Some(0),
            Self::Failure { code, .. } => *code,
            Self::LaunchFailure { .. } => None,
        }
    }
}
