//! Run event types and their wire encoding.

use serde::{Deserialize, Serialize};

/// Kind of a run event, serialized as the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    Info,
    Stdout,
    Stderr,
    Close,
    Error,
    End,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Info => "info",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::Close => "close",
            Self::Error => "error",
            Self::End => "end",
        }
    }

    /// Whether this kind ends a run. Nothing is pushed after a terminal event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error | Self::End)
    }
}

/// One progress record of a run.
///
/// Serializes to `{"type": ..., "message"?: ..., "code"?: ..., "script"?: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Exit status of the stage process, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    /// Stage script the event refers to.
    #[serde(rename = "script", default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl RunEvent {
    fn with_message(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            code: None,
            stage: None,
        }
    }

    pub fn start(message: impl Into<String>) -> Self {
        Self::with_message(EventKind::Start, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with_message(EventKind::Info, message)
    }

    pub fn stdout(line: impl Into<String>) -> Self {
        Self::with_message(EventKind::Stdout, line)
    }

    pub fn stderr(line: impl Into<String>) -> Self {
        Self::with_message(EventKind::Stderr, line)
    }

    /// A stage process exited. `code` is `None` when it was killed by a signal.
    pub fn close(script: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            kind: EventKind::Close,
            message: None,
            code,
            stage: Some(script.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_message(EventKind::Error, message)
    }

    pub fn end(message: impl Into<String>) -> Self {
        Self::with_message(EventKind::End, message)
    }

    /// Attach the stage this event refers to.
    pub fn for_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Attach an exit code.
    pub fn with_code(mut self, code: Option<i32>) -> Self {
        self.code = code;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }

    /// JSON payload of the event.
    pub fn to_json(&self) -> String {
        // Only strings, ints and a unit enum: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"type":"{}"}}"#, self.kind.as_str())
        })
    }

    /// One Server-Sent Events record: `data: <json>\n\n`.
    pub fn to_sse_frame(&self) -> String {
        format!("data: {}\n\n", self.to_json())
    }
}
