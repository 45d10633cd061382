//! User-facing log entries and terminal banners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presentation class of a log entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Ordinary progress.
    Info,
    /// A stage or decision completed well.
    Success,
    /// Something needs attention but the workflow continues.
    Warning,
    /// A failure or a non-recoverable end state.
    Error,
    /// Operator involvement: a decision requested or submitted.
    Human,
    /// Automated handling on the engine side.
    Ai,
}

impl Severity {
    /// Short uppercase tag used by text renderers.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "OK",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
            Self::Human => "HUMAN",
            Self::Ai => "AI",
        }
    }
}

/// One accepted entry of the append-only session log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    /// Time the entry was accepted.
    pub timestamp: DateTime<Utc>,
    /// Human-readable message.
    pub message: String,
    /// Presentation class.
    pub severity: Severity,
}

impl LogEntry {
    /// Construct an entry stamped with the current time.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            severity,
        }
    }
}

/// Kind of terminal state the observed workflow ended in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminalKind {
    /// Shipment reached the recipient.
    Delivered,
    /// Shipment was withdrawn.
    Cancelled,
    /// Engine stopped the workflow after an unanswered critical decision.
    Halted,
}

/// Persistent end-of-workflow notice, kept apart from ordinary log lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerminalBanner {
    /// Terminal state reached.
    pub kind: TerminalKind,
    /// Text to display.
    pub message: String,
}
