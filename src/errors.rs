//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Transport-level failure talking to the workflow engine.
    Http(String),
    /// Response body could not be decoded.
    Decode(String),
    /// Workflow engine answered with a non-success status.
    Engine {
        /// HTTP status code returned by the engine.
        status: u16,
        /// Response body or short description.
        message: String,
    },
    /// Choice label has no entry in the command table.
    UnknownChoice(String),
    /// A decision was submitted while no decision is pending.
    NoPendingDecision(String),
    /// The pending prompt does not offer the submitted choice.
    NotOffered(String),
    /// The workflow hit a critical halt and accepts no further decisions.
    Halted(String),
    /// The observed instance already reached a terminal state.
    Terminal(String),
    /// No workflow instance is currently being observed.
    NotObserving,
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// Whether the failure is recoverable by simply trying again on the
    /// next poll cycle.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Decode(_) => true,
            Self::Engine { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Http(msg) => write!(f, "http: {msg}"),
            Self::Decode(msg) => write!(f, "decode: {msg}"),
            Self::Engine { status, message } => write!(f, "engine: {status} {message}"),
            Self::UnknownChoice(label) => write!(f, "unknown choice: {label}"),
            Self::NoPendingDecision(msg) => write!(f, "no pending decision: {msg}"),
            Self::NotOffered(msg) => write!(f, "not offered: {msg}"),
            Self::Halted(msg) => write!(f, "halted: {msg}"),
            Self::Terminal(msg) => write!(f, "terminal: {msg}"),
            Self::NotObserving => write!(f, "not observing: no active workflow instance"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Engine {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
