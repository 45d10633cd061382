//! Durable export of accepted log entries.
//!
//! Provides the [`LogJournal`] trait. The primary implementation,
//! [`writer::JsonlJournal`], keeps one JSONL file per workflow instance.

pub mod writer;

use serde::{Deserialize, Serialize};

use crate::models::log::LogEntry;
use crate::Result;

/// One journal line: a log entry tagged with its instance and position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalRecord {
    /// Workflow instance the entry was recorded for.
    pub instance_id: String,
    /// Zero-based position of the entry within the instance's journal.
    pub seq: u64,
    /// The accepted entry.
    #[serde(flatten)]
    pub entry: LogEntry,
}

/// Sink for accepted log entries.
pub trait LogJournal: Send + Sync {
    /// Persist one entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the entry cannot be written.
    fn record(&self, instance_id: &str, entry: &LogEntry) -> Result<()>;
}
