//! Per-instance JSONL journal.
//!
//! Every workflow instance gets its own `<dir>/<instance>.jsonl`. Records
//! carry a sequence number that keeps counting across restarts, so an
//! instance observed twice ends up with one gap-free history.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::{JournalRecord, LogJournal};
use crate::models::log::LogEntry;
use crate::{AppError, Result};

/// Open file of one instance and the sequence number of its next record.
struct InstanceFile {
    writer: LineWriter<File>,
    next_seq: u64,
}

/// A JSONL journal with one file per workflow instance.
pub struct JsonlJournal {
    dir: PathBuf,
    files: Mutex<HashMap<String, InstanceFile>>,
}

impl JsonlJournal {
    /// Construct a journal that stores files in `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the directory cannot be created.
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Io(format!(
                "failed to create journal directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self {
            dir,
            files: Mutex::new(HashMap::new()),
        })
    }

    /// Path of the file holding `instance_id`'s entries.
    ///
    /// Characters outside `[A-Za-z0-9_-]` are replaced with `_` so an id can
    /// never escape the journal directory.
    #[must_use]
    pub fn path_for(&self, instance_id: &str) -> PathBuf {
        let stem: String = instance_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{stem}.jsonl"))
    }

    fn open(path: &Path) -> Result<InstanceFile> {
        let next_seq = match File::open(path) {
            Ok(existing) => BufReader::new(existing)
                .lines()
                .map_while(std::result::Result::ok)
                .filter(|line| !line.trim().is_empty())
                .count() as u64,
            Err(_) => 0,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AppError::Io(format!("failed to open journal {}: {e}", path.display())))?;
        debug!(path = %path.display(), next_seq, "journal file opened");
        Ok(InstanceFile {
            writer: LineWriter::new(file),
            next_seq,
        })
    }
}

impl LogJournal for JsonlJournal {
    fn record(&self, instance_id: &str, entry: &LogEntry) -> Result<()> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| AppError::Io("journal mutex poisoned".to_owned()))?;

        if !files.contains_key(instance_id) {
            let opened = Self::open(&self.path_for(instance_id))?;
            files.insert(instance_id.to_owned(), opened);
        }
        let Some(file) = files.get_mut(instance_id) else {
            return Err(AppError::Io(format!("journal for {instance_id} unavailable")));
        };

        let record = JournalRecord {
            instance_id: instance_id.to_owned(),
            seq: file.next_seq,
            entry: entry.clone(),
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| AppError::Io(format!("failed to serialize journal record: {e}")))?;
        writeln!(file.writer, "{line}").map_err(|e| {
            warn!(instance_id, seq = record.seq, "journal write failed: {e}");
            AppError::Io(format!("journal write failed: {e}"))
        })?;
        file.next_seq += 1;
        Ok(())
    }
}
