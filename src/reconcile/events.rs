//! Delivery of session updates to consumers.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::session::SessionUpdate;
use crate::journal::LogJournal;

/// A session update tagged with the instance it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEvent {
    /// Instance the update was produced for.
    pub instance_id: String,
    /// The update itself.
    pub update: SessionUpdate,
}

/// Fans session updates out to the event channel and the optional journal.
#[derive(Clone)]
pub struct Publisher {
    instance_id: String,
    events: mpsc::Sender<WatchEvent>,
    journal: Option<Arc<dyn LogJournal>>,
}

impl Publisher {
    /// Publisher for `instance_id`.
    #[must_use]
    pub fn new(
        instance_id: impl Into<String>,
        events: mpsc::Sender<WatchEvent>,
        journal: Option<Arc<dyn LogJournal>>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            events,
            journal,
        }
    }

    /// Instance this publisher tags events with.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Journal accepted entries and forward every update in order.
    ///
    /// A closed channel or a failing journal never interrupts reconciliation.
    pub async fn publish(&self, updates: Vec<SessionUpdate>) {
        for update in updates {
            if let (Some(journal), SessionUpdate::Logged(entry)) = (&self.journal, &update) {
                if let Err(err) = journal.record(&self.instance_id, entry) {
                    warn!(instance_id = %self.instance_id, %err, "journal write failed");
                }
            }
            let event = WatchEvent {
                instance_id: self.instance_id.clone(),
                update,
            };
            if self.events.send(event).await.is_err() {
                debug!(instance_id = %self.instance_id, "watch event receiver dropped");
            }
        }
    }
}
