//! Observation lifecycle: which workflow instance is watched right now.
//!
//! At most one instance is observed at a time. Switching instances stops
//! the previous poll loop and waits for it before a fresh session (new
//! seen-key set, new log) is created, so nothing from an abandoned instance
//! is ever reconciled into the active one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::GlobalConfig;
use crate::engine::WorkflowEngine;
use crate::journal::LogJournal;
use crate::reconcile::dispatcher::CommandDispatcher;
use crate::reconcile::events::{Publisher, WatchEvent};
use crate::reconcile::poller::{Poller, PollerHandle};
use crate::reconcile::progress::ProgressMapper;
use crate::reconcile::session::{ObservationSession, SharedSession};
use crate::{AppError, Result};

/// Loop cadence and status conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Delay between poll cycles.
    pub poll_interval: Duration,
    /// Engine status code signalling a critical halt.
    pub critical_halt_status: String,
}

impl MonitorSettings {
    /// Settings taken from the global configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            critical_halt_status: config.hitl.critical_halt_status.clone(),
        }
    }
}

struct Observation {
    session: SharedSession,
    dispatcher: CommandDispatcher,
    poller: PollerHandle,
}

/// Owns the engine connection and the single active observation.
pub struct Monitor {
    engine: Arc<dyn WorkflowEngine>,
    settings: MonitorSettings,
    events: mpsc::Sender<WatchEvent>,
    journal: Option<Arc<dyn LogJournal>>,
    active: Option<Observation>,
}

impl Monitor {
    /// Monitor publishing every update on `events`.
    #[must_use]
    pub fn new(
        engine: Arc<dyn WorkflowEngine>,
        settings: MonitorSettings,
        events: mpsc::Sender<WatchEvent>,
    ) -> Self {
        Self {
            engine,
            settings,
            events,
            journal: None,
            active: None,
        }
    }

    /// Also persist accepted log entries to `journal`.
    #[must_use]
    pub fn with_journal(mut self, journal: Arc<dyn LogJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Start a new workflow instance for `scenario_id` and observe it.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the instance cannot be created; the
    /// current observation is left untouched in that case.
    pub async fn create_instance(&mut self, scenario_id: &str) -> Result<String> {
        let instance_id = self.engine.create_instance(scenario_id).await?;
        info!(scenario_id, %instance_id, "workflow instance created");
        self.observe(&instance_id).await;
        Ok(instance_id)
    }

    /// Observe `instance_id` from now on, discarding the previous session.
    pub async fn observe(&mut self, instance_id: &str) {
        self.stop().await;

        let mapper = ProgressMapper::new(self.settings.critical_halt_status.clone());
        let session = ObservationSession::new(instance_id, mapper).shared();
        let publisher = Publisher::new(instance_id, self.events.clone(), self.journal.clone());
        let dispatcher = CommandDispatcher::new(
            Arc::clone(&self.engine),
            Arc::clone(&session),
            publisher.clone(),
        );
        let poller = Poller::new(
            Arc::clone(&self.engine),
            Arc::clone(&session),
            publisher,
            self.settings.poll_interval,
            CancellationToken::new(),
        )
        .spawn();

        info!(instance_id, "observation started");
        self.active = Some(Observation {
            session,
            dispatcher,
            poller,
        });
    }

    /// Stop observing. Returns once the poll loop has exited.
    pub async fn stop(&mut self) {
        if let Some(observation) = self.active.take() {
            let instance_id = observation.poller.instance_id().to_owned();
            observation.poller.stop().await;
            info!(%instance_id, "observation stopped");
        }
    }

    /// Instance currently observed.
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.active
            .as_ref()
            .map(|observation| observation.poller.instance_id())
    }

    /// Session of the current observation.
    #[must_use]
    pub fn session(&self) -> Option<SharedSession> {
        self.active
            .as_ref()
            .map(|observation| Arc::clone(&observation.session))
    }

    /// Whether the poll loop of the current observation is still running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|observation| !observation.poller.is_finished())
    }

    /// Dispatcher bound to the current observation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotObserving`] when no instance is observed.
    pub fn dispatcher(&self) -> Result<CommandDispatcher> {
        self.active
            .as_ref()
            .map(|observation| observation.dispatcher.clone())
            .ok_or(AppError::NotObserving)
    }
}
