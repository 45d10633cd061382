//! Reconciliation loop for one observed workflow instance.
//!
//! The loop fetches a snapshot, folds it into the shared session, publishes
//! the resulting updates and sleeps for the poll interval. Fetches never
//! overlap: the next cycle starts only after the previous fetch resolved.
//! Fetch failures are retried on the next cycle without touching the
//! session. The loop ends on a terminal state or when its
//! [`CancellationToken`] fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::events::Publisher;
use super::session::SharedSession;
use crate::engine::WorkflowEngine;

/// Builder for a reconciliation loop.
///
/// Call [`spawn`](Self::spawn) to start the background task.
pub struct Poller {
    engine: Arc<dyn WorkflowEngine>,
    session: SharedSession,
    publisher: Publisher,
    interval: Duration,
    cancel: CancellationToken,
}

impl Poller {
    /// Construct a new poller (does not start polling yet).
    #[must_use]
    pub fn new(
        engine: Arc<dyn WorkflowEngine>,
        session: SharedSession,
        publisher: Publisher,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            engine,
            session,
            publisher,
            interval,
            cancel,
        }
    }

    /// Spawn the background loop and return a handle for controlling it.
    #[must_use]
    pub fn spawn(self) -> PollerHandle {
        let cancel = self.cancel.clone();
        let instance_id = self.publisher.instance_id().to_owned();
        let span = info_span!("poller", instance_id = %instance_id);
        let join_handle = tokio::spawn(self.run().instrument(span));
        PollerHandle {
            instance_id,
            join_handle: Some(join_handle),
            cancel,
        }
    }

    async fn run(self) {
        let instance_id = self.publisher.instance_id().to_owned();
        let mut consecutive_failures: u32 = 0;

        loop {
            if self.session.lock().await.is_terminal() {
                info!("workflow reached a terminal state; polling stopped");
                return;
            }

            let fetched = tokio::select! {
                () = self.cancel.cancelled() => {
                    debug!("poller cancelled during fetch");
                    return;
                }
                result = self.engine.fetch_snapshot(&instance_id) => result,
            };

            match fetched {
                Ok(snapshot) => {
                    consecutive_failures = 0;
                    let terminal = {
                        let mut session = self.session.lock().await;
                        if self.cancel.is_cancelled() {
                            debug!("poller cancelled; discarding fetched snapshot");
                            return;
                        }
                        let updates = session.apply(&snapshot);
                        // Publish under the guard so operator entries cannot overtake these.
                        tokio::select! {
                            () = self.cancel.cancelled() => {
                                debug!("poller cancelled while publishing");
                                return;
                            }
                            () = self.publisher.publish(updates) => {}
                        }
                        session.is_terminal()
                    };
                    if terminal {
                        info!(status = %snapshot.status, "terminal status observed; polling stopped");
                        return;
                    }
                }
                Err(err) => {
                    consecutive_failures += 1;
                    if err.is_transient() {
                        debug!(%err, consecutive_failures, "snapshot fetch failed; retrying next cycle");
                    } else {
                        warn!(%err, consecutive_failures, "snapshot fetch rejected; retrying next cycle");
                    }
                }
            }

            tokio::select! {
                () = self.cancel.cancelled() => {
                    debug!("poller cancelled between cycles");
                    return;
                }
                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

/// Handle returned from [`Poller::spawn`].
pub struct PollerHandle {
    instance_id: String,
    join_handle: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl Drop for PollerHandle {
    /// Cancel the background loop when the handle is dropped.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl PollerHandle {
    /// Instance the loop observes.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Whether the loop has exited, either on its own or after cancellation.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }

    /// Stop the loop and wait for it to exit.
    ///
    /// Once this returns, the loop publishes nothing further.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.await;
        }
    }
}
