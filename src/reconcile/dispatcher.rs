//! Operator-initiated mutations against the observed instance.
//!
//! Each command is validated against the session, sent to the engine
//! without holding the session lock, and on success reflected locally
//! right away. The next poll confirms the effect; the key design in
//! [`super::dedup::keys`] keeps that confirmation from logging twice.
//!
//! Updates are published while the session guard is still held, so the
//! event stream follows log append order even when the poller reconciles
//! concurrently.

use std::sync::Arc;

use tracing::{info, warn};

use super::events::Publisher;
use super::session::SharedSession;
use crate::engine::WorkflowEngine;
use crate::models::command::CommandToken;
use crate::{AppError, Result};

/// Sends decisions, withdrawals and pause directives for one session.
#[derive(Clone)]
pub struct CommandDispatcher {
    engine: Arc<dyn WorkflowEngine>,
    session: SharedSession,
    publisher: Publisher,
}

impl CommandDispatcher {
    /// Dispatcher bound to `session`.
    #[must_use]
    pub fn new(engine: Arc<dyn WorkflowEngine>, session: SharedSession, publisher: Publisher) -> Self {
        Self {
            engine,
            session,
            publisher,
        }
    }

    /// Submit the operator's choice for the pending decision.
    ///
    /// Terminal commands (`CANCEL_ORDER`, `RETURN_SHIPMENT`) withdraw the
    /// instance and force the local status to cancelled. Every other command
    /// is sent as a resolution and clears the pending prompt.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnknownChoice`] without any network call when the
    /// label has no mapping, the session-state errors of
    /// [`ObservationSession::prepare_decision`](super::session::ObservationSession::prepare_decision),
    /// or the engine error when the request fails.
    pub async fn submit_decision(&self, label: &str) -> Result<CommandToken> {
        let prepared = {
            let mut session = self.session.lock().await;
            match session.prepare_decision(label) {
                Ok(prepared) => prepared,
                Err(err) => {
                    let updates = session.record_failure(rejection_message(label, &err));
                    self.publisher.publish(updates).await;
                    return Err(err);
                }
            }
        };

        info!(
            instance_id = %prepared.instance_id,
            label = %prepared.label,
            token = %prepared.token,
            "dispatching operator decision"
        );

        let sent = if prepared.token.is_terminal() {
            self.engine.withdraw(&prepared.instance_id).await
        } else {
            self.engine
                .submit_resolution(&prepared.instance_id, prepared.token)
                .await
        };

        let mut session = self.session.lock().await;
        let updates = match &sent {
            Ok(()) if prepared.token.is_terminal() => {
                session.confirm_withdrawal(Some(&prepared.label))
            }
            Ok(()) => session.confirm_decision(&prepared),
            Err(err) => {
                warn!(%err, token = %prepared.token, "decision dispatch failed");
                session.record_failure(format!(
                    "Failed to submit decision {}: {err}",
                    prepared.label
                ))
            }
        };
        self.publisher.publish(updates).await;
        drop(session);
        sent.map(|()| prepared.token)
    }

    /// Withdraw the instance.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Terminal`] if the workflow already ended, or the
    /// engine error when the withdrawal fails.
    pub async fn cancel(&self) -> Result<()> {
        let instance_id = self.ensure_active().await?;
        let sent = self.engine.withdraw(&instance_id).await;
        let mut session = self.session.lock().await;
        let updates = match &sent {
            Ok(()) => session.confirm_withdrawal(None),
            Err(err) => {
                warn!(%err, "withdrawal failed");
                session.record_failure(format!("Failed to cancel shipment: {err}"))
            }
        };
        self.publisher.publish(updates).await;
        drop(session);
        sent
    }

    /// Ask the engine to pause or resume the workflow.
    ///
    /// Polling is unaffected; the next snapshot reports when the directive
    /// took effect.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Terminal`] if the workflow already ended, or the
    /// engine error when the directive fails.
    pub async fn set_paused(&self, paused: bool) -> Result<()> {
        let instance_id = self.ensure_active().await?;
        let action = if paused { "pause" } else { "resume" };
        let sent = self.engine.set_paused(&instance_id, paused).await;
        let mut session = self.session.lock().await;
        let updates = match &sent {
            Ok(()) => session.record_request(format!("Requested {action}")),
            Err(err) => {
                warn!(%err, action, "pause directive failed");
                session.record_failure(format!("Failed to {action} workflow: {err}"))
            }
        };
        self.publisher.publish(updates).await;
        drop(session);
        sent
    }

    async fn ensure_active(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        match session.ensure_active() {
            Ok(()) => Ok(session.instance_id().to_owned()),
            Err(err) => {
                let updates = session.record_failure(format!("Command rejected: {err}"));
                self.publisher.publish(updates).await;
                Err(err)
            }
        }
    }
}

fn rejection_message(label: &str, err: &AppError) -> String {
    match err {
        AppError::UnknownChoice(_) => {
            format!("Unknown choice \"{}\"; nothing was sent", label.trim())
        }
        other => format!("Decision \"{}\" rejected: {other}", label.trim()),
    }
}
