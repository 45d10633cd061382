//! Per-instance projection of the remote workflow.
//!
//! An [`ObservationSession`] owns everything that must be discarded when a
//! different workflow instance starts being observed: the seen-key set, the
//! append-only log, the decision gate, the displayed progress step and the
//! terminal banner. Snapshots are folded in with [`ObservationSession::apply`];
//! operator actions go through the `prepare_*` / `confirm_*` pairs used by
//! the dispatcher.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::dedup::{keys, EventDeduplicator};
use super::gate::{GateEvent, GateState, HitlGate, PendingDecision};
use super::progress::{ProgressMapper, ProgressStep, StatusMapping, Terminal};
use super::translator;
use crate::models::command::CommandToken;
use crate::models::log::{LogEntry, Severity, TerminalBanner, TerminalKind};
use crate::models::snapshot::WorkflowSnapshot;
use crate::{AppError, Result};

/// Session shared between the poll task and the dispatcher.
pub type SharedSession = Arc<Mutex<ObservationSession>>;

/// Change produced by reconciling a snapshot or an operator action.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// A log entry was accepted.
    Logged(LogEntry),
    /// The displayed progress step changed.
    Progress(ProgressStep),
    /// The gate opened on a new decision.
    DecisionRequired(PendingDecision),
    /// The workflow reached a terminal state.
    Finished(TerminalBanner),
}

/// Decision validated against the session, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDecision {
    /// Instance the decision targets.
    pub instance_id: String,
    /// Label as typed by the operator.
    pub label: String,
    /// Canonical command.
    pub token: CommandToken,
    /// Key of the pending decision being answered, if any.
    pub decision_key: Option<String>,
}

/// Local projection of one observed workflow instance.
#[derive(Debug)]
pub struct ObservationSession {
    instance_id: String,
    mapper: ProgressMapper,
    dedup: EventDeduplicator,
    gate: HitlGate,
    log: Vec<LogEntry>,
    step: Option<ProgressStep>,
    last_status: Option<String>,
    paused: bool,
    pause_flips: u32,
    banner: Option<TerminalBanner>,
}

impl ObservationSession {
    /// Fresh session for `instance_id`.
    #[must_use]
    pub fn new(instance_id: impl Into<String>, mapper: ProgressMapper) -> Self {
        Self {
            instance_id: instance_id.into(),
            mapper,
            dedup: EventDeduplicator::new(),
            gate: HitlGate::new(),
            log: Vec::new(),
            step: None,
            last_status: None,
            paused: false,
            pause_flips: 0,
            banner: None,
        }
    }

    /// Wrap the session for sharing.
    #[must_use]
    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Observed instance.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Accepted log entries in append order.
    #[must_use]
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Displayed progress step.
    #[must_use]
    pub fn step(&self) -> Option<ProgressStep> {
        self.step
    }

    /// Last status code received from the engine.
    #[must_use]
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    /// Decision gate state.
    #[must_use]
    pub fn gate(&self) -> &GateState {
        self.gate.state()
    }

    /// Pending decision prompt, if any.
    #[must_use]
    pub fn pending_decision(&self) -> Option<&PendingDecision> {
        self.gate.pending()
    }

    /// Whether the engine last reported the workflow as paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Terminal banner, once the workflow has ended.
    #[must_use]
    pub fn banner(&self) -> Option<&TerminalBanner> {
        self.banner.as_ref()
    }

    /// Whether polling must stop.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.banner.is_some()
    }

    /// Fold one snapshot into the projection.
    ///
    /// Re-applying an already reconciled snapshot produces no updates.
    pub fn apply(&mut self, snapshot: &WorkflowSnapshot) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        if self.is_terminal() {
            return updates;
        }

        let status = snapshot.status.as_str();
        self.last_status = Some(status.to_owned());

        match self.mapper.map_status(status) {
            StatusMapping::Unknown => {
                warn!(
                    instance_id = %self.instance_id,
                    status,
                    "unrecognized workflow status; keeping last step"
                );
                self.emit(
                    Some(&keys::unknown_status(status)),
                    Severity::Warning,
                    format!("Unrecognized status {status}; progress unchanged"),
                    &mut updates,
                );
            }
            StatusMapping::Known {
                step: Some(step),
                terminal: None,
            } => self.advance(step, status, &mut updates),
            StatusMapping::Known {
                step: None,
                terminal: None,
            } => {}
            StatusMapping::Known {
                step,
                terminal: Some(terminal),
            } => {
                if let Some(step) = step {
                    self.set_step(step, &mut updates);
                }
                self.finish(terminal, snapshot, &mut updates);
                return updates;
            }
        }

        let gate_events = self
            .gate
            .observe(snapshot.current_error.as_ref(), status, &mut self.dedup);
        for event in gate_events {
            self.report_gate_event(event, &mut updates);
        }

        self.observe_delivery(snapshot, &mut updates);
        self.observe_pause(snapshot.is_paused, &mut updates);
        updates
    }

    /// Validate an operator decision before anything is sent.
    ///
    /// Translation happens first so an unknown label fails regardless of the
    /// session state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnknownChoice`] for unmapped labels,
    /// [`AppError::Terminal`] once the workflow has ended,
    /// [`AppError::Halted`] after a critical halt,
    /// [`AppError::NoPendingDecision`] when a resuming command is submitted
    /// while the gate is clear and [`AppError::NotOffered`] when the pending
    /// prompt does not offer the choice. Terminal commands skip the last two
    /// checks.
    pub fn prepare_decision(&self, label: &str) -> Result<PreparedDecision> {
        let token = translator::translate(label)?;
        if self.gate.is_halted() {
            return Err(AppError::Halted(format!(
                "instance {} accepts no further decisions",
                self.instance_id
            )));
        }
        self.ensure_active()?;

        let pending = self.gate.pending();
        if !token.is_terminal() {
            match pending {
                None => {
                    return Err(AppError::NoPendingDecision(format!(
                        "instance {} is not waiting for a decision",
                        self.instance_id
                    )));
                }
                Some(pending) if !(pending.offers(label) || pending.offers_token(token)) => {
                    return Err(AppError::NotOffered(format!(
                        "\"{}\" is not among the options for {}",
                        label.trim(),
                        pending.reason
                    )));
                }
                Some(_) => {}
            }
        }
        let decision_key = pending.map(|pending| pending.key.clone());

        Ok(PreparedDecision {
            instance_id: self.instance_id.clone(),
            label: label.trim().to_owned(),
            token,
            decision_key,
        })
    }

    /// Validate that a mutation may still be sent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Terminal`] once the workflow has ended.
    pub fn ensure_active(&self) -> Result<()> {
        match &self.banner {
            Some(banner) => Err(AppError::Terminal(format!(
                "instance {} already ended: {}",
                self.instance_id, banner.message
            ))),
            None => Ok(()),
        }
    }

    /// Reflect an accepted resolution: clear the prompt and log the choice.
    pub fn confirm_decision(&mut self, decision: &PreparedDecision) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        if let Some(key) = &decision.decision_key {
            if !self.gate.clear_submitted(key) {
                debug!(
                    instance_id = %self.instance_id,
                    key,
                    "decision already cleared by a newer snapshot"
                );
            }
        }
        let severity = if decision.token == CommandToken::AiMonitorAndWait {
            Severity::Ai
        } else {
            Severity::Human
        };
        self.emit(
            None,
            severity,
            format!("Decision submitted: {} ({})", decision.label, decision.token),
            &mut updates,
        );
        updates
    }

    /// Reflect an accepted withdrawal without waiting for the next poll.
    pub fn confirm_withdrawal(&mut self, label: Option<&str>) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        if let Some(label) = label {
            self.emit(
                None,
                Severity::Human,
                format!("Decision submitted: {label}"),
                &mut updates,
            );
        }
        if self.is_terminal() {
            return updates;
        }
        self.gate.clear();
        self.set_step(ProgressStep::Cancelled, &mut updates);
        self.finish_with(
            TerminalKind::Cancelled,
            keys::CANCELLED,
            "Shipment cancelled by operator".to_owned(),
            &mut updates,
        );
        updates
    }

    /// Log an operator request that needs no confirmation from the engine.
    pub fn record_request(&mut self, message: impl Into<String>) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        self.emit(None, Severity::Human, message.into(), &mut updates);
        updates
    }

    /// Log a failed or rejected operator action.
    pub fn record_failure(&mut self, message: impl Into<String>) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        self.emit(None, Severity::Error, message.into(), &mut updates);
        updates
    }

    fn emit(
        &mut self,
        key: Option<&str>,
        severity: Severity,
        message: String,
        updates: &mut Vec<SessionUpdate>,
    ) -> bool {
        if !self.dedup.should_emit(key) {
            return false;
        }
        debug!(instance_id = %self.instance_id, ?key, ?severity, %message, "log entry accepted");
        let entry = LogEntry::new(severity, message);
        self.log.push(entry.clone());
        updates.push(SessionUpdate::Logged(entry));
        true
    }

    fn set_step(&mut self, step: ProgressStep, updates: &mut Vec<SessionUpdate>) {
        if self.step != Some(step) {
            self.step = Some(step);
            updates.push(SessionUpdate::Progress(step));
        }
    }

    fn advance(&mut self, step: ProgressStep, status: &str, updates: &mut Vec<SessionUpdate>) {
        if self.step == Some(step) {
            return;
        }
        if self.emit(
            Some(&keys::status(status)),
            Severity::Info,
            format!("Status changed to {status} ({})", step.label()),
            updates,
        ) {
            self.set_step(step, updates);
        }
    }

    fn report_gate_event(&mut self, event: GateEvent, updates: &mut Vec<SessionUpdate>) {
        match event {
            GateEvent::Opened(decision) => {
                let labels: Vec<&str> = decision
                    .options
                    .iter()
                    .map(|option| option.label.as_str())
                    .collect();
                self.emit(
                    None,
                    Severity::Human,
                    format!(
                        "Decision required ({}): {} [options: {}]",
                        decision.reason,
                        decision.details,
                        labels.join(" | ")
                    ),
                    updates,
                );
                updates.push(SessionUpdate::DecisionRequired(decision));
            }
            GateEvent::Resolved(decision) => {
                self.emit(
                    None,
                    Severity::Ai,
                    format!("Issue {} resolved by the workflow engine", decision.reason),
                    updates,
                );
            }
            GateEvent::Notice { reason, details } => {
                self.emit(None, Severity::Warning, format!("{reason}: {details}"), updates);
            }
        }
    }

    fn observe_delivery(&mut self, snapshot: &WorkflowSnapshot, updates: &mut Vec<SessionUpdate>) {
        let Some(update) = &snapshot.delivery_update else {
            return;
        };
        let Some(eta) = update.effective_eta() else {
            return;
        };
        let key = keys::delivery(&update.status, eta);
        if update.is_delayed() {
            let reason = update.delay_reason.as_deref().unwrap_or("unspecified reason");
            self.emit(
                Some(&key),
                Severity::Warning,
                format!("Delivery delayed ({reason}); new ETA {eta}"),
                updates,
            );
        } else {
            self.emit(
                Some(&key),
                Severity::Info,
                format!("Estimated delivery {eta} ({})", update.status),
                updates,
            );
        }
    }

    fn observe_pause(&mut self, paused: bool, updates: &mut Vec<SessionUpdate>) {
        if paused == self.paused {
            return;
        }
        self.paused = paused;
        self.pause_flips += 1;
        let (key, message) = if paused {
            (format!("paused-{}", self.pause_flips), "Workflow paused")
        } else {
            (format!("resumed-{}", self.pause_flips), "Workflow resumed")
        };
        self.emit(Some(&key), Severity::Info, message.to_owned(), updates);
    }

    fn finish(
        &mut self,
        terminal: Terminal,
        snapshot: &WorkflowSnapshot,
        updates: &mut Vec<SessionUpdate>,
    ) {
        let (kind, key, message) = match terminal {
            Terminal::Delivered => {
                self.gate.clear();
                (
                    TerminalKind::Delivered,
                    keys::DELIVERED,
                    "Shipment delivered".to_owned(),
                )
            }
            Terminal::Cancelled => {
                self.gate.clear();
                (
                    TerminalKind::Cancelled,
                    keys::CANCELLED,
                    "Shipment cancelled".to_owned(),
                )
            }
            Terminal::Halted => {
                let message = match self.gate.halt() {
                    Some(decision) => format!(
                        "Workflow halted: decision on {} was not made in time",
                        decision.reason
                    ),
                    None => "Workflow halted by the engine".to_owned(),
                };
                (TerminalKind::Halted, keys::HALTED, message)
            }
        };

        if let Some(summary) = &snapshot.summary {
            self.emit(
                Some(keys::SUMMARY),
                Severity::Info,
                format!("Summary: {}", summary.describe()),
                updates,
            );
        }
        self.finish_with(kind, key, message, updates);
    }

    fn finish_with(
        &mut self,
        kind: TerminalKind,
        key: &str,
        message: String,
        updates: &mut Vec<SessionUpdate>,
    ) {
        let severity = match kind {
            TerminalKind::Delivered => Severity::Success,
            TerminalKind::Cancelled | TerminalKind::Halted => Severity::Error,
        };
        self.emit(Some(key), severity, message.clone(), updates);
        let banner = TerminalBanner { kind, message };
        self.banner = Some(banner.clone());
        updates.push(SessionUpdate::Finished(banner));
    }
}
