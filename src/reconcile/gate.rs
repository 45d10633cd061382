//! Human-in-the-loop decision gate.
//!
//! The gate is `Clear` until a snapshot carries a descriptor with at least
//! one resolution option whose `(reason, status)` key has not been seen in
//! this session. It returns to `Clear` when a later snapshot no longer
//! carries that descriptor or when the operator's submission succeeds, and
//! moves to the absorbing `Halted` state on a critical halt.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::dedup::{keys, EventDeduplicator};
use super::translator;
use crate::models::command::CommandToken;
use crate::models::snapshot::ErrorDescriptor;

/// One choice offered to the operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionOption {
    /// Label exactly as offered by the engine.
    pub label: String,
    /// Cost of the option, when reported.
    pub cost: Option<f64>,
    /// Time impact of the option, when reported.
    pub time_impact: Option<String>,
}

/// The active decision prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingDecision {
    /// Event key of the occurrence that opened the gate.
    pub key: String,
    /// Cause code.
    pub reason: String,
    /// Human-readable description.
    pub details: String,
    /// Status the workflow was in when the decision was raised.
    pub status: String,
    /// Offered choices, in engine order.
    pub options: Vec<DecisionOption>,
    /// Scenario-specific hints.
    pub hints: Map<String, Value>,
}

impl PendingDecision {
    fn from_descriptor(key: String, descriptor: &ErrorDescriptor, status: &str) -> Self {
        let options = descriptor
            .resolution_options
            .iter()
            .map(|label| {
                let enhanced = descriptor.enhanced_for(label);
                DecisionOption {
                    label: label.clone(),
                    cost: enhanced.and_then(|e| e.cost),
                    time_impact: enhanced.and_then(|e| e.time_impact.clone()),
                }
            })
            .collect();
        Self {
            key,
            reason: descriptor.reason.clone(),
            details: descriptor.details.clone(),
            status: status.to_owned(),
            options,
            hints: descriptor.hints.clone(),
        }
    }

    /// Whether `label` is one of the offered choices. Matching ignores
    /// surrounding whitespace and ASCII case, like [`translator::translate`].
    #[must_use]
    pub fn offers(&self, label: &str) -> bool {
        let label = label.trim();
        self.options
            .iter()
            .any(|option| option.label.trim().eq_ignore_ascii_case(label))
    }

    /// Whether any offered choice translates to `token`.
    #[must_use]
    pub fn offers_token(&self, token: CommandToken) -> bool {
        self.options
            .iter()
            .any(|option| translator::translate(&option.label).is_ok_and(|offered| offered == token))
    }
}

/// Gate state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GateState {
    /// No decision pending.
    #[default]
    Clear,
    /// Blocked on an operator decision.
    Pending(PendingDecision),
    /// Critical halt; no further decisions accepted.
    Halted,
}

/// Observable consequence of feeding a snapshot through the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum GateEvent {
    /// A new decision is pending.
    Opened(PendingDecision),
    /// The engine cleared a pending decision on its own.
    Resolved(PendingDecision),
    /// An informational descriptor appeared for the first time.
    Notice {
        /// Cause code.
        reason: String,
        /// Description.
        details: String,
    },
}

/// Decision gate state machine.
#[derive(Debug, Clone, Default)]
pub struct HitlGate {
    state: GateState,
}

impl HitlGate {
    /// Gate in the `Clear` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// The pending decision, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingDecision> {
        match &self.state {
            GateState::Pending(decision) => Some(decision),
            _ => None,
        }
    }

    /// Whether the gate has been halted.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        matches!(self.state, GateState::Halted)
    }

    /// Apply the descriptor carried by one snapshot.
    pub fn observe(
        &mut self,
        descriptor: Option<&ErrorDescriptor>,
        status: &str,
        dedup: &mut EventDeduplicator,
    ) -> Vec<GateEvent> {
        if self.is_halted() {
            return Vec::new();
        }

        let mut events = Vec::new();

        let Some(descriptor) = descriptor else {
            self.release(dedup, &mut events);
            return events;
        };

        if !descriptor.requires_decision() {
            self.release(dedup, &mut events);
            if dedup.should_emit(Some(&keys::notice(&descriptor.reason, status))) {
                events.push(GateEvent::Notice {
                    reason: descriptor.reason.clone(),
                    details: descriptor.details.clone(),
                });
            }
            return events;
        }

        let key = keys::decision(&descriptor.reason, status);
        if self.pending().is_some_and(|pending| pending.key == key) {
            return events;
        }

        // Anything pending now belongs to an occurrence the engine no longer reports.
        self.release(dedup, &mut events);

        if dedup.should_emit(Some(&key)) {
            let decision = PendingDecision::from_descriptor(key, descriptor, status);
            self.state = GateState::Pending(decision.clone());
            events.push(GateEvent::Opened(decision));
        }
        events
    }

    /// Clear the gate after the operator's choice for `key` was accepted.
    ///
    /// Returns `false` if the gate no longer holds that decision.
    pub fn clear_submitted(&mut self, key: &str) -> bool {
        if self.pending().is_some_and(|pending| pending.key == key) {
            self.state = GateState::Clear;
            true
        } else {
            false
        }
    }

    /// Clear any pending decision without reporting it (local withdrawal).
    pub fn clear(&mut self) {
        if !self.is_halted() {
            self.state = GateState::Clear;
        }
    }

    /// Enter the absorbing `Halted` state, returning the decision that was
    /// still pending, if any.
    pub fn halt(&mut self) -> Option<PendingDecision> {
        match std::mem::replace(&mut self.state, GateState::Halted) {
            GateState::Pending(decision) => Some(decision),
            GateState::Clear | GateState::Halted => None,
        }
    }

    fn release(&mut self, dedup: &mut EventDeduplicator, events: &mut Vec<GateEvent>) {
        if let GateState::Pending(previous) = std::mem::take(&mut self.state) {
            if dedup.should_emit(Some(&keys::resolved(&previous.reason, &previous.status))) {
                events.push(GateEvent::Resolved(previous));
            }
        }
    }
}
