//! Once-and-only-once emission keyed by event identity.

use std::collections::HashSet;

/// Session-scoped record of every event key already emitted.
///
/// Keys never expire. A fresh deduplicator is created whenever a new
/// workflow instance starts being observed.
#[derive(Debug, Default, Clone)]
pub struct EventDeduplicator {
    seen: HashSet<String>,
}

impl EventDeduplicator {
    /// Empty deduplicator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether an occurrence should be emitted.
    ///
    /// `None` always emits: it is reserved for actions the user initiated.
    /// `Some(key)` emits only the first time `key` is offered and records it.
    pub fn should_emit(&mut self, key: Option<&str>) -> bool {
        match key {
            None => true,
            Some(key) => self.seen.insert(key.to_owned()),
        }
    }

    /// Whether `key` has been seen in this session.
    #[must_use]
    pub fn has_seen(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Number of distinct keys recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no key has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Event key constructors. Each captures exactly the granularity of new
/// information for its kind of occurrence.
pub mod keys {
    /// A status change.
    #[must_use]
    pub fn status(code: &str) -> String {
        format!("status-{code}")
    }

    /// A decision request for `reason` raised while in `status`.
    #[must_use]
    pub fn decision(reason: &str, status: &str) -> String {
        format!("error-{reason}-{status}")
    }

    /// A descriptor without options.
    #[must_use]
    pub fn notice(reason: &str, status: &str) -> String {
        format!("notice-{reason}-{status}")
    }

    /// Remote-side clearing of a decision.
    #[must_use]
    pub fn resolved(reason: &str, status: &str) -> String {
        format!("resolved-{reason}-{status}")
    }

    /// A status code absent from the stage table.
    #[must_use]
    pub fn unknown_status(code: &str) -> String {
        format!("unknown-status-{code}")
    }

    /// A delivery estimate.
    #[must_use]
    pub fn delivery(status: &str, eta: &str) -> String {
        format!("delivery-{status}-{eta}")
    }

    /// Successful delivery.
    pub const DELIVERED: &str = "delivered";
    /// Withdrawal, local or remote.
    pub const CANCELLED: &str = "cancelled";
    /// Critical halt.
    pub const HALTED: &str = "halted";
    /// Terminal summary.
    pub const SUMMARY: &str = "summary";
}
