//! Polling reconciliation core.
//!
//! Covers event deduplication, status-to-progress mapping, the decision
//! gate, choice translation, the poll loop and operator command dispatch.

pub mod dedup;
pub mod dispatcher;
pub mod events;
pub mod gate;
pub mod poller;
pub mod progress;
pub mod session;
pub mod translator;
