#![forbid(unsafe_code)]

//! Client-side reconciliation of a remotely executed fulfillment workflow.

pub mod config;
pub mod engine;
pub mod errors;
pub mod journal;
pub mod models;
pub mod monitor;
pub mod reconcile;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
