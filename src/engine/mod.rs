//! Remote workflow engine boundary.
//!
//! The [`WorkflowEngine`] trait decouples reconciliation from the HTTP
//! transport. [`http::HttpEngine`] talks to the real engine; tests supply
//! scripted implementations.

pub mod http;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::models::command::CommandToken;
use crate::models::snapshot::WorkflowSnapshot;
use crate::Result;

/// Boxed future returned by every engine call.
pub type EngineFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Body of `POST /shipments`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateShipmentRequest {
    /// Scenario the engine should simulate.
    pub scenario_id: String,
}

/// Response of `POST /shipments`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateShipmentResponse {
    /// Identifier of the started workflow instance.
    pub shipment_id: String,
}

/// Body of `POST /shipments/{id}/handle-resolution`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolutionRequest {
    /// Canonical command token.
    pub choice: CommandToken,
}

/// Operations the client performs against the workflow engine.
///
/// Implementations perform exactly one request per call; retry policy
/// belongs to the reconciliation loop.
pub trait WorkflowEngine: Send + Sync {
    /// Start a new workflow instance and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Http`](crate::AppError::Http) or
    /// [`AppError::Engine`](crate::AppError::Engine) when the request fails.
    fn create_instance<'a>(&'a self, scenario_id: &'a str) -> EngineFuture<'a, String>;

    /// Fetch the authoritative state of one instance.
    ///
    /// # Errors
    ///
    /// Returns a transient error on network or decode failures.
    fn fetch_snapshot<'a>(&'a self, instance_id: &'a str) -> EngineFuture<'a, WorkflowSnapshot>;

    /// Resume a blocked instance with the operator's decision.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Engine`](crate::AppError::Engine) if the engine
    /// rejects the resolution.
    fn submit_resolution<'a>(
        &'a self,
        instance_id: &'a str,
        choice: CommandToken,
    ) -> EngineFuture<'a, ()>;

    /// Withdraw (cancel) an instance.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Engine`](crate::AppError::Engine) if the engine
    /// rejects the withdrawal.
    fn withdraw<'a>(&'a self, instance_id: &'a str) -> EngineFuture<'a, ()>;

    /// Pause (`true`) or resume (`false`) an instance.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Engine`](crate::AppError::Engine) if the engine
    /// rejects the directive.
    fn set_paused<'a>(&'a self, instance_id: &'a str, paused: bool) -> EngineFuture<'a, ()>;
}
