//! `reqwest`-backed [`WorkflowEngine`] implementation.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    CreateShipmentRequest, CreateShipmentResponse, EngineFuture, ResolutionRequest,
    WorkflowEngine,
};
use crate::config::GlobalConfig;
use crate::models::command::CommandToken;
use crate::models::snapshot::WorkflowSnapshot;
use crate::{AppError, Result};

/// HTTP client for the shipment workflow API.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: Client,
    base_url: String,
}

impl HttpEngine {
    /// Build a client from the engine section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn from_config(config: &GlobalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.engine.base_url.clone(),
        })
    }

    fn shipment_url(&self, instance_id: &str) -> String {
        format!("{}/shipments/{instance_id}", self.base_url)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Engine {
            status: status.as_u16(),
            message: if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_owned()
            } else {
                body
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn acknowledge(response: Response) -> Result<()> {
        Self::check(response).await.map(drop)
    }
}

impl WorkflowEngine for HttpEngine {
    fn create_instance<'a>(&'a self, scenario_id: &'a str) -> EngineFuture<'a, String> {
        Box::pin(async move {
            let url = format!("{}/shipments", self.base_url);
            debug!(%url, scenario_id, "creating workflow instance");
            let response = self
                .client
                .post(&url)
                .json(&CreateShipmentRequest {
                    scenario_id: scenario_id.to_owned(),
                })
                .send()
                .await?;
            let created: CreateShipmentResponse = Self::decode(response).await?;
            Ok(created.shipment_id)
        })
    }

    fn fetch_snapshot<'a>(&'a self, instance_id: &'a str) -> EngineFuture<'a, WorkflowSnapshot> {
        Box::pin(async move {
            let response = self.client.get(self.shipment_url(instance_id)).send().await?;
            Self::decode(response).await
        })
    }

    fn submit_resolution<'a>(
        &'a self,
        instance_id: &'a str,
        choice: CommandToken,
    ) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            let url = format!("{}/handle-resolution", self.shipment_url(instance_id));
            debug!(%url, %choice, "submitting resolution");
            let response = self
                .client
                .post(&url)
                .json(&ResolutionRequest { choice })
                .send()
                .await?;
            Self::acknowledge(response).await
        })
    }

    fn withdraw<'a>(&'a self, instance_id: &'a str) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            debug!(instance_id, "withdrawing workflow instance");
            let response = self
                .client
                .delete(self.shipment_url(instance_id))
                .send()
                .await?;
            Self::acknowledge(response).await
        })
    }

    fn set_paused<'a>(&'a self, instance_id: &'a str, paused: bool) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            let action = if paused { "pause" } else { "resume" };
            let url = format!("{}/{action}", self.shipment_url(instance_id));
            let response = self.client.post(&url).send().await?;
            Self::acknowledge(response).await
        })
    }
}
