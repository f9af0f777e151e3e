//! # scenehub-adapter-hal-http
//!
//! HTTP client for the HAL, the device-control backend across the network
//! boundary. Implements the [`HalClient`] port.
//!
//! Endpoints:
//! - `GET /devices/{id}/state` — read the current device state
//! - `POST /devices/{id}/control` — send a command map
//! - `GET /health` — reachability probe
//!
//! Transport errors and non-success statuses both surface as
//! [`CommunicationError`]; the engine converts them into per-action
//! execution failures.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use scenehub_app::ports::HalClient;
use scenehub_domain::device::DeviceState;
use scenehub_domain::error::CommunicationError;
use scenehub_domain::id::DeviceId;

/// Configuration for the HAL client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the HAL service, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Wire shape of a state response from the HAL.
#[derive(Debug, Deserialize)]
struct StateResponse {
    #[serde(default = "unknown_state")]
    state: String,
    #[serde(default)]
    attributes: HashMap<String, serde_json::Value>,
}

fn unknown_state() -> String {
    "unknown".to_string()
}

/// Wire shape of a control response from the HAL.
#[derive(Debug, Deserialize)]
struct ControlResponse {
    #[serde(default)]
    success: bool,
}

/// [`HalClient`] implementation over HTTP.
pub struct HalHttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HalHttpClient {
    /// Create a client with a pooled connection and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CommunicationError`] when the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: Config) -> Result<Self, CommunicationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                CommunicationError::new(format!("failed to build HAL client: {err}"))
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl HalClient for HalHttpClient {
    async fn get_state(&self, device_id: &DeviceId) -> Result<DeviceState, CommunicationError> {
        let response = self
            .client
            .get(self.url(&format!("/devices/{device_id}/state")))
            .send()
            .await
            .map_err(|err| CommunicationError::new(format!("failed to connect to HAL: {err}")))?;

        if !response.status().is_success() {
            return Err(CommunicationError::new(format!(
                "failed to get device state: {device_id}, status: {}",
                response.status()
            )));
        }

        let body: StateResponse = response.json().await.map_err(|err| {
            CommunicationError::new(format!("invalid HAL state response for {device_id}: {err}"))
        })?;

        Ok(DeviceState {
            state: body.state,
            attributes: body.attributes,
            last_updated: scenehub_domain::time::now(),
        })
    }

    async fn send_command(
        &self,
        device_id: &DeviceId,
        command: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<bool, CommunicationError> {
        let response = self
            .client
            .post(self.url(&format!("/devices/{device_id}/control")))
            .json(command)
            .send()
            .await
            .map_err(|err| CommunicationError::new(format!("failed to connect to HAL: {err}")))?;

        if !response.status().is_success() {
            return Err(CommunicationError::new(format!(
                "failed to control device: {device_id}, status: {}",
                response.status()
            )));
        }

        let body: ControlResponse = response.json().await.map_err(|err| {
            CommunicationError::new(format!(
                "invalid HAL control response for {device_id}: {err}"
            ))
        })?;
        Ok(body.success)
    }

    async fn health_check(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "HAL health check failed");
                false
            }
        }
    }
}
