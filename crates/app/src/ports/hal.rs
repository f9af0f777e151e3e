//! HAL port — the device-control backend across the network boundary.
//!
//! The HAL owns transport-level concerns (timeouts, transient retries).
//! From the engine's perspective a call either yields a value or fails
//! with a [`CommunicationError`]; a failed call during an action sequence
//! surfaces as an execution failure, never as an unhandled fault.

use std::future::Future;

use scenehub_domain::device::DeviceState;
use scenehub_domain::error::CommunicationError;
use scenehub_domain::id::DeviceId;

/// Client for reading device state and sending commands.
pub trait HalClient {
    /// Read the current state of a device.
    fn get_state(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<DeviceState, CommunicationError>> + Send;

    /// Send a command map to a device; returns whether the backend accepted
    /// it.
    fn send_command(
        &self,
        device_id: &DeviceId,
        command: &serde_json::Map<String, serde_json::Value>,
    ) -> impl Future<Output = Result<bool, CommunicationError>> + Send;

    /// Whether the backend is currently reachable.
    fn health_check(&self) -> impl Future<Output = bool> + Send;
}

impl<T: HalClient + Send + Sync> HalClient for std::sync::Arc<T> {
    fn get_state(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<DeviceState, CommunicationError>> + Send {
        (**self).get_state(device_id)
    }

    fn send_command(
        &self,
        device_id: &DeviceId,
        command: &serde_json::Map<String, serde_json::Value>,
    ) -> impl Future<Output = Result<bool, CommunicationError>> + Send {
        (**self).send_command(device_id, command)
    }

    fn health_check(&self) -> impl Future<Output = bool> + Send {
        (**self).health_check()
    }
}
