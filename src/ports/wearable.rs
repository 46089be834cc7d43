use async_trait::async_trait;

use crate::domain::SenseError;

/// Port for the haptic wearable link.
#[async_trait]
pub trait Wearable: Send + Sync {
    /// Start the link; begins connection maintenance in the background.
    async fn start(&self) -> Result<(), SenseError>;

    /// Stop the link and close any open connection.
    async fn stop(&self);

    /// Send a command to the device.
    ///
    /// Returns false (without erroring) when the device is unreachable;
    /// alert delivery is best-effort.
    async fn send_command(&self, command: &str, params: serde_json::Value) -> bool;

    /// Whether a device is currently connected.
    fn is_connected(&self) -> bool;
}
