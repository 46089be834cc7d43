use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::config::WearableSection;
use crate::domain::SenseError;
use crate::ports::Wearable;

/// Wire format: one JSON object per line.
#[derive(Serialize)]
struct WireCommand<'a> {
    cmd: &'a str,
    params: &'a serde_json::Value,
}

const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

/// Wearable link over a socket, speaking newline-delimited JSON commands.
///
/// A background loop maintains the connection: it dials the configured
/// address, performs a hello handshake, and re-dials with backoff after
/// failures. Sends are best-effort; a failed write drops the connection and
/// leaves reconnection to the loop.
pub struct SocketWearable {
    config: WearableSection,
    connected: Arc<AtomicBool>,
    stream: Arc<tokio::sync::Mutex<Option<TcpStream>>>,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl SocketWearable {
    pub fn new(config: WearableSection) -> Self {
        Self {
            config,
            connected: Arc::new(AtomicBool::new(false)),
            stream: Arc::new(tokio::sync::Mutex::new(None)),
            task: parking_lot::Mutex::new(None),
        }
    }

    async fn connect_once(
        address: &str,
        device_name: &str,
        stream_slot: &tokio::sync::Mutex<Option<TcpStream>>,
        connected: &AtomicBool,
    ) -> Result<(), SenseError> {
        info!(address, "Connecting to wearable");

        let mut stream = TcpStream::connect(address)
            .await
            .map_err(|e| SenseError::Wearable(format!("Connect failed: {}", e)))?;

        let hello = WireCommand {
            cmd: "hello",
            params: &serde_json::json!({ "name": device_name }),
        };
        let mut line = serde_json::to_vec(&hello)?;
        line.push(b'\n');
        stream
            .write_all(&line)
            .await
            .map_err(|e| SenseError::Wearable(format!("Hello failed: {}", e)))?;

        // The device may answer the hello; wait briefly but don't require it.
        let mut buf = [0u8; 1024];
        match tokio::time::timeout(HELLO_TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(n)) if n > 0 => {
                debug!(
                    response = %String::from_utf8_lossy(&buf[..n]).trim(),
                    "Wearable responded to hello"
                );
            }
            _ => debug!("No hello response from wearable"),
        }

        *stream_slot.lock().await = Some(stream);
        connected.store(true, Ordering::SeqCst);
        info!(address, "Connected to wearable");
        Ok(())
    }
}

#[async_trait]
impl Wearable for SocketWearable {
    async fn start(&self) -> Result<(), SenseError> {
        let address = self
            .config
            .address
            .clone()
            .ok_or_else(|| SenseError::Wearable("No wearable address configured".to_string()))?;

        let device_name = self.config.device_name.clone();
        let reconnect = Duration::from_secs(self.config.reconnect_secs.max(1));
        let backoff = Duration::from_secs(self.config.error_backoff_secs.max(1));
        let connected = Arc::clone(&self.connected);
        let stream_slot = Arc::clone(&self.stream);

        let handle = tokio::spawn(async move {
            loop {
                if !connected.load(Ordering::SeqCst) {
                    if let Err(e) =
                        Self::connect_once(&address, &device_name, &stream_slot, &connected).await
                    {
                        warn!(error = %e, "Wearable connection failed");
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                }
                tokio::time::sleep(reconnect).await;
            }
        });

        *self.task.lock() = Some(handle);
        info!("Wearable link started");
        Ok(())
    }

    async fn stop(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        *self.stream.lock().await = None;
        self.connected.store(false, Ordering::SeqCst);
        info!("Wearable link stopped");
    }

    async fn send_command(&self, command: &str, params: serde_json::Value) -> bool {
        if !self.connected.load(Ordering::SeqCst) {
            warn!(command, "Cannot send command, wearable not connected");
            return false;
        }

        let mut guard = self.stream.lock().await;
        let stream = match guard.as_mut() {
            Some(s) => s,
            None => {
                warn!(command, "Cannot send command, wearable not connected");
                return false;
            }
        };

        let wire = WireCommand {
            cmd: command,
            params: &params,
        };
        let mut line = match serde_json::to_vec(&wire) {
            Ok(l) => l,
            Err(e) => {
                warn!(command, error = %e, "Failed to encode command");
                return false;
            }
        };
        line.push(b'\n');

        match stream.write_all(&line).await {
            Ok(()) => {
                debug!(command, "Command sent to wearable");
                true
            }
            Err(e) => {
                warn!(command, error = %e, "Send failed, dropping connection");
                *guard = None;
                self.connected.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Stand-in wearable used in simulation mode and when no address is
/// configured; commands are logged and recorded instead of transmitted.
#[derive(Default)]
pub struct SimulatedWearable {
    connected: AtomicBool,
    sent: parking_lot::Mutex<Vec<(String, serde_json::Value)>>,
}

impl SimulatedWearable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far.
    pub fn sent_commands(&self) -> Vec<(String, serde_json::Value)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Wearable for SimulatedWearable {
    async fn start(&self) -> Result<(), SenseError> {
        self.connected.store(true, Ordering::SeqCst);
        info!("Wearable link running in simulation mode");
        Ok(())
    }

    async fn stop(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn send_command(&self, command: &str, params: serde_json::Value) -> bool {
        if !self.connected.load(Ordering::SeqCst) {
            return false;
        }
        info!(command, %params, "Simulated wearable command");
        self.sent.lock().push((command.to_string(), params));
        true
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn simulated_wearable_records_commands() {
        let wearable = SimulatedWearable::new();

        // Not started yet: sends are refused.
        assert!(!wearable.send_command("vibrate", serde_json::json!({})).await);

        wearable.start().await.unwrap();
        assert!(wearable.is_connected());
        assert!(
            wearable
                .send_command("vibrate", serde_json::json!({"pattern": "double"}))
                .await
        );

        let sent = wearable.sent_commands();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "vibrate");

        wearable.stop().await;
        assert!(!wearable.is_connected());
    }

    #[tokio::test]
    async fn socket_wearable_handshakes_and_sends() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut lines = BufReader::new(read_half).lines();

            let hello = lines.next_line().await.unwrap().unwrap();
            let hello: serde_json::Value = serde_json::from_str(&hello).unwrap();
            assert_eq!(hello["cmd"], "hello");

            write_half.write_all(b"{\"ok\":true}\n").await.unwrap();

            let command = lines.next_line().await.unwrap().unwrap();
            let command: serde_json::Value = serde_json::from_str(&command).unwrap();
            command
        });

        let config = WearableSection {
            address: Some(address),
            reconnect_secs: 1,
            error_backoff_secs: 1,
            ..WearableSection::default()
        };
        let wearable = SocketWearable::new(config);
        wearable.start().await.unwrap();

        // Wait for the maintenance loop to finish the handshake.
        for _ in 0..50 {
            if wearable.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(wearable.is_connected());

        assert!(
            wearable
                .send_command("vibrate", serde_json::json!({"pattern": "long"}))
                .await
        );

        let received = server.await.unwrap();
        assert_eq!(received["cmd"], "vibrate");
        assert_eq!(received["params"]["pattern"], "long");

        wearable.stop().await;
        assert!(!wearable.is_connected());
    }

    #[tokio::test]
    async fn missing_address_refuses_to_start() {
        let wearable = SocketWearable::new(WearableSection::default());
        assert!(wearable.start().await.is_err());
    }

    #[tokio::test]
    async fn send_without_connection_is_false_not_fatal() {
        let config = WearableSection {
            address: Some("127.0.0.1:1".to_string()),
            ..WearableSection::default()
        };
        let wearable = SocketWearable::new(config);
        assert!(!wearable.send_command("vibrate", serde_json::json!({})).await);
    }
}
