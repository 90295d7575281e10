use crate::core::device::{DeviceLink, LinkState};
use crate::core::framing::Line;
use crate::core::registry::{ClientRegistry, SessionId};
use crate::domain::error::RelayError;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What happened to one client command
#[derive(Debug)]
pub enum CommandOutcome {
    /// Blank payload; nothing was written
    Ignored,
    /// Written to the device
    Forwarded,
    /// The device rejected or failed the write
    Failed(RelayError),
}

impl CommandOutcome {
    pub fn is_forwarded(&self) -> bool {
        matches!(self, CommandOutcome::Forwarded)
    }
}

/// Health snapshot served over HTTP
#[derive(Debug, Clone, Serialize)]
pub struct RelayStatus {
    pub device: String,
    pub link: LinkState,
    pub clients: usize,
}

/// Shared context joining the device link and the connected clients
#[derive(Clone)]
pub struct Relay {
    device: Arc<DeviceLink>,
    registry: Arc<ClientRegistry>,
}

impl Relay {
    pub fn new(device: Arc<DeviceLink>, registry: Arc<ClientRegistry>) -> Self {
        Self { device, registry }
    }

    pub fn device(&self) -> &Arc<DeviceLink> {
        &self.device
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Spawn the task fanning device lines out to every client.
    ///
    /// The task ends with the device line stream. Calling this twice yields a
    /// task that ends immediately.
    pub fn start(&self) -> JoinHandle<()> {
        let lines = self.device.receive_lines();
        let registry = Arc::clone(&self.registry);
        let device = self.device.name().to_string();

        tokio::spawn(async move {
            let Some(lines) = lines else {
                warn!("Device lines already consumed; relay pump not started");
                return;
            };
            pump_lines(lines, registry).await;
            info!(device = %device, "Device line stream ended");
        })
    }

    /// Forward one client payload to the device.
    ///
    /// Failures are logged and returned for inspection, never sent back to
    /// the client.
    pub async fn forward_command(&self, session: &SessionId, payload: &str) -> CommandOutcome {
        let Some(line) = Line::new(payload) else {
            return CommandOutcome::Ignored;
        };

        match self.device.send(line.as_str()).await {
            Ok(()) => {
                debug!(session = %session, "Relay -> Device: {}", line);
                CommandOutcome::Forwarded
            }
            Err(e) => {
                warn!(session = %session, "Relay -> Device failed: {}", e);
                CommandOutcome::Failed(e)
            }
        }
    }

    pub async fn connect(&self, peer: Option<SocketAddr>) -> (SessionId, mpsc::Receiver<Line>) {
        self.registry.register(peer).await
    }

    pub async fn disconnect(&self, session: &SessionId) {
        self.registry.remove(session).await;
    }

    pub async fn status(&self) -> RelayStatus {
        RelayStatus {
            device: self.device.name().to_string(),
            link: self.device.state(),
            clients: self.registry.len().await,
        }
    }
}

async fn pump_lines(mut lines: mpsc::Receiver<Line>, registry: Arc<ClientRegistry>) {
    while let Some(line) = lines.recv().await {
        let report = registry.broadcast(&line).await;
        debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            "Broadcast: {}",
            line
        );
    }
}
