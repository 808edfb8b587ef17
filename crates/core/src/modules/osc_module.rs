use std::collections::HashMap;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use super::traits::{AsyncModule, ModuleEvent, ModuleId, ModuleMessage};
use crate::control::ControlDispatchTable;

const MAX_DATAGRAM: usize = 1536;

/// Receives control messages from the looper over UDP.
pub struct OscModule {
    bind_addr: String,
    table: ControlDispatchTable,
    socket: Option<UdpSocket>,
    received: u64,
    status: HashMap<String, String>,
}

impl OscModule {
    pub fn new(bind_addr: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            table: ControlDispatchTable::new(prefix),
            socket: None,
            received: 0,
            status: HashMap::new(),
        }
    }

    /// Address actually bound, available after `initialize`.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.socket.as_ref().and_then(|socket| socket.local_addr().ok())
    }
}

#[async_trait]
impl AsyncModule for OscModule {
    fn id(&self) -> ModuleId {
        ModuleId::ControlListener
    }

    async fn initialize(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let socket = UdpSocket::bind(&self.bind_addr).await?;
        let local = socket.local_addr()?;
        log::info!(
            "OSC listener bound to {} (prefix {})",
            local,
            self.table.prefix()
        );

        self.socket = Some(socket);
        self.status.insert("address".to_string(), local.to_string());
        self.status
            .insert("status".to_string(), "initialized".to_string());
        Ok(())
    }

    async fn run(
        &mut self,
        mut rx: mpsc::Receiver<ModuleEvent>,
        tx: mpsc::Sender<ModuleMessage>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let socket = self
            .socket
            .take()
            .ok_or("OSC module was not initialized")?;
        self.status.insert("status".to_string(), "running".to_string());

        let _ = tx
            .send(ModuleMessage::Status(format!(
                "OSC listener running on {}",
                socket.local_addr()?
            )))
            .await;

        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            tokio::select! {
                event = rx.recv() => {
                    match event {
                        Some(ModuleEvent::Shutdown) | None => {
                            log::info!("OSC module received shutdown signal");
                            break;
                        }
                    }
                }

                received = socket.recv_from(&mut buf) => {
                    let (len, peer) = match received {
                        Ok(received) => received,
                        Err(e) => {
                            log::warn!("OSC receive failed: {}", e);
                            continue;
                        }
                    };
                    self.received += 1;

                    match self.table.decode_packet(&buf[..len]) {
                        Ok(events) => {
                            for event in events {
                                log::debug!("OSC {:?} from {}", event, peer);
                                if tx.send(ModuleMessage::Event(event)).await.is_err() {
                                    log::warn!("Controller gone, stopping OSC listener");
                                    return Ok(());
                                }
                            }
                        }
                        Err(e) => log::warn!("Dropping datagram from {}: {}", peer, e),
                    }
                }
            }
        }

        self.socket = Some(socket);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.socket = None;
        self.status
            .insert("status".to_string(), "shutdown".to_string());
        self.status
            .insert("received".to_string(), self.received.to_string());
        log::info!("OSC module shutdown complete");
        Ok(())
    }

    fn status(&self) -> HashMap<String, String> {
        self.status.clone()
    }
}
