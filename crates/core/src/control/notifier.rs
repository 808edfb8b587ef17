use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use super::osc::encode_notification;
use crate::messages::Notification;

/// Destination for controller notifications. Delivery is best effort.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Fire-and-forget OSC client.
pub struct OscNotifier {
    socket: UdpSocket,
    target: SocketAddr,
    prefix: String,
}

impl OscNotifier {
    pub fn new(target: impl ToSocketAddrs, prefix: impl Into<String>) -> std::io::Result<Self> {
        let target = target.to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "no address to send to")
        })?;
        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_nonblocking(true)?;

        log::info!("Sending OSC notifications to {}", target);
        Ok(Self {
            socket,
            target,
            prefix: prefix.into(),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Notifier for OscNotifier {
    fn notify(&self, notification: Notification) {
        let bytes = match encode_notification(&self.prefix, &notification) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("{}", e);
                return;
            }
        };

        if let Err(e) = self.socket.send_to(&bytes, self.target) {
            log::warn!("Failed to send {} to {}: {}", notification.name(), self.target, e);
        }
    }
}

/// Writes notifications to the log. Used when no looper is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Progress(text) => log::info!("{}", text),
            Notification::VariationsReady(count) => log::info!("{} variation(s) ready", count),
            Notification::Error(text) => log::error!("{}", text),
        }
    }
}
