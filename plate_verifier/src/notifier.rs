use std::net::UdpSocket;

use crate::error::Result;
use crate::metrics::{NOTIFICATIONS_FAILED, NOTIFICATIONS_SENT};

pub const FLASH_PAYLOAD: &[u8] = b"FLASH_LED";

/// Fire and forget signal to the gate actuator.
pub trait Notifier {
    fn notify(&self);
}

/// Sends the flash datagram to `host:port`. The host may be an IP literal or
/// a name; it is resolved on every send so an actuator that changes address
/// or comes up late is still reached.
pub struct UdpNotifier {
    socket: UdpSocket,
    host: String,
    port: u16,
}

impl UdpNotifier {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            host: host.to_string(),
            port,
        })
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Notifier for UdpNotifier {
    fn notify(&self) {
        match self
            .socket
            .send_to(FLASH_PAYLOAD, (self.host.as_str(), self.port))
        {
            Ok(_) => {
                NOTIFICATIONS_SENT.inc();
                log::info!("Signal sent to ESP32 at {} to flash LED", self.host);
            }
            Err(e) => {
                NOTIFICATIONS_FAILED.inc();
                log::warn!("Error sending to ESP32 at {}: {e}", self.target());
            }
        }
    }
}
