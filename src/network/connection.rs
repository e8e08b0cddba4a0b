//! Connection Handler
//!
//! Serves one bus master over one TCP stream.

use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::control_table::{offset, ControlTable};
use crate::device::{Device, SimulatedServo};
use crate::error::{BioloidError, Result};
use crate::port::SocketPort;
use crate::protocol::{Id, ParseStatus};
use crate::storage::FileStorage;

/// Handles a single bus connection
pub struct Connection<'a> {
    /// Device answering on this connection
    device: Device<&'a mut SimulatedServo, &'a mut FileStorage, SocketPort>,

    /// Set by the server to stop serving
    shutdown: Arc<AtomicBool>,

    /// Peer address for logging
    peer_addr: String,
}

impl<'a> Connection<'a> {
    /// Create a connection handler and load the control table
    ///
    /// A configured `device_id` is written into the table (and saved) if the
    /// loaded table carries a different one.
    pub fn new(
        stream: TcpStream,
        servo: &'a mut SimulatedServo,
        storage: &'a mut FileStorage,
        config: &Config,
        device_id: Option<Id>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        let mut port = SocketPort::new(stream)?;
        port.set_timeouts(config.read_timeout(), config.write_timeout())?;
        let peer_addr = port.peer_addr().to_string();

        let mut table = ControlTable::new(
            SimulatedServo::NUM_CTL_BYTES,
            SimulatedServo::NUM_PERSISTENT_BYTES,
            servo,
            storage,
            port,
        );
        table.load();

        if let Some(id) = device_id {
            if table.get_u8(offset::ID) != id.0 {
                table.set_u8(offset::ID, id.0);
                if let Err(e) = table.save() {
                    tracing::warn!("Failed to save device id: {}", e);
                }
            }
        }

        let device = Device::new(table);
        tracing::debug!("Serving device id {} to {}", device.id(), peer_addr);

        Ok(Self {
            device,
            shutdown,
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns when the master disconnects, the server shuts down or an
    /// error occurs.
    pub fn handle(&mut self) -> Result<()> {
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::debug!("Shutting down connection to {}", self.peer_addr);
                return Ok(());
            }

            match self.device.step() {
                Ok(ParseStatus::Complete) => {}
                Ok(status) => {
                    tracing::debug!("Bad frame from {}: {:?}", self.peer_addr, status);
                }
                // Read timeout - the partial frame is gone, keep listening
                Err(BioloidError::Timeout) => {}
                Err(e) if e.is_disconnect() => {
                    tracing::info!("Bus master {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error serving {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
