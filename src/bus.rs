//! Bus master
//!
//! Sends command frames and waits for status replies. This is the side of
//! the bus that raises [`BioloidError::Timeout`].

use std::time::{Duration, Instant};

use crate::error::{BioloidError, Result};
use crate::port::Port;
use crate::protocol::{status_to_result, write_packet, Command, Id, Packet, MAX_PARAMS};

/// How long to sleep between polls of an idle port
const POLL_INTERVAL: Duration = Duration::from_micros(200);

/// Master end of a bus
pub struct Bus<P> {
    port: P,
    timeout: Duration,
}

impl<P: Port> Bus<P> {
    /// Create a bus that waits up to `timeout` for each reply
    pub fn new(port: P, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_inner(self) -> P {
        self.port
    }

    // =========================================================================
    // Framing
    // =========================================================================

    /// Send one command frame
    pub fn send(&mut self, id: Id, command: Command, params: &[u8]) -> Result<()> {
        if params.len() > MAX_PARAMS {
            return Err(BioloidError::Protocol(format!(
                "{} params do not fit in a frame",
                params.len()
            )));
        }

        let mut storage = [0u8; MAX_PARAMS];
        let mut packet = Packet::new(&mut storage);
        packet.set_id(id);
        packet.set_command(command);
        packet.set_params(params);
        packet.update_checksum();
        write_packet(&mut self.port, &packet)
    }

    /// Wait for one status frame
    ///
    /// Past the deadline the partial frame is abandoned and
    /// [`BioloidError::Timeout`] is returned.
    pub fn recv_status(&mut self, packet: &mut Packet<'_>) -> Result<()> {
        let deadline = Instant::now() + self.timeout;

        loop {
            // Checked before every byte so constant line traffic cannot starve it
            if Instant::now() >= deadline {
                packet.reset();
                return Err(BioloidError::Timeout);
            }

            if self.port.available()? > 0 {
                let byte = self.port.read_byte()?;
                let status = packet.process_byte(byte);
                if status.is_done() {
                    return status_to_result(packet, status);
                }
            } else {
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }

    /// Send a command and collect the reply's parameters into `reply`
    ///
    /// Returns the number of reply bytes. Broadcasts return 0 without waiting.
    pub fn transact(
        &mut self,
        id: Id,
        command: Command,
        params: &[u8],
        reply: &mut [u8],
    ) -> Result<usize> {
        self.send(id, command, params)?;
        if id.is_broadcast() {
            return Ok(0);
        }

        let mut packet = Packet::new(reply);
        self.recv_status(&mut packet)?;

        if packet.id() != id {
            return Err(BioloidError::Protocol(format!(
                "reply from id {} to a request for id {}",
                packet.id(),
                id
            )));
        }
        let code = packet.error_code();
        if !code.is_none() {
            return Err(BioloidError::Device { id, code });
        }
        Ok(packet.num_params())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub fn ping(&mut self, id: Id) -> Result<()> {
        self.transact(id, Command::PING, &[], &mut [])?;
        Ok(())
    }

    /// Read `data.len()` bytes starting at `offset`
    pub fn read(&mut self, id: Id, offset: u8, data: &mut [u8]) -> Result<()> {
        if id.is_broadcast() {
            return Err(BioloidError::Protocol(
                "cannot read from the broadcast id".to_string(),
            ));
        }
        if data.len() > MAX_PARAMS {
            return Err(BioloidError::Protocol(format!(
                "cannot read {} bytes in one frame",
                data.len()
            )));
        }

        let expected = data.len();
        let received = self.transact(id, Command::READ, &[offset, expected as u8], data)?;
        if received != expected {
            return Err(BioloidError::Protocol(format!(
                "asked for {} bytes, device {} sent {}",
                expected, id, received
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self, id: Id, offset: u8) -> Result<u8> {
        let mut data = [0u8; 1];
        self.read(id, offset, &mut data)?;
        Ok(data[0])
    }

    pub fn read_u16(&mut self, id: Id, offset: u8) -> Result<u16> {
        let mut data = [0u8; 2];
        self.read(id, offset, &mut data)?;
        Ok(u16::from_le_bytes(data))
    }

    /// Write `data` starting at `offset`
    pub fn write(&mut self, id: Id, offset: u8, data: &[u8]) -> Result<()> {
        self.write_with(Command::WRITE, id, offset, data)
    }

    /// Stage a write to be applied by [`action`](Self::action)
    pub fn reg_write(&mut self, id: Id, offset: u8, data: &[u8]) -> Result<()> {
        self.write_with(Command::REG_WRITE, id, offset, data)
    }

    /// Apply staged writes
    pub fn action(&mut self, id: Id) -> Result<()> {
        self.transact(id, Command::ACTION, &[], &mut [])?;
        Ok(())
    }

    /// Restore a device's control table to its initial values
    pub fn reset(&mut self, id: Id) -> Result<()> {
        self.transact(id, Command::RESET, &[], &mut [])?;
        Ok(())
    }

    /// Write the same field of several devices in one broadcast frame
    ///
    /// Every entry must carry exactly `len` bytes.
    pub fn sync_write(&mut self, offset: u8, len: u8, entries: &[(Id, &[u8])]) -> Result<()> {
        let mut params = [0u8; MAX_PARAMS];
        params[0] = offset;
        params[1] = len;
        let mut n = 2;

        for (id, data) in entries {
            if data.len() != len as usize {
                return Err(BioloidError::Protocol(format!(
                    "sync write entry for id {} has {} bytes, expected {}",
                    id,
                    data.len(),
                    len
                )));
            }
            if n + 1 + data.len() > MAX_PARAMS {
                return Err(BioloidError::Protocol(
                    "sync write entries do not fit in a frame".to_string(),
                ));
            }
            params[n] = id.0;
            params[n + 1..n + 1 + data.len()].copy_from_slice(data);
            n += 1 + data.len();
        }

        self.send(Id::BROADCAST, Command::SYNC_WRITE, &params[..n])
    }

    /// Ping every id in `ids` and return those that answered
    pub fn scan(&mut self, ids: impl IntoIterator<Item = u8>) -> Result<Vec<Id>> {
        let mut found = Vec::new();
        for raw in ids {
            let id = Id(raw);
            if id.is_broadcast() || id == Id::INVALID {
                continue;
            }
            match self.ping(id) {
                Ok(()) | Err(BioloidError::Device { .. }) => found.push(id),
                Err(BioloidError::Timeout) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }

    fn write_with(&mut self, command: Command, id: Id, offset: u8, data: &[u8]) -> Result<()> {
        if data.len() + 1 > MAX_PARAMS {
            return Err(BioloidError::Protocol(format!(
                "cannot write {} bytes in one frame",
                data.len()
            )));
        }

        let mut params = [0u8; MAX_PARAMS];
        params[0] = offset;
        params[1..=data.len()].copy_from_slice(data);
        self.transact(id, command, &params[..=data.len()], &mut [])?;
        Ok(())
    }
}
