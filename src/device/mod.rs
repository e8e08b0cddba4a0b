//! Device Module
//!
//! The device side of the bus: receives command frames, executes them against
//! a control table and answers with status frames.
//!
//! ## Commands
//! ```text
//! PING        []                              -> status
//! READ        [offset, len]                   -> status [data; len]
//! WRITE       [offset, data...]               -> status
//! REG_WRITE   [offset, data...]               -> status, applied on ACTION
//! ACTION      []                              -> status
//! RESET       []                              -> status
//! SYNC_WRITE  [offset, len, (id, data)...]    -> no reply
//! ```
//! Frames sent to [`Id::BROADCAST`] are executed but never answered.

mod servo;

pub use servo::SimulatedServo;

use std::time::Duration;

use crate::control_table::{offset, ControlTable, TableHooks};
use crate::error::Result;
use crate::port::Port;
use crate::protocol::{write_packet, Command, ErrorCode, Id, Packet, ParseStatus, MAX_PARAMS};
use crate::storage::Storage;

/// A write parked by REG_WRITE until ACTION
struct PendingWrite {
    offset: u8,
    len: usize,
    data: [u8; MAX_PARAMS],
}

/// Executes bus commands against a control table
pub struct Device<H, S, P> {
    table: ControlTable<H, S, P>,
    pending: Option<PendingWrite>,
}

impl<H: TableHooks, S: Storage, P: Port> Device<H, S, P> {
    /// Wrap a table that has already been loaded or reset
    pub fn new(table: ControlTable<H, S, P>) -> Self {
        Self {
            table,
            pending: None,
        }
    }

    /// Current device id
    pub fn id(&self) -> Id {
        Id(self.table.registers().read::<u8>(offset::ID))
    }

    pub fn table(&self) -> &ControlTable<H, S, P> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ControlTable<H, S, P> {
        &mut self.table
    }

    pub fn into_table(self) -> ControlTable<H, S, P> {
        self.table
    }

    /// Receive and execute one frame from the table's port
    ///
    /// Blocks until a checksum byte is consumed. Port errors (including a
    /// read timeout) abandon any partially received frame.
    pub fn step(&mut self) -> Result<ParseStatus> {
        let mut storage = [0u8; MAX_PARAMS];
        let mut packet = Packet::new(&mut storage);

        loop {
            let byte = self.table.port_mut().read_byte()?;
            let status = packet.process_byte(byte);
            if status.is_done() {
                self.handle_packet(&packet, status)?;
                return Ok(status);
            }
        }
    }

    /// Execute a frame the parser has finished with
    pub fn handle_packet(&mut self, packet: &Packet<'_>, status: ParseStatus) -> Result<()> {
        let my_id = self.id();
        let addressed = packet.id() == my_id;
        if !addressed && !packet.id().is_broadcast() {
            tracing::trace!("Ignoring frame for id {}", packet.id());
            return Ok(());
        }

        match status {
            ParseStatus::Incomplete => Ok(()),
            ParseStatus::ChecksumMismatch { .. } => {
                if addressed {
                    self.reply(my_id, ErrorCode::CHECKSUM, &[])
                } else {
                    Ok(())
                }
            }
            ParseStatus::TooMuchData => {
                tracing::debug!(
                    "Dropping {} frame with {} params",
                    packet.command(),
                    packet.num_params()
                );
                Ok(())
            }
            ParseStatus::Complete => {
                tracing::trace!(
                    "Executing {} params={:02x?}",
                    packet.command(),
                    packet.params()
                );
                let mut data = [0u8; MAX_PARAMS];
                match self.execute(packet, &mut data) {
                    Some((code, len)) if addressed => self.reply(my_id, code, &data[..len]),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Run a command. Returns the status flags and number of reply bytes,
    /// or `None` for commands that are never answered.
    fn execute(&mut self, packet: &Packet<'_>, data: &mut [u8]) -> Option<(ErrorCode, usize)> {
        let params = packet.params();

        let code = match packet.command() {
            Command::PING => ErrorCode::NONE,
            Command::READ => return Some(self.read(params, data)),
            Command::WRITE => match self.check_write(params) {
                Ok((offset, bytes)) => {
                    self.apply_write(offset, bytes);
                    ErrorCode::NONE
                }
                Err(code) => code,
            },
            Command::REG_WRITE => match self.check_write(params) {
                Ok((offset, bytes)) => {
                    let mut pending = PendingWrite {
                        offset,
                        len: bytes.len(),
                        data: [0; MAX_PARAMS],
                    };
                    pending.data[..bytes.len()].copy_from_slice(bytes);
                    self.pending = Some(pending);
                    ErrorCode::NONE
                }
                Err(code) => code,
            },
            Command::ACTION => {
                if let Some(pending) = self.pending.take() {
                    self.apply_write(pending.offset, &pending.data[..pending.len]);
                }
                ErrorCode::NONE
            }
            Command::RESET => {
                tracing::info!("Resetting control table to initial values");
                self.table.reset_to_initial_values();
                self.save();
                ErrorCode::NONE
            }
            Command::SYNC_WRITE => {
                self.sync_write(params);
                return None;
            }
            other => {
                tracing::debug!("Unknown command 0x{:02x}", other.0);
                ErrorCode::INSTRUCTION
            }
        };

        Some((code, 0))
    }

    fn read(&mut self, params: &[u8], data: &mut [u8]) -> (ErrorCode, usize) {
        if params.len() < 2 {
            return (ErrorCode::INSTRUCTION, 0);
        }
        let (start, len) = (params[0], params[1] as usize);
        if start as usize + len > self.table.num_ctl_bytes() || len > data.len() {
            return (ErrorCode::RANGE, 0);
        }
        for (i, byte) in data[..len].iter_mut().enumerate() {
            *byte = self.table.get_u8(start + i as u8);
        }
        (ErrorCode::NONE, len)
    }

    /// Validate `[offset, data...]` against the table
    fn check_write<'p>(&self, params: &'p [u8]) -> std::result::Result<(u8, &'p [u8]), ErrorCode> {
        match params.split_first() {
            Some((&start, bytes)) if !bytes.is_empty() => {
                if start as usize + bytes.len() > self.table.num_ctl_bytes() {
                    Err(ErrorCode::RANGE)
                } else {
                    Ok((start, bytes))
                }
            }
            _ => Err(ErrorCode::INSTRUCTION),
        }
    }

    /// Store bytes one field at a time so every offset's hooks fire
    fn apply_write(&mut self, start: u8, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            self.table.set_u8(start + i as u8, byte);
        }
        if self.table.is_persistent(start) {
            self.save();
        }
    }

    fn sync_write(&mut self, params: &[u8]) {
        let (start, len) = match params {
            [start, len, ..] if *len > 0 => (*start, *len as usize),
            _ => return,
        };
        let my_id = self.id().0;
        let entry = params[2..]
            .chunks_exact(len + 1)
            .find(|chunk| chunk[0] == my_id);
        if let Some(chunk) = entry {
            if start as usize + len <= self.table.num_ctl_bytes() {
                self.apply_write(start, &chunk[1..]);
            }
        }
    }

    fn save(&mut self) {
        if let Err(e) = self.table.save() {
            tracing::warn!("Failed to save control table: {}", e);
        }
    }

    fn reply(&mut self, id: Id, code: ErrorCode, data: &[u8]) -> Result<()> {
        let delay = self.table.registers().read::<u8>(offset::RDT) as u64 * 2;
        if delay > 0 {
            std::thread::sleep(Duration::from_micros(delay));
        }

        let mut storage = [0u8; MAX_PARAMS];
        let mut status = Packet::new(&mut storage);
        status.set_id(id);
        status.set_error_code(code);
        status.set_params(data);
        status.update_checksum();
        write_packet(self.table.port_mut(), &status)
    }
}
