//! Packet definition
//!
//! A single bus frame: id, command (or error code), parameters and checksum.
//! Parameter bytes live in storage owned by the caller; the packet only
//! borrows it, so building or parsing a frame never allocates.

use super::codec::{compute_checksum, ParseState};
use super::types::{Command, ErrorCode, Id};

/// Sync byte; two of them start every frame
pub const SYNC: u8 = 0xFF;

/// Largest parameter count the one-byte length field can describe
pub const MAX_PARAMS: usize = 0xFF - 2;

/// Largest complete frame: SYNC SYNC ID LENGTH CMD PARAMS CHECKSUM
pub const MAX_FRAME_SIZE: usize = 2 + 3 + MAX_PARAMS + 1;

/// A command or status packet over caller-supplied parameter storage
#[derive(Debug)]
pub struct Packet<'a> {
    pub(super) state: ParseState,
    pub(super) params: &'a mut [u8],
    pub(super) id: u8,
    pub(super) length: u8,
    pub(super) command: u8,
    pub(super) param_idx: u8,
    pub(super) checksum: u8,
}

impl<'a> Packet<'a> {
    /// Create a packet whose parameters are stored in `params`
    ///
    /// The capacity is `params.len()`.
    ///
    /// # Panics
    /// If `params` is longer than [`MAX_PARAMS`].
    pub fn new(params: &'a mut [u8]) -> Self {
        assert!(
            params.len() <= MAX_PARAMS,
            "parameter capacity {} exceeds MAX_PARAMS ({})",
            params.len(),
            MAX_PARAMS
        );
        Self {
            state: ParseState::Idle,
            params,
            id: Id::DEFAULT.0,
            length: 2,
            command: Command::PING.0,
            param_idx: 0,
            checksum: 0,
        }
    }

    // =========================================================================
    // Header Fields
    // =========================================================================

    pub fn id(&self) -> Id {
        Id(self.id)
    }

    pub fn set_id(&mut self, id: Id) {
        self.id = id.0;
    }

    pub fn command(&self) -> Command {
        Command(self.command)
    }

    pub fn set_command(&mut self, command: Command) {
        self.command = command.0;
    }

    /// The command slot read as status flags (status packets)
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode(self.command)
    }

    pub fn set_error_code(&mut self, code: ErrorCode) {
        self.command = code.0;
    }

    /// Length byte: parameter count plus two
    pub fn length(&self) -> u8 {
        self.length
    }

    /// Declared parameter count
    ///
    /// After a [`TooMuchData`](super::ParseStatus::TooMuchData) parse this
    /// exceeds [`capacity`](Self::capacity).
    pub fn num_params(&self) -> usize {
        (self.length as usize).saturating_sub(2)
    }

    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Current parser state
    pub fn state(&self) -> ParseState {
        self.state
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Number of parameter bytes the backing storage can hold
    pub fn capacity(&self) -> usize {
        self.params.len()
    }

    /// Stored parameter bytes (never more than the capacity)
    pub fn params(&self) -> &[u8] {
        let n = self.num_params().min(self.params.len());
        &self.params[..n]
    }

    /// The whole backing storage, for filling before `set_num_params`
    pub fn params_mut(&mut self) -> &mut [u8] {
        &mut *self.params
    }

    /// Copy `data` into the parameter storage, clamped to the capacity
    pub fn set_params(&mut self, data: &[u8]) {
        let n = data.len().min(self.params.len());
        self.params[..n].copy_from_slice(&data[..n]);
        self.length = 2 + n as u8;
    }

    /// Declare `num_params` bytes of already-filled storage, clamped to the capacity
    pub fn set_num_params(&mut self, num_params: usize) {
        self.length = 2 + num_params.min(self.params.len()) as u8;
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Recompute the checksum from id, length, command and parameters
    pub fn update_checksum(&mut self) {
        self.checksum = compute_checksum(self.id, self.length, self.command, self.params());
    }

    /// Write the wire form of this packet into `out`
    ///
    /// Stops as soon as `out` is full, and before the checksum if the declared
    /// parameters overran the storage. Returns the number of bytes written.
    pub fn serialize(&self, out: &mut [u8]) -> usize {
        let header = [SYNC, SYNC, self.id, self.length, self.command];
        let mut len = 0;

        for &byte in &header {
            if len >= out.len() {
                return len;
            }
            out[len] = byte;
            len += 1;
        }

        for idx in 0..self.num_params() {
            if idx >= self.params.len() {
                // Only the bytes that fitted were kept.
                return len;
            }
            if len >= out.len() {
                return len;
            }
            out[len] = self.params[idx];
            len += 1;
        }

        if len < out.len() {
            out[len] = self.checksum;
            len += 1;
        }
        len
    }

    /// Size of the full wire form
    pub fn frame_len(&self) -> usize {
        2 + 3 + self.num_params() + 1
    }
}
