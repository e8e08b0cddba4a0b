//! Protocol codec
//!
//! Byte-at-a-time frame parser and the blocking read/write helpers built on it.
//!
//! ## Parser States
//! ```text
//!            0xFF           0xFF          id            length        command
//!   Idle ─────────▶ Sync1 ────────▶ Sync2 ────────▶ Id ─────────▶ Length ────────▶ Body
//!    ▲    (other: stay)  │ (other)    ▲  │ (0xFF: stay)                              │
//!    └───────────────────┘            └──┘                                          │
//!    └──────────────────────────────── checksum byte consumed ──────────────────────┘
//! ```
//! The parser never allocates and never blocks; it keeps its state between
//! calls so a caller can feed bytes as they arrive.

use crate::error::{BioloidError, Result};
use crate::port::Port;

use super::packet::{Packet, SYNC};

/// Where the parser is within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Waiting for the first sync byte
    Idle,
    /// One sync byte seen
    Sync1Seen,
    /// Two sync bytes seen; extra sync bytes are absorbed here
    Sync2Seen,
    /// Id captured; next byte is the length
    IdReceived,
    /// Length captured; next byte is the command
    LengthReceived,
    /// Receiving parameter bytes, then the checksum
    ReceivingBody,
}

/// Outcome of feeding one byte to the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// More bytes are needed
    Incomplete,
    /// A frame was received and its checksum verified
    Complete,
    /// The frame's checksum did not match; the frame is discarded
    ChecksumMismatch { expected: u8, received: u8 },
    /// Checksum matched but the frame declared more parameters than fit.
    /// Id, command and the leading parameter bytes are still readable.
    TooMuchData,
}

impl ParseStatus {
    /// True once the parser has consumed a checksum byte
    pub fn is_done(self) -> bool {
        self != ParseStatus::Incomplete
    }
}

/// One's complement of the byte sum of id, length, command and parameters
pub fn compute_checksum(id: u8, length: u8, command: u8, params: &[u8]) -> u8 {
    let sum = params
        .iter()
        .fold(id.wrapping_add(length).wrapping_add(command), |acc, &b| {
            acc.wrapping_add(b)
        });
    !sum
}

// =============================================================================
// Incremental Parser
// =============================================================================

impl<'a> Packet<'a> {
    /// Feed one received byte to the parser
    ///
    /// The state returns to [`ParseState::Idle`] after the checksum byte,
    /// whatever the outcome, so the packet can be reused for the next frame.
    pub fn process_byte(&mut self, byte: u8) -> ParseStatus {
        let mut status = ParseStatus::Incomplete;

        self.state = match self.state {
            ParseState::Idle => {
                if byte == SYNC {
                    ParseState::Sync1Seen
                } else {
                    ParseState::Idle
                }
            }
            ParseState::Sync1Seen => {
                if byte == SYNC {
                    ParseState::Sync2Seen
                } else {
                    ParseState::Idle
                }
            }
            ParseState::Sync2Seen => {
                if byte == SYNC {
                    // 0xFF is never a valid id
                    ParseState::Sync2Seen
                } else {
                    self.id = byte;
                    self.checksum = byte;
                    ParseState::IdReceived
                }
            }
            ParseState::IdReceived => {
                self.length = byte;
                self.checksum = self.checksum.wrapping_add(byte);
                ParseState::LengthReceived
            }
            ParseState::LengthReceived => {
                self.command = byte;
                self.checksum = self.checksum.wrapping_add(byte);
                self.param_idx = 0;
                ParseState::ReceivingBody
            }
            ParseState::ReceivingBody => {
                if (self.param_idx as usize) < self.num_params() {
                    self.checksum = self.checksum.wrapping_add(byte);
                    let idx = self.param_idx as usize;
                    if idx < self.params.len() {
                        self.params[idx] = byte;
                    }
                    self.param_idx += 1;
                    ParseState::ReceivingBody
                } else {
                    status = self.finish_frame(byte);
                    ParseState::Idle
                }
            }
        };

        status
    }

    /// Abandon any partially received frame
    pub fn reset(&mut self) {
        self.state = ParseState::Idle;
    }

    fn finish_frame(&mut self, received: u8) -> ParseStatus {
        let expected = !self.checksum;
        // Keep the wire value so a bad frame reports what was received.
        self.checksum = received;

        if expected != received {
            tracing::debug!(
                "Rcvd checksum: 0x{:02x} expecting: 0x{:02x}",
                received,
                expected
            );
            return ParseStatus::ChecksumMismatch { expected, received };
        }

        if (self.param_idx as usize) <= self.params.len() {
            ParseStatus::Complete
        } else {
            tracing::debug!(
                "Frame for id {} declared {} params, storage holds {}",
                self.id,
                self.param_idx,
                self.params.len()
            );
            ParseStatus::TooMuchData
        }
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame from a port into `packet`
///
/// Blocks in [`Port::read_byte`] until a checksum byte is consumed. Frame
/// failures are reported as errors; the packet is left ready for the next frame.
pub fn read_packet<P: Port + ?Sized>(port: &mut P, packet: &mut Packet<'_>) -> Result<()> {
    loop {
        let byte = port.read_byte()?;
        match packet.process_byte(byte) {
            ParseStatus::Incomplete => continue,
            status => return status_to_result(packet, status),
        }
    }
}

/// Write a packet to a port
pub fn write_packet<P: Port + ?Sized>(port: &mut P, packet: &Packet<'_>) -> Result<()> {
    tracing::trace!(
        "Sending id={} cmd={} params={:02x?}",
        packet.id(),
        packet.command(),
        packet.params()
    );
    port.write_packet(packet)
}

/// Convert a finished parse into a `Result`
pub fn status_to_result(packet: &Packet<'_>, status: ParseStatus) -> Result<()> {
    match status {
        ParseStatus::Complete => Ok(()),
        ParseStatus::ChecksumMismatch { expected, received } => {
            Err(BioloidError::ChecksumMismatch { expected, received })
        }
        ParseStatus::TooMuchData => Err(BioloidError::TooMuchData {
            declared: packet.num_params(),
            capacity: packet.capacity(),
        }),
        ParseStatus::Incomplete => Err(BioloidError::Protocol(
            "frame is still incomplete".to_string(),
        )),
    }
}
