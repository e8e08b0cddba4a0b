//! Error types for the bioloid crate
//!
//! Provides a unified error type for bus, storage and transport operations.
//! Parser progress is not reported through this type: see
//! [`ParseStatus`](crate::protocol::ParseStatus).

use thiserror::Error;

use crate::protocol::{ErrorCode, Id};

/// Result type alias using BioloidError
pub type Result<T> = std::result::Result<T, BioloidError>;

/// Unified error type for bioloid operations
#[derive(Debug, Error)]
pub enum BioloidError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    #[error("Checksum mismatch: received 0x{received:02x}, expected 0x{expected:02x}")]
    ChecksumMismatch { expected: u8, received: u8 },

    #[error("Too much data: frame declared {declared} parameter bytes, storage holds {capacity}")]
    TooMuchData { declared: usize, capacity: usize },

    #[error("Timed out waiting for a reply")]
    Timeout,

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Bus Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Device {id} reported error: {code}")]
    Device { id: Id, code: ErrorCode },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BioloidError {
    /// True for errors that mean the peer went away rather than misbehaved
    pub fn is_disconnect(&self) -> bool {
        match self {
            BioloidError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
