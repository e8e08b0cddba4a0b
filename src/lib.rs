//! # bioloid
//!
//! The Bioloid servo-bus protocol for both ends of the wire:
//! - An incremental, allocation-free packet parser and serializer
//! - A hookable control table with persistent and volatile regions
//! - Device-side command dispatch and a bus master
//! - File, memory, TCP and in-process backends
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐                     ┌──────────────────────────┐
//! │         Bus          │   command frames    │          Device          │
//! │  ping / read / write ├────────────────────▶│   dispatch per command   │
//! │   (raises Timeout)   │◀────────────────────┤                          │
//! └──────────┬───────────┘    status frames    └────────────┬─────────────┘
//!            │                                              │
//!            ▼                                              ▼
//!   ┌─────────────────┐                           ┌──────────────────┐
//!   │ Packet + codec  │                           │   ControlTable   │
//!   │ (byte-by-byte)  │                           │  hooks, baud fx  │
//!   └────────┬────────┘                           └───┬──────────┬───┘
//!            │                                        │          │
//!            ▼                                        ▼          ▼
//!   ┌─────────────────┐                       ┌────────────┐ ┌────────┐
//!   │      Port       │                       │  Storage   │ │  Port  │
//!   │ socket/channel  │                       │ file/memory│ │        │
//!   └─────────────────┘                       └────────────┘ └────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod bus;
pub mod control_table;
pub mod device;
pub mod network;
pub mod port;
pub mod protocol;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use bus::Bus;
pub use config::Config;
pub use control_table::{ControlTable, TableHooks};
pub use device::{Device, SimulatedServo};
pub use error::{BioloidError, Result};
pub use protocol::{Command, ErrorCode, Id, Packet, ParseStatus};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the bioloid crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
