//! Control Table Module
//!
//! A device's configuration and status as a byte-addressable register file.
//!
//! ## Base Layout
//! ```text
//! Offset  Size  Field                  Region
//! 0x00    2     Model number           persistent
//! 0x02    1     Firmware version       persistent
//! 0x03    1     Device id              persistent
//! 0x04    1     Baud divisor           persistent   rate = 2_000_000 / (value + 1)
//! 0x05    1     Return delay time      persistent   delay = value * 2 µs
//! 0x19    1     Status LED             volatile
//! ```
//! Devices append their own fields and choose where the persistent region
//! ends. Multi-byte fields are little-endian.

mod hooks;
mod registers;
mod table;

pub use hooks::{NoHooks, TableHooks};
pub use registers::{Field, Registers};
pub use table::ControlTable;

/// Largest table addressable with one-byte offsets
pub const MAX_CTL_BYTES: usize = 256;

/// Clock the baud divisor divides
pub const BAUD_CLOCK: u32 = 2_000_000;

/// Initial device id
pub const DEFAULT_DEVICE_ID: u8 = 0x00;

/// Initial baud divisor (1 Mbit/s)
pub const DEFAULT_BAUD: u8 = 0x01;

/// Initial return delay (500 µs)
pub const DEFAULT_RDT: u8 = 250;

/// Offsets of the fields every device has
pub mod offset {
    /// Model number, 2 bytes
    pub const MODEL: u8 = 0x00;
    /// Firmware version
    pub const VERSION: u8 = 0x02;
    /// Device id
    pub const ID: u8 = 0x03;
    /// Baud rate divisor
    pub const BAUD: u8 = 0x04;
    /// Return delay time, in 2 µs units
    pub const RDT: u8 = 0x05;
    /// Status LED
    pub const LED: u8 = 0x19;
}
