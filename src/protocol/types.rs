//! Codec constants
//!
//! Device ids, command codes and status error flags. Each is a newtype over
//! the wire byte with associated constants rather than a closed enum, so a
//! device can define values of its own (custom commands, vendor flags).

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

// =============================================================================
// Device ID
// =============================================================================

/// Address of a device on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id(pub u8);

impl Id {
    /// Factory default id
    pub const DEFAULT: Id = Id(0x00);
    /// Addresses every device on the bus; devices never reply to it
    pub const BROADCAST: Id = Id(0xFE);
    /// Never a real id: it would be indistinguishable from a sync byte
    pub const INVALID: Id = Id(0xFF);

    pub fn is_broadcast(self) -> bool {
        self == Id::BROADCAST
    }
}

impl From<u8> for Id {
    fn from(value: u8) -> Self {
        Id(value)
    }
}

impl From<Id> for u8 {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_broadcast() {
            write!(f, "BROADCAST")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Instruction code carried in a command packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command(pub u8);

impl Command {
    /// Requests an empty status packet
    pub const PING: Command = Command(0x01);
    /// Reads values from the control table
    pub const READ: Command = Command(0x02);
    /// Writes values to the control table
    pub const WRITE: Command = Command(0x03);
    /// Primes a write that is applied on ACTION
    pub const REG_WRITE: Command = Command(0x04);
    /// Applies a primed REG_WRITE
    pub const ACTION: Command = Command(0x05);
    /// Restores the control table to factory defaults
    pub const RESET: Command = Command(0x06);
    /// Writes the same range on many devices in one packet
    pub const SYNC_WRITE: Command = Command(0x83);

    const NAMES: [(Command, &'static str); 7] = [
        (Command::PING, "PING"),
        (Command::READ, "READ"),
        (Command::WRITE, "WRITE"),
        (Command::REG_WRITE, "REG_WRITE"),
        (Command::ACTION, "ACTION"),
        (Command::RESET, "RESET"),
        (Command::SYNC_WRITE, "SYNC_WRITE"),
    ];

    /// Name of a predefined command, or `"???"` for anything else
    pub fn as_str(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(cmd, _)| *cmd == self)
            .map(|(_, name)| *name)
            .unwrap_or("???")
    }
}

impl From<u8> for Command {
    fn from(value: u8) -> Self {
        Command(value)
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> Self {
        cmd.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Status Error Flags
// =============================================================================

/// Error bits returned in the command slot of a status packet
///
/// Several bits may be set at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ErrorCode(pub u8);

impl ErrorCode {
    pub const NONE: ErrorCode = ErrorCode(0x00);
    /// Input voltage out of range
    pub const INPUT_VOLTAGE: ErrorCode = ErrorCode(0x01);
    /// Goal position outside the angle limits
    pub const ANGLE_LIMIT: ErrorCode = ErrorCode(0x02);
    /// Internal temperature too high
    pub const OVERHEATING: ErrorCode = ErrorCode(0x04);
    /// Instruction argument out of range
    pub const RANGE: ErrorCode = ErrorCode(0x08);
    /// Checksum of the instruction packet was wrong
    pub const CHECKSUM: ErrorCode = ErrorCode(0x10);
    /// Maximum torque cannot hold the applied load
    pub const OVERLOAD: ErrorCode = ErrorCode(0x20);
    /// Undefined instruction
    pub const INSTRUCTION: ErrorCode = ErrorCode(0x40);
    /// Reserved, always zero on the wire
    pub const RESERVED: ErrorCode = ErrorCode(0x80);

    // Indexed by bit number.
    const FLAG_NAMES: [&'static str; 8] = [
        "InputVoltage",
        "AngleLimit",
        "Overheating",
        "Range",
        "Checksum",
        "Overload",
        "Instruction",
        "Reserved",
    ];

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `flags` is set in `self`
    pub fn contains(self, flags: ErrorCode) -> bool {
        self.0 & flags.0 == flags.0
    }
}

impl BitOr for ErrorCode {
    type Output = ErrorCode;

    fn bitor(self, rhs: ErrorCode) -> ErrorCode {
        ErrorCode(self.0 | rhs.0)
    }
}

impl BitOrAssign for ErrorCode {
    fn bitor_assign(&mut self, rhs: ErrorCode) {
        self.0 |= rhs.0;
    }
}

impl From<u8> for ErrorCode {
    fn from(value: u8) -> Self {
        ErrorCode(value)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("None");
        }
        let mut first = true;
        for (bit, name) in Self::FLAG_NAMES.iter().enumerate() {
            if self.0 & (1 << bit) != 0 {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
