//! Port Module
//!
//! Transports that carry bytes to and from the bus.
//!
//! ## Implementations
//! - [`SocketPort`]: a TCP stream standing in for a serial line
//! - [`ChannelPort`]: an in-process pair connected by channels

mod channel;
mod socket;

pub use channel::ChannelPort;
pub use socket::SocketPort;

use crate::error::Result;
use crate::protocol::Packet;

/// A half-duplex byte transport
pub trait Port {
    /// Number of bytes that can be read without blocking
    fn available(&mut self) -> Result<usize>;

    /// Read the next byte, blocking until one arrives
    fn read_byte(&mut self) -> Result<u8>;

    /// Serialize and transmit a whole frame
    fn write_packet(&mut self, packet: &Packet<'_>) -> Result<()>;

    /// Change the line rate (bits per second). Ports without a rate ignore it.
    fn set_baud_rate(&mut self, _baud_rate: u32) {}
}

impl<P: Port + ?Sized> Port for &mut P {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write_packet(&mut self, packet: &Packet<'_>) -> Result<()> {
        (**self).write_packet(packet)
    }

    fn set_baud_rate(&mut self, baud_rate: u32) {
        (**self).set_baud_rate(baud_rate)
    }
}
