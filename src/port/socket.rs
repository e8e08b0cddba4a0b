//! Socket Port
//!
//! Carries bus traffic over a TCP stream, as used by serial-over-network
//! bridges and the device simulator.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::{Buf, BytesMut};

use crate::error::{BioloidError, Result};
use crate::protocol::{Packet, MAX_FRAME_SIZE};

use super::Port;

/// Bytes requested from the socket per read
const READ_CHUNK: usize = 256;

/// Port backed by a TCP stream
pub struct SocketPort {
    /// Underlying stream
    stream: TcpStream,

    /// Bytes received but not yet consumed
    rx: BytesMut,

    /// Peer address for logging
    peer_addr: String,

    /// Last rate requested through `set_baud_rate`
    baud_rate: Option<u32>,
}

impl SocketPort {
    /// Wrap an already connected stream
    pub fn new(stream: TcpStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Frames are tiny; don't let Nagle hold them back
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            rx: BytesMut::with_capacity(READ_CHUNK),
            peer_addr,
            baud_rate: None,
        })
    }

    /// Connect to a remote bus endpoint
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Self::new(stream)
    }

    /// Configure socket timeouts (`None` disables a timeout)
    ///
    /// A read timeout makes `read_byte` fail with [`BioloidError::Timeout`].
    pub fn set_timeouts(
        &mut self,
        read: Option<Duration>,
        write: Option<Duration>,
    ) -> Result<()> {
        self.stream.set_read_timeout(read)?;
        self.stream.set_write_timeout(write)?;
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Last baud rate requested by the device, if any
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }

    /// Pull whatever the socket has into the receive buffer
    fn fill(&mut self) -> io::Result<usize> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(n) => {
                    self.rx.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

fn peer_closed() -> BioloidError {
    io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed the connection").into()
}

impl Port for SocketPort {
    fn available(&mut self) -> Result<usize> {
        if self.rx.is_empty() {
            self.stream.set_nonblocking(true)?;
            let filled = self.fill();
            self.stream.set_nonblocking(false)?;

            match filled {
                Ok(0) => return Err(peer_closed()),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.rx.is_empty() {
            match self.fill() {
                Ok(0) => return Err(peer_closed()),
                Ok(_) => {}
                // Unix reports a read timeout as WouldBlock, Windows as TimedOut
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    return Err(BioloidError::Timeout)
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(self.rx.get_u8())
    }

    fn write_packet(&mut self, packet: &Packet<'_>) -> Result<()> {
        let mut frame = [0u8; MAX_FRAME_SIZE];
        let len = packet.serialize(&mut frame);
        self.stream.write_all(&frame[..len])?;
        self.stream.flush()?;
        Ok(())
    }

    fn set_baud_rate(&mut self, baud_rate: u32) {
        tracing::info!("{} requested {} baud", self.peer_addr, baud_rate);
        self.baud_rate = Some(baud_rate);
    }
}
