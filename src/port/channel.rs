//! Channel Port
//!
//! Two ends of an in-process bus. Whatever one end writes, the other reads.

use std::io;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::error::{BioloidError, Result};
use crate::protocol::{Packet, MAX_FRAME_SIZE};

use super::Port;

/// One end of an in-process byte pipe
pub struct ChannelPort {
    tx: Sender<u8>,
    rx: Receiver<u8>,
    read_timeout: Option<Duration>,
    baud_rate: Option<u32>,
}

impl ChannelPort {
    /// Create two connected ends
    pub fn pair() -> (ChannelPort, ChannelPort) {
        let (a_tx, b_rx) = channel::unbounded();
        let (b_tx, a_rx) = channel::unbounded();
        (Self::from_channels(a_tx, a_rx), Self::from_channels(b_tx, b_rx))
    }

    fn from_channels(tx: Sender<u8>, rx: Receiver<u8>) -> Self {
        Self {
            tx,
            rx,
            read_timeout: None,
            baud_rate: None,
        }
    }

    /// Make `read_byte` give up with [`BioloidError::Timeout`] after `timeout`
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }

    /// Push raw bytes to the other end, bypassing framing
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.tx.send(byte).map_err(|_| disconnected())?;
        }
        Ok(())
    }

    /// Last baud rate requested, if any
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }
}

fn disconnected() -> BioloidError {
    io::Error::new(io::ErrorKind::BrokenPipe, "other end of the channel port was dropped").into()
}

fn closed() -> BioloidError {
    io::Error::new(io::ErrorKind::UnexpectedEof, "other end of the channel port was dropped").into()
}

impl Port for ChannelPort {
    fn available(&mut self) -> Result<usize> {
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        match self.read_timeout {
            Some(timeout) => self.rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => BioloidError::Timeout,
                RecvTimeoutError::Disconnected => closed(),
            }),
            None => self.rx.recv().map_err(|_| closed()),
        }
    }

    fn write_packet(&mut self, packet: &Packet<'_>) -> Result<()> {
        let mut frame = [0u8; MAX_FRAME_SIZE];
        let len = packet.serialize(&mut frame);
        self.write_raw(&frame[..len])
    }

    fn set_baud_rate(&mut self, baud_rate: u32) {
        self.baud_rate = Some(baud_rate);
    }
}
