//! Network Module
//!
//! Serves a simulated device over TCP.
//!
//! ## Architecture
//! - Non-blocking accept loop polling a shutdown flag
//! - One bus master at a time, like a real half-duplex bus
//! - Each connection drives a `Device` over a `SocketPort`

mod connection;
mod server;

pub use connection::Connection;
pub use server::Server;
