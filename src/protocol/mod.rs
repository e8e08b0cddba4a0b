//! Protocol Module
//!
//! Defines the wire protocol spoken on the servo bus.
//!
//! ## Frame Format
//! ```text
//! ┌──────┬──────┬────────┬────────────┬─────────┬──────────────────────┬──────────┐
//! │ 0xFF │ 0xFF │ ID (1) │ Length (1) │ Cmd (1) │ Params (Length - 2)  │ Sum (1)  │
//! └──────┴──────┴────────┴────────────┴─────────┴──────────────────────┴──────────┘
//! ```
//! - Length = number of params + 2
//! - Sum = !(ID + Length + Cmd + Σ Params) truncated to 8 bits
//! - In a status (reply) packet the Cmd slot carries error flags
//!
//! ### Commands
//! - 0x01: PING       - Params: none
//! - 0x02: READ       - Params: offset, count
//! - 0x03: WRITE      - Params: offset, data...
//! - 0x04: REG_WRITE  - Params: offset, data...
//! - 0x05: ACTION     - Params: none
//! - 0x06: RESET      - Params: none
//! - 0x83: SYNC_WRITE - Params: offset, count, (id, data[count])...
//!
//! ### Ids
//! - 0xFE: broadcast (no device replies)
//! - 0xFF: never a valid id

mod codec;
mod packet;
mod types;

pub use codec::{
    compute_checksum, read_packet, status_to_result, write_packet, ParseState, ParseStatus,
};
pub use packet::{Packet, MAX_FRAME_SIZE, MAX_PARAMS, SYNC};
pub use types::{Command, ErrorCode, Id};
