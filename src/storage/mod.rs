//! Storage Module
//!
//! Persistence for the durable prefix of a control table.
//!
//! ## Responsibilities
//! - Restore the persistent bytes of a table at start-up
//! - Persist them after configuration changes
//! - Fail without partially applying a load
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────┐
//! │ Control table bytes [0, num_persistent)    │
//! └───────────────────────────────────────────┘
//! ```
//! Raw bytes only: no header, no version, no checksum. Offset N in the file is
//! offset N in the table.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;

/// Backend that persists a byte range of a control table
pub trait Storage {
    /// Fill `data` with `data.len()` bytes starting at `offset`
    ///
    /// On failure `data` must be left untouched.
    fn load(&mut self, offset: u8, data: &mut [u8]) -> Result<()>;

    /// Persist `data` at `offset`, creating the backing store if needed
    fn save(&mut self, offset: u8, data: &[u8]) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn load(&mut self, offset: u8, data: &mut [u8]) -> Result<()> {
        (**self).load(offset, data)
    }

    fn save(&mut self, offset: u8, data: &[u8]) -> Result<()> {
        (**self).save(offset, data)
    }
}
