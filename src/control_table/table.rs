//! Control table implementation
//!
//! Typed field access over [`Registers`] with hooks, persistence and the
//! baud-rate side effect.

use crate::error::Result;
use crate::port::Port;
use crate::storage::Storage;

use super::{
    offset, Field, Registers, TableHooks, BAUD_CLOCK, DEFAULT_BAUD, DEFAULT_DEVICE_ID, DEFAULT_RDT,
};

/// A device's register file together with its collaborators
///
/// - `hooks`: device-specific behaviour
/// - `storage`: persists the durable prefix
/// - `port`: the transport, reconfigured when the baud field is written
pub struct ControlTable<H, S, P> {
    regs: Registers,
    hooks: H,
    storage: S,
    port: P,
}

impl<H: TableHooks, S: Storage, P: Port> ControlTable<H, S, P> {
    /// Create a zeroed table
    ///
    /// Call [`load`](Self::load) or
    /// [`reset_to_initial_values`](Self::reset_to_initial_values) before use.
    ///
    /// # Panics
    /// If the table is too small for the base fields, larger than
    /// [`MAX_CTL_BYTES`](super::MAX_CTL_BYTES), or the persistent region is
    /// longer than the table.
    pub fn new(
        num_ctl_bytes: usize,
        num_persistent_bytes: usize,
        hooks: H,
        storage: S,
        port: P,
    ) -> Self {
        assert!(
            num_ctl_bytes > offset::RDT as usize,
            "control table length {} cannot hold the base fields",
            num_ctl_bytes
        );
        Self {
            regs: Registers::new(num_ctl_bytes, num_persistent_bytes),
            hooks,
            storage,
            port,
        }
    }

    // =========================================================================
    // Field Access
    // =========================================================================

    /// Read the field at `offset`, refreshing it first
    ///
    /// # Panics
    /// If `offset + size_of::<T>()` exceeds the table length.
    pub fn get<T: Field>(&mut self, offset: u8) -> T {
        self.regs.field_range::<T>(offset);
        self.hooks.populate_entry(&mut self.regs, offset);
        self.regs.read(offset)
    }

    /// Write the field at `offset`, then run its side effects
    ///
    /// # Panics
    /// If `offset + size_of::<T>()` exceeds the table length.
    pub fn set<T: Field>(&mut self, offset: u8, value: T) {
        self.regs.write(offset, value);
        self.entry_modified(offset);
    }

    pub fn get_u8(&mut self, offset: u8) -> u8 {
        self.get(offset)
    }

    pub fn get_u16(&mut self, offset: u8) -> u16 {
        self.get(offset)
    }

    pub fn get_u32(&mut self, offset: u8) -> u32 {
        self.get(offset)
    }

    pub fn get_i8(&mut self, offset: u8) -> i8 {
        self.get(offset)
    }

    pub fn get_i16(&mut self, offset: u8) -> i16 {
        self.get(offset)
    }

    pub fn get_i32(&mut self, offset: u8) -> i32 {
        self.get(offset)
    }

    pub fn set_u8(&mut self, offset: u8, value: u8) {
        self.set(offset, value)
    }

    pub fn set_u16(&mut self, offset: u8, value: u16) {
        self.set(offset, value)
    }

    pub fn set_u32(&mut self, offset: u8, value: u32) {
        self.set(offset, value)
    }

    pub fn set_i8(&mut self, offset: u8, value: i8) {
        self.set(offset, value)
    }

    pub fn set_i16(&mut self, offset: u8, value: i16) {
        self.set(offset, value)
    }

    pub fn set_i32(&mut self, offset: u8, value: i32) {
        self.set(offset, value)
    }

    fn entry_modified(&mut self, offset: u8) {
        if offset == offset::BAUD {
            let divisor = self.regs.read::<u8>(offset::BAUD) as u32 + 1;
            let baud_rate = BAUD_CLOCK / divisor;
            tracing::info!("Baud rate set to {}", baud_rate);
            self.port.set_baud_rate(baud_rate);
        }
        self.hooks.entry_modified(&mut self.regs, offset);
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Restore the persistent region from storage
    ///
    /// The volatile region is zeroed. If storage fails the whole table is
    /// reset to its initial values instead.
    pub fn load(&mut self) {
        self.regs.clear();
        match self.storage.load(0, self.regs.persistent_mut()) {
            Ok(()) => {
                tracing::debug!("Loaded {} persistent bytes", self.regs.num_persistent());
            }
            Err(e) => {
                tracing::debug!("Load failed ({}), using initial values", e);
                self.reset_to_initial_values();
            }
        }
    }

    /// Write the persistent region to storage
    pub fn save(&mut self) -> Result<()> {
        self.storage.save(0, self.regs.persistent())
    }

    /// Zero the table, then apply base and device defaults
    pub fn reset_to_initial_values(&mut self) {
        self.regs.clear();
        self.set_u8(offset::ID, DEFAULT_DEVICE_ID);
        self.set_u8(offset::BAUD, DEFAULT_BAUD);
        self.set_u8(offset::RDT, DEFAULT_RDT);
        self.hooks.set_initial_values(&mut self.regs);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Raw table contents, without refreshing anything
    pub fn bytes(&self) -> &[u8] {
        self.regs.as_bytes()
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn num_ctl_bytes(&self) -> usize {
        self.regs.len()
    }

    pub fn num_persistent_bytes(&self) -> usize {
        self.regs.num_persistent()
    }

    /// True if `offset` lies in the durable region
    pub fn is_persistent(&self, offset: u8) -> bool {
        (offset as usize) < self.regs.num_persistent()
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
