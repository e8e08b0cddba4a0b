//! Table hooks
//!
//! Device-specific behaviour attached to a control table: extra defaults,
//! lazily refreshed fields and side effects of writes.

use super::Registers;

/// Per-device behaviour of a [`ControlTable`](super::ControlTable)
///
/// Hooks see the raw [`Registers`], so they can read and write fields freely
/// without triggering other hooks.
pub trait TableHooks {
    /// Set device-specific defaults. Runs after the base fields were reset.
    fn set_initial_values(&mut self, _regs: &mut Registers) {}

    /// Refresh the field at `offset` before it is read
    fn populate_entry(&mut self, _regs: &mut Registers, _offset: u8) {}

    /// React to a write of the field at `offset`
    fn entry_modified(&mut self, _regs: &mut Registers, _offset: u8) {}
}

/// A table with only the base behaviour
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl TableHooks for NoHooks {}

impl<H: TableHooks + ?Sized> TableHooks for &mut H {
    fn set_initial_values(&mut self, regs: &mut Registers) {
        (**self).set_initial_values(regs)
    }

    fn populate_entry(&mut self, regs: &mut Registers, offset: u8) {
        (**self).populate_entry(regs, offset)
    }

    fn entry_modified(&mut self, regs: &mut Registers, offset: u8) {
        (**self).entry_modified(regs, offset)
    }
}
