//! Register file
//!
//! Fixed-capacity byte buffer with typed little-endian views. This is the raw
//! layer: no hooks run here, which is what hook implementations are handed.

use std::ops::Range;

use super::MAX_CTL_BYTES;

mod sealed {
    pub trait Sealed {}
}

/// Integer types that can be stored in a control table
pub trait Field: Copy + sealed::Sealed {
    /// Width in bytes
    const SIZE: usize;

    /// Decode from exactly `SIZE` little-endian bytes
    fn from_le(bytes: &[u8]) -> Self;

    /// Encode into exactly `SIZE` little-endian bytes
    fn write_le(self, out: &mut [u8]);
}

macro_rules! impl_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Field for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn from_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                fn write_le(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_field!(u8, u16, u32, i8, i16, i32);

/// The bytes of one control table
///
/// Offsets `[0, num_persistent)` are the durable region, the rest is volatile.
#[derive(Clone)]
pub struct Registers {
    bytes: [u8; MAX_CTL_BYTES],
    len: usize,
    num_persistent: usize,
}

impl Registers {
    /// Create a zeroed register file
    ///
    /// # Panics
    /// If `len` exceeds [`MAX_CTL_BYTES`] or `num_persistent` exceeds `len`.
    pub fn new(len: usize, num_persistent: usize) -> Self {
        assert!(
            len <= MAX_CTL_BYTES,
            "control table length {} exceeds {}",
            len,
            MAX_CTL_BYTES
        );
        assert!(
            num_persistent <= len,
            "persistent region {} exceeds control table length {}",
            num_persistent,
            len
        );
        Self {
            bytes: [0; MAX_CTL_BYTES],
            len,
            num_persistent,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_persistent(&self) -> usize {
        self.num_persistent
    }

    /// Byte range of a `T` at `offset`
    ///
    /// # Panics
    /// If the field does not lie entirely inside the table.
    pub fn field_range<T: Field>(&self, offset: u8) -> Range<usize> {
        let start = offset as usize;
        let end = start + T::SIZE;
        assert!(
            end <= self.len,
            "offset {} + size {} exceeds control table length {}",
            start,
            T::SIZE,
            self.len
        );
        start..end
    }

    /// Read a value without running hooks
    pub fn read<T: Field>(&self, offset: u8) -> T {
        let range = self.field_range::<T>(offset);
        T::from_le(&self.bytes[range])
    }

    /// Write a value without running hooks
    pub fn write<T: Field>(&mut self, offset: u8, value: T) {
        let range = self.field_range::<T>(offset);
        value.write_le(&mut self.bytes[range]);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn persistent(&self) -> &[u8] {
        &self.bytes[..self.num_persistent]
    }

    pub fn persistent_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.num_persistent]
    }

    /// Zero every byte of the table
    pub fn clear(&mut self) {
        self.bytes[..self.len].fill(0);
    }
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registers")
            .field("bytes", &self.as_bytes())
            .field("num_persistent", &self.num_persistent)
            .finish()
    }
}
