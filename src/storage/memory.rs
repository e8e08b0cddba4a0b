//! Memory Storage
//!
//! A RAM image standing in for EEPROM, for tests and throwaway devices.

use crate::control_table::MAX_CTL_BYTES;
use crate::error::{BioloidError, Result};

use super::Storage;

/// Storage kept in memory
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    image: [u8; MAX_CTL_BYTES],
    /// Highest byte ever saved; loads beyond it fail like a short file
    len: usize,
    fail: bool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Empty storage: every load fails until something is saved
    pub fn new() -> Self {
        Self {
            image: [0; MAX_CTL_BYTES],
            len: 0,
            fail: false,
        }
    }

    /// Make every subsequent load and save fail (or succeed again)
    pub fn set_failing(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// Bytes saved so far
    pub fn contents(&self) -> &[u8] {
        &self.image[..self.len]
    }

    fn range(&self, offset: u8, len: usize) -> Result<std::ops::Range<usize>> {
        if self.fail {
            return Err(BioloidError::Storage("memory storage set to fail".to_string()));
        }
        let start = offset as usize;
        let end = start + len;
        if end > MAX_CTL_BYTES {
            return Err(BioloidError::Storage(format!(
                "range {}..{} exceeds {} bytes",
                start, end, MAX_CTL_BYTES
            )));
        }
        Ok(start..end)
    }
}

impl Storage for MemoryStorage {
    fn load(&mut self, offset: u8, data: &mut [u8]) -> Result<()> {
        let range = self.range(offset, data.len())?;
        if range.end > self.len {
            return Err(BioloidError::Storage(format!(
                "short read: {} of {} bytes saved",
                self.len, range.end
            )));
        }
        data.copy_from_slice(&self.image[range]);
        Ok(())
    }

    fn save(&mut self, offset: u8, data: &[u8]) -> Result<()> {
        let range = self.range(offset, data.len())?;
        self.len = self.len.max(range.end);
        self.image[range].copy_from_slice(data);
        Ok(())
    }
}
