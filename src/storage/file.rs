//! File Storage
//!
//! Keeps the persistent bytes in a flat file, using the table offset as the
//! seek position.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::control_table::MAX_CTL_BYTES;
use crate::error::{BioloidError, Result};

use super::Storage;

/// Storage backed by a single file
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Path of the backing file
    path: PathBuf,
}

impl FileStorage {
    /// Create storage at `path`; the file is created on the first save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn failed(&self, what: &str, err: std::io::Error) -> BioloidError {
        BioloidError::Storage(format!("{} {}: {}", what, self.path.display(), err))
    }
}

impl Storage for FileStorage {
    fn load(&mut self, offset: u8, data: &mut [u8]) -> Result<()> {
        if data.len() > MAX_CTL_BYTES {
            return Err(BioloidError::Storage(format!(
                "cannot load {} bytes (max {})",
                data.len(),
                MAX_CTL_BYTES
            )));
        }
        let mut file = File::open(&self.path).map_err(|e| self.failed("open", e))?;
        file.seek(SeekFrom::Start(offset as u64))
            .map_err(|e| self.failed("seek", e))?;

        // Read into scratch space so a short read leaves `data` alone
        let mut scratch = [0u8; MAX_CTL_BYTES];
        let scratch = &mut scratch[..data.len()];
        file.read_exact(scratch)
            .map_err(|e| self.failed("read", e))?;

        data.copy_from_slice(scratch);
        tracing::trace!("Loaded {} bytes from {}", data.len(), self.path.display());
        Ok(())
    }

    fn save(&mut self, offset: u8, data: &[u8]) -> Result<()> {
        // Create if missing, keep existing contents otherwise
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| self.failed("open", e))?;
        file.seek(SeekFrom::Start(offset as u64))
            .map_err(|e| self.failed("seek", e))?;
        file.write_all(data).map_err(|e| self.failed("write", e))?;
        file.flush().map_err(|e| self.failed("flush", e))?;

        tracing::trace!("Saved {} bytes to {}", data.len(), self.path.display());
        Ok(())
    }
}
