use crate::error::{ReaderError, Result};

/// Batch size used when no options are given.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// One window of the source: the bytes read, their decoded text and the
/// offset the window starts at.
///
/// `bytes` is an owned copy, so a batch never changes after it is returned.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct Batch {
    pub bytes: Vec<u8>,
    pub text: String,
    pub offset: u64,
}

impl Batch {
    /// Offset one past the last byte of this batch.
    pub fn end_offset(&self) -> u64 {
        self.offset + self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Maximum number of bytes per batch. Every batch except the last one is
    /// exactly this long.
    pub batch_size: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ReaderOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ReaderError::InvalidArgument(
                "batch size must be greater than zero".to_string(),
            ));
        }
        // Offsets are computed in i64 for relative seeks.
        if i64::try_from(self.batch_size).is_err() {
            return Err(ReaderError::InvalidArgument(format!(
                "batch size {} is too large",
                self.batch_size
            )));
        }
        Ok(())
    }
}
