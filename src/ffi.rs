//! UniFFI surface over [`BatchReader`].
//!
//! Foreign callers cannot hold the typed reader states, so the handle keeps
//! the state behind a `Mutex` and checks it at runtime: reads before an
//! encoding is selected fail with [`ReaderError::EncodingNotSet`] without
//! touching the file.
use std::fs::File;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::batch_reader::{BatchReader, Configured, Unconfigured};
use crate::encoding::EncodingKind;
use crate::error::ReaderError;
use crate::types::{Batch, ReaderOptions};

enum HandleState {
    Unconfigured(BatchReader<File, Unconfigured>),
    Configured(BatchReader<File, Configured>),
    Closed,
}

/// Opaque handle to an open batch reader. One call runs at a time; concurrent
/// callers queue on the handle's lock.
#[derive(uniffi::Object)]
pub struct BatchReaderHandle {
    inner: Mutex<HandleState>,
    file_length: u64,
    batch_size: u32,
}

#[uniffi::export]
impl BatchReaderHandle {
    /// Open `path`; `batch_size` defaults to 1024 bytes.
    #[uniffi::constructor]
    pub fn open(path: String, batch_size: Option<u32>) -> Result<Arc<Self>, ReaderError> {
        let mut options = ReaderOptions::default();
        if let Some(size) = batch_size {
            options = options.with_batch_size(size as usize);
        }

        let reader = BatchReader::open_with_options(&path, options)?;
        let batch_size = u32::try_from(reader.batch_size()).map_err(|_| {
            ReaderError::InvalidArgument(format!("batch size {} is too large", reader.batch_size()))
        })?;

        Ok(Arc::new(Self {
            file_length: reader.file_length(),
            batch_size,
            inner: Mutex::new(HandleState::Unconfigured(reader)),
        }))
    }

    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn set_encoding(&self, encoding: EncodingKind) -> Result<(), ReaderError> {
        let mut state = self.lock();
        let next = match mem::replace(&mut *state, HandleState::Closed) {
            HandleState::Unconfigured(reader) => HandleState::Configured(reader.set_encoding(encoding)),
            HandleState::Configured(mut reader) => {
                reader.set_encoding(encoding);
                HandleState::Configured(reader)
            }
            HandleState::Closed => return Err(ReaderError::Closed),
        };
        *state = next;
        Ok(())
    }

    pub fn encoding(&self) -> Option<EncodingKind> {
        match &*self.lock() {
            HandleState::Configured(reader) => Some(reader.encoding()),
            _ => None,
        }
    }

    pub fn batch_by_index(&self, index: i64) -> Result<Option<Batch>, ReaderError> {
        self.with_configured(|reader| reader.batch_by_index(index))
    }

    pub fn next_batch(&self) -> Result<Option<Batch>, ReaderError> {
        self.with_configured(|reader| reader.next_batch())
    }

    pub fn reset(&self) -> Result<(), ReaderError> {
        self.with_configured(|reader| {
            reader.reset();
            Ok(())
        })
    }

    pub fn seek_to_index(&self, index: i64) -> Result<(), ReaderError> {
        self.with_configured(|reader| reader.seek_to_index(index))
    }

    pub fn is_closed(&self) -> bool {
        match &*self.lock() {
            HandleState::Unconfigured(reader) => reader.is_closed(),
            HandleState::Configured(reader) => reader.is_closed(),
            HandleState::Closed => true,
        }
    }

    /// Release the file. Safe to call more than once; dropping the last
    /// reference releases it too.
    pub fn release(&self) {
        let mut state = self.lock();
        match &mut *state {
            HandleState::Unconfigured(reader) => reader.close(),
            HandleState::Configured(reader) => reader.close(),
            HandleState::Closed => {}
        }
        *state = HandleState::Closed;
    }
}

impl BatchReaderHandle {
    fn lock(&self) -> MutexGuard<'_, HandleState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_configured<T>(
        &self,
        f: impl FnOnce(&mut BatchReader<File, Configured>) -> Result<T, ReaderError>,
    ) -> Result<T, ReaderError> {
        match &mut *self.lock() {
            HandleState::Configured(reader) => f(reader),
            HandleState::Unconfigured(_) => Err(ReaderError::EncodingNotSet),
            HandleState::Closed => Err(ReaderError::Closed),
        }
    }
}

/// Parse an encoding name such as `utf-8` or `utf-16be`.
#[uniffi::export]
pub fn encoding_from_name(name: String) -> Result<EncodingKind, ReaderError> {
    name.parse()
}
