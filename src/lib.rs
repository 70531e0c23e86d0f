uniffi::setup_scaffolding!();

pub mod batch_reader;
pub mod encoding;
pub mod ffi;
pub mod io;
mod seekable_mmap;

pub mod types;
pub mod error;

pub use batch_reader::{relative_seek, BatchReader, Batches, Configured, Unconfigured};
pub use encoding::EncodingKind;
pub use error::{ReaderError, Result};
pub use ffi::BatchReaderHandle;
pub use seekable_mmap::MappedSource;
pub use types::{Batch, ReaderOptions, DEFAULT_BATCH_SIZE};
