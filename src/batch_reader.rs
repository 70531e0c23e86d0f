use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, trace, warn};

use crate::encoding::EncodingKind;
use crate::error::{ReaderError, Result};
use crate::io::ByteSource;
use crate::seekable_mmap::MappedSource;
use crate::types::{Batch, ReaderOptions};

/// Reader state before an encoding has been selected. No read methods exist
/// in this state.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured;

/// Reader state once an encoding has been selected.
#[derive(Debug, Clone, Copy)]
pub struct Configured {
    encoding: EncodingKind,
}

/// Reads a byte source in fixed-size batches, addressable by index or
/// sequentially, decoding each batch under the selected encoding.
///
/// The reader owns one reusable buffer; each returned [`Batch`] holds its own
/// copy of the bytes. A failed seek or read drops the source and every later
/// call returns [`ReaderError::Closed`].
pub struct BatchReader<R, S = Unconfigured> {
    source: Option<R>,
    buffer: Vec<u8>,
    file_length: u64,
    batch_size: usize,
    next_index: u64,
    state: S,
}

/// Distance to move from `current` to reach `target`, for use with
/// `SeekFrom::Current`. `None` if either position does not fit in an `i64`.
pub fn relative_seek(target: u64, current: u64) -> Option<i64> {
    let target = i64::try_from(target).ok()?;
    let current = i64::try_from(current).ok()?;
    target.checked_sub(current)
}

impl BatchReader<File, Unconfigured> {
    /// Open `path` read-only with the default batch size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ReaderOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ReaderError::io(format!("opening {}", path.display()), e))?;
        debug!("opened {}", path.display());
        BatchReader::new(file, options)
    }
}

impl BatchReader<MappedSource, Unconfigured> {
    /// Open `path` through a read-only memory map with the default batch size.
    pub fn open_mmap<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_mmap_with_options(path, ReaderOptions::default())
    }

    pub fn open_mmap_with_options<P: AsRef<Path>>(
        path: P,
        options: ReaderOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ReaderError::io(format!("opening {}", path.display()), e))?;
        let mapped = MappedSource::open(&file)
            .map_err(|e| ReaderError::io(format!("mapping {}", path.display()), e))?;
        debug!("mapped {}", path.display());
        BatchReader::new(mapped, options)
    }
}

impl<R: ByteSource> BatchReader<R, Unconfigured> {
    /// Wrap an already open source. The length is captured once, here.
    pub fn new(mut source: R, options: ReaderOptions) -> Result<Self> {
        options.validate()?;
        let file_length = source
            .byte_len()
            .map_err(|e| ReaderError::io("measuring source length", e))?;
        debug!(
            "batch reader over {} bytes, batch size {}",
            file_length, options.batch_size
        );

        Ok(BatchReader {
            source: Some(source),
            buffer: vec![0u8; options.batch_size],
            file_length,
            batch_size: options.batch_size,
            next_index: 0,
            state: Unconfigured,
        })
    }

    /// Select the encoding, enabling reads.
    pub fn set_encoding(self, encoding: EncodingKind) -> BatchReader<R, Configured> {
        BatchReader {
            source: self.source,
            buffer: self.buffer,
            file_length: self.file_length,
            batch_size: self.batch_size,
            next_index: self.next_index,
            state: Configured { encoding },
        }
    }
}

impl<R, S> BatchReader<R, S> {
    /// Source length in bytes, as measured when the reader was created.
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches the source splits into.
    pub fn batch_count(&self) -> u64 {
        self.file_length.div_ceil(self.batch_size as u64)
    }

    /// Index `next_batch` will serve.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// Rewind sequential reading to the first batch.
    pub fn reset(&mut self) {
        self.next_index = 0;
    }

    /// Make `next_batch` serve `index` next.
    pub fn seek_to_index(&mut self, index: i64) -> Result<()> {
        let index = u64::try_from(index).map_err(|_| {
            ReaderError::InvalidArgument(format!("batch index {} is negative", index))
        })?;
        self.next_index = index;
        Ok(())
    }

    /// Release the source. Calling this again is a no-op.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("batch reader closed");
        }
    }

    fn offset_for(&self, index: u64) -> Option<u64> {
        let offset = index.checked_mul(self.batch_size as u64)?;
        (offset < self.file_length).then_some(offset)
    }
}

impl<R: ByteSource> BatchReader<R, Configured> {
    pub fn encoding(&self) -> EncodingKind {
        self.state.encoding
    }

    /// Switch encoding. Already returned batches keep their text.
    pub fn set_encoding(&mut self, encoding: EncodingKind) {
        self.state.encoding = encoding;
    }

    /// Batch at `index`, or `None` when `index` is negative or the batch
    /// would start at or past the end of the source.
    ///
    /// On success `next_batch` continues from `index + 1`.
    pub fn batch_by_index(&mut self, index: i64) -> Result<Option<Batch>> {
        self.ensure_open()?;
        let Ok(index) = u64::try_from(index) else {
            return Ok(None);
        };
        let Some(offset) = self.offset_for(index) else {
            return Ok(None);
        };

        let batch = self.read_batch(offset)?;
        self.next_index = index + 1;
        Ok(Some(batch))
    }

    /// Batch following the one last served by either read method.
    pub fn next_batch(&mut self) -> Result<Option<Batch>> {
        self.ensure_open()?;
        let Some(offset) = self.offset_for(self.next_index) else {
            return Ok(None);
        };

        let batch = self.read_batch(offset)?;
        self.next_index += 1;
        Ok(Some(batch))
    }

    /// Iterate the remaining batches through `next_batch`.
    pub fn batches(&mut self) -> Batches<'_, R> {
        Batches { reader: self }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.source.is_none() {
            return Err(ReaderError::Closed);
        }
        Ok(())
    }

    fn read_batch(&mut self, offset: u64) -> Result<Batch> {
        let source = self.source.as_mut().ok_or(ReaderError::Closed)?;

        let filled = match fill_window(source, offset, &mut self.buffer) {
            Ok(filled) => filled,
            Err(e) => {
                warn!("I/O failure at offset {}, closing reader: {}", offset, e);
                self.source = None;
                return Err(e);
            }
        };

        if filled == 0 {
            warn!(
                "no bytes at offset {} although source length is {}",
                offset, self.file_length
            );
        }

        // Short final batches are truncated; the buffer tail holds stale data.
        let bytes = self.buffer[..filled].to_vec();
        let text = self.state.encoding.decode(&bytes);
        Ok(Batch {
            bytes,
            text,
            offset,
        })
    }
}

/// Iterator over the remaining batches of a configured reader.
///
/// Yields `Result<Batch>` so I/O errors reach the caller; stops after the
/// first error.
pub struct Batches<'a, R> {
    reader: &'a mut BatchReader<R, Configured>,
}

impl<R: ByteSource> Iterator for Batches<'_, R> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.is_closed() {
            return None;
        }
        self.reader.next_batch().transpose()
    }
}

/// Move `source` to `target` relative to its current position, then read
/// until `buf` is full or the source is exhausted.
fn fill_window<R: ByteSource>(source: &mut R, target: u64, buf: &mut [u8]) -> Result<usize> {
    let current = source
        .stream_position()
        .map_err(|e| ReaderError::io("querying source position", e))?;
    let delta = relative_seek(target, current).ok_or_else(|| {
        ReaderError::io(
            "computing seek distance",
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot move from {} to {}", current, target),
            ),
        )
    })?;

    trace!("seek {:+} from {} to {}", delta, current, target);
    source
        .seek(SeekFrom::Current(delta))
        .map_err(|e| ReaderError::io(format!("seeking to offset {}", target), e))?;

    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReaderError::io(format!("reading at offset {}", target), e)),
        }
    }
    trace!("read {} bytes at {}", filled, target);
    Ok(filled)
}
