use std::fs::File;
use std::io::{self, Read, Result as IoResult, Seek, SeekFrom};

use memmap2::Mmap;

/// Read-only memory-mapped file exposed as `Read + Seek` through an internal
/// cursor. Single-threaded, like every other source the reader wraps.
#[derive(Debug)]
pub struct MappedSource {
    mmap: Option<Mmap>,
    pos: u64,
}

impl MappedSource {
    /// Map `file` for reading.
    ///
    /// Safety: the mapping stays valid only while the file is not truncated
    /// underneath it.
    pub fn open(file: &File) -> IoResult<Self> {
        // Zero-length files cannot be mapped on every platform.
        if file.metadata()?.len() == 0 {
            return Ok(Self { mmap: None, pos: 0 });
        }
        // SAFETY: the file is opened read-only by the caller and this type
        // never hands out references that outlive the mapping.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self {
            mmap: Some(mmap),
            pos: 0,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Read for MappedSource {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        // A cursor past the end reads nothing, like a file.
        let start = usize::try_from(self.pos).unwrap_or(usize::MAX);
        let mut remaining = self.as_slice().get(start..).unwrap_or(&[]);
        let n = remaining.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for MappedSource {
    fn seek(&mut self, how: SeekFrom) -> IoResult<u64> {
        let (base, delta) = match how {
            SeekFrom::Start(off) => {
                self.pos = off;
                return Ok(off);
            }
            SeekFrom::End(delta) => (self.len(), delta),
            SeekFrom::Current(delta) => (self.pos, delta),
        };

        self.pos = base.checked_add_signed(delta).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seek by {} from {} leaves the mapping", delta, base),
            )
        })?;
        Ok(self.pos)
    }
}
