use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

use crate::seekable_mmap::MappedSource;

/// A seekable byte source whose total length is known up front.
pub trait ByteSource: Read + Seek {
    /// Total length of the source in bytes.
    ///
    /// The default measures by seeking to the end and restores the previous
    /// position afterwards.
    fn byte_len(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(pos))?;
        Ok(len)
    }
}

impl ByteSource for File {
    fn byte_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

impl<T: AsRef<[u8]>> ByteSource for Cursor<T> {
    fn byte_len(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().as_ref().len() as u64)
    }
}

impl ByteSource for MappedSource {
    fn byte_len(&mut self) -> io::Result<u64> {
        Ok(self.len())
    }
}
