//! Seek arithmetic and I/O failure handling, driven through instrumented sources

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::io::{self, Cursor, Read, Seek, SeekFrom};
    use std::rc::Rc;

    use hexdump_tools::io::ByteSource;
    use hexdump_tools::{BatchReader, EncodingKind, ReaderError, ReaderOptions};

    /// In-memory source that records every seek and can be told to fail.
    struct InstrumentedSource {
        inner: Cursor<Vec<u8>>,
        seeks: Rc<RefCell<Vec<SeekFrom>>>,
        fail_reads: Rc<Cell<bool>>,
        fail_seeks: Rc<Cell<bool>>,
        dropped: Rc<Cell<u32>>,
    }

    struct Probes {
        seeks: Rc<RefCell<Vec<SeekFrom>>>,
        fail_reads: Rc<Cell<bool>>,
        fail_seeks: Rc<Cell<bool>>,
        dropped: Rc<Cell<u32>>,
    }

    fn instrumented(data: &[u8]) -> (InstrumentedSource, Probes) {
        let probes = Probes {
            seeks: Rc::new(RefCell::new(Vec::new())),
            fail_reads: Rc::new(Cell::new(false)),
            fail_seeks: Rc::new(Cell::new(false)),
            dropped: Rc::new(Cell::new(0)),
        };
        let source = InstrumentedSource {
            inner: Cursor::new(data.to_vec()),
            seeks: Rc::clone(&probes.seeks),
            fail_reads: Rc::clone(&probes.fail_reads),
            fail_seeks: Rc::clone(&probes.fail_seeks),
            dropped: Rc::clone(&probes.dropped),
        };
        (source, probes)
    }

    impl Read for InstrumentedSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail_reads.get() {
                return Err(io::Error::new(io::ErrorKind::Other, "device error"));
            }
            self.inner.read(buf)
        }
    }

    impl Seek for InstrumentedSource {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            if self.fail_seeks.get() {
                return Err(io::Error::new(io::ErrorKind::Other, "seek failed"));
            }
            // stream_position is overridden, so only repositioning lands here.
            self.seeks.borrow_mut().push(pos);
            self.inner.seek(pos)
        }

        fn stream_position(&mut self) -> io::Result<u64> {
            Ok(self.inner.position())
        }
    }

    impl ByteSource for InstrumentedSource {
        fn byte_len(&mut self) -> io::Result<u64> {
            Ok(self.inner.get_ref().len() as u64)
        }
    }

    impl Drop for InstrumentedSource {
        fn drop(&mut self) {
            self.dropped.set(self.dropped.get() + 1);
        }
    }

    /// Source whose reads return at most `chunk` bytes at a time.
    struct TricklingSource {
        inner: Cursor<Vec<u8>>,
        chunk: usize,
        interrupted: bool,
    }

    impl Read for TricklingSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            let n = buf.len().min(self.chunk);
            self.inner.read(&mut buf[..n])
        }
    }

    impl Seek for TricklingSource {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl ByteSource for TricklingSource {}

    fn options(batch_size: usize) -> ReaderOptions {
        ReaderOptions::default().with_batch_size(batch_size)
    }

    #[test]
    fn seeks_are_relative_to_current_position() {
        let (source, probes) = instrumented(&[7u8; 40]);
        let mut reader = BatchReader::new(source, options(10))
            .unwrap()
            .set_encoding(EncodingKind::Ascii);

        reader.batch_by_index(2).unwrap().unwrap(); // 0 -> 20, ends at 30
        reader.batch_by_index(0).unwrap().unwrap(); // 30 -> 0, ends at 10
        reader.batch_by_index(3).unwrap().unwrap(); // 10 -> 30

        assert_eq!(
            *probes.seeks.borrow(),
            vec![
                SeekFrom::Current(20),
                SeekFrom::Current(-30),
                SeekFrom::Current(20),
            ]
        );
    }

    #[test]
    fn zero_length_seek_is_still_issued() {
        let (source, probes) = instrumented(&[1u8; 20]);
        let mut reader = BatchReader::new(source, options(10))
            .unwrap()
            .set_encoding(EncodingKind::Ascii);

        reader.next_batch().unwrap().unwrap(); // 0 -> 0
        reader.next_batch().unwrap().unwrap(); // 10 -> 10

        assert_eq!(
            *probes.seeks.borrow(),
            vec![SeekFrom::Current(0), SeekFrom::Current(0)]
        );
    }

    #[test]
    fn out_of_range_performs_no_io() {
        let (source, probes) = instrumented(&[1u8; 5]);
        let mut reader = BatchReader::new(source, options(5))
            .unwrap()
            .set_encoding(EncodingKind::Ascii);

        assert_eq!(reader.batch_by_index(1).unwrap(), None);
        assert_eq!(reader.batch_by_index(-1).unwrap(), None);
        assert!(probes.seeks.borrow().is_empty());
    }

    #[test]
    fn read_failure_closes_reader() {
        let (source, probes) = instrumented(b"abcdefgh");
        let mut reader = BatchReader::new(source, options(4))
            .unwrap()
            .set_encoding(EncodingKind::Ascii);

        assert_eq!(reader.batch_by_index(0).unwrap().unwrap().text, "abcd");

        probes.fail_reads.set(true);
        let err = reader.batch_by_index(1).unwrap_err();
        assert!(matches!(err, ReaderError::Io { .. }));
        assert_eq!(err.io_kind(), Some(io::ErrorKind::Other));
        assert!(reader.is_closed());
        assert_eq!(probes.dropped.get(), 1);

        // Poisoned even after the device recovers.
        probes.fail_reads.set(false);
        assert!(matches!(reader.batch_by_index(0), Err(ReaderError::Closed)));
        assert!(matches!(reader.next_batch(), Err(ReaderError::Closed)));

        reader.close();
        assert_eq!(probes.dropped.get(), 1);
    }

    #[test]
    fn seek_failure_closes_reader() {
        let (source, probes) = instrumented(b"abcdefgh");
        let mut reader = BatchReader::new(source, options(4))
            .unwrap()
            .set_encoding(EncodingKind::Ascii);

        probes.fail_seeks.set(true);
        assert!(matches!(reader.next_batch(), Err(ReaderError::Io { .. })));
        assert!(reader.is_closed());
        assert_eq!(reader.next_index(), 0);
        assert!(matches!(reader.next_batch(), Err(ReaderError::Closed)));
    }

    #[test]
    fn batches_iterator_stops_after_error() {
        let (source, probes) = instrumented(b"abcdefgh");
        let mut reader = BatchReader::new(source, options(2))
            .unwrap()
            .set_encoding(EncodingKind::Ascii);

        reader.next_batch().unwrap();
        probes.fail_reads.set(true);
        let results: Vec<_> = reader.batches().collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn source_released_exactly_once_on_drop() {
        let (source, probes) = instrumented(b"abc");
        let mut reader = BatchReader::new(source, options(2))
            .unwrap()
            .set_encoding(EncodingKind::Ascii);
        reader.close();
        reader.close();
        drop(reader);
        assert_eq!(probes.dropped.get(), 1);
    }

    #[test]
    fn partial_reads_fill_the_whole_batch() {
        let source = TricklingSource {
            inner: Cursor::new(b"0123456789".to_vec()),
            chunk: 3,
            interrupted: false,
        };
        let mut reader = BatchReader::new(source, options(8))
            .unwrap()
            .set_encoding(EncodingKind::Utf8);

        assert_eq!(reader.file_length(), 10);
        assert_eq!(reader.next_batch().unwrap().unwrap().text, "01234567");
        assert_eq!(reader.next_batch().unwrap().unwrap().text, "89");
        assert_eq!(reader.next_batch().unwrap(), None);
    }
}
