use std::cell::RefCell;
use std::cmp::min;
use std::io::{Error, ErrorKind, Read, Write};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::common::body::BodySource;

/// A reader that hands out the given pieces of data, one piece (or part of one) per read.
pub struct MockReader {
    pub data: Vec<Vec<u8>>,
    /// Size reported through BodySource, independent of the actual data.
    pub size: Option<u64>,
    pub path: Option<PathBuf>,
    /// Fail with this error kind once the data runs out, instead of returning EOF.
    pub error_when_empty: Option<ErrorKind>,
    /// Number of reads that fail with `Interrupted` before any data is handed out.
    pub interruptions: usize,
    /// The length of every buffer passed to read.
    pub reads: Rc<RefCell<Vec<usize>>>,
}

impl MockReader {
    pub fn from_strs(data: Vec<&str>) -> MockReader {
        MockReader::from_bytes(data.into_iter().map(|s| s.as_bytes()).collect())
    }

    pub fn from_bytes(data: Vec<&[u8]>) -> MockReader {
        MockReader {
            data: data.into_iter().map(|s| s.to_vec()).collect(),
            size: None,
            path: None,
            error_when_empty: None,
            interruptions: 0,
            reads: Rc::new(RefCell::new(vec![])),
        }
    }

    /// Reports the total length of the data as the source size.
    pub fn sized(mut self) -> MockReader {
        self.size = Some(self.data.iter().map(|piece| piece.len() as u64).sum());
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> MockReader {
        self.path = Some(path);
        self
    }

    pub fn failing_with(mut self, kind: ErrorKind) -> MockReader {
        self.error_when_empty = Some(kind);
        self
    }

    pub fn interrupted(mut self, times: usize) -> MockReader {
        self.interruptions = times;
        self
    }
}

impl Read for MockReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reads.borrow_mut().push(buf.len());
        if self.interruptions > 0 {
            self.interruptions -= 1;
            return Err(Error::from(ErrorKind::Interrupted));
        }

        let next = match self.data.first_mut() {
            Some(next) => next,
            None => return match self.error_when_empty {
                Some(kind) => Err(Error::from(kind)),
                None => Ok(0)
            }
        };

        let amount = min(buf.len(), next.len());
        buf[..amount].copy_from_slice(&next[..amount]);
        next.drain(0..amount);

        if next.is_empty() {
            self.data.remove(0);
        }

        Ok(amount)
    }
}

impl BodySource for MockReader {
    fn size(&self) -> Option<u64> {
        self.size
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// A writer that records every write and flush.
pub struct MockWriter {
    pub written: Rc<RefCell<Vec<Vec<u8>>>>,
    pub flushed: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl MockWriter {
    pub fn new() -> MockWriter {
        MockWriter { written: Rc::new(RefCell::new(vec![])), flushed: Rc::new(RefCell::new(vec![])) }
    }

    /// Everything written so far, flushed or not.
    pub fn all_bytes(&self) -> Vec<u8> {
        let mut bytes = self.flushed.borrow().concat();
        bytes.extend(self.written.borrow().concat());
        bytes
    }
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.written.borrow_mut().push(Vec::from(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flushed.borrow_mut().append(self.written.borrow_mut().deref_mut());
        Ok(())
    }
}

/// A writer that accepts a limited number of bytes, then fails every write.
pub struct FailingWriter {
    pub written: Vec<u8>,
    pub limit: usize,
}

impl FailingWriter {
    pub fn new(limit: usize) -> FailingWriter {
        FailingWriter { written: vec![], limit }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let room = self.limit - self.written.len();
        if room == 0 {
            return Err(Error::new(ErrorKind::BrokenPipe, "sink closed"));
        }
        let amount = min(room, buf.len());
        self.written.extend_from_slice(&buf[..amount]);
        Ok(amount)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{ErrorKind, Read, Write};

    use crate::util::mock::{FailingWriter, MockReader};

    fn test_read(reader: &mut impl Read, expected: &str, buf_size: usize) {
        let mut buf = vec![0u8; buf_size];
        let len = reader.read(&mut buf).unwrap();
        assert_eq!(expected, String::from_utf8_lossy(&buf[..len]));
    }

    #[test]
    fn mock_reader() {
        let mut reader = MockReader::from_strs(vec!["hello", "world"]);

        test_read(&mut reader, "hel", 3);
        test_read(&mut reader, "lo", 10);
        test_read(&mut reader, "world", 10);
        test_read(&mut reader, "", 10);

        assert_eq!(*reader.reads.borrow(), vec![3, 10, 10, 10]);
    }

    #[test]
    fn mock_reader_error_when_empty() {
        let mut reader = MockReader::from_strs(vec!["a"]).failing_with(ErrorKind::ConnectionReset);
        test_read(&mut reader, "a", 4);
        assert_eq!(reader.read(&mut [0u8; 4]).unwrap_err().kind(), ErrorKind::ConnectionReset);
    }

    #[test]
    fn mock_reader_interrupted() {
        let mut reader = MockReader::from_strs(vec!["a"]).interrupted(1);
        assert_eq!(reader.read(&mut [0u8; 4]).unwrap_err().kind(), ErrorKind::Interrupted);
        test_read(&mut reader, "a", 4);
    }

    #[test]
    fn failing_writer() {
        let mut writer = FailingWriter::new(4);
        assert!(writer.write_all(b"hello").is_err());
        assert_eq!(writer.written, b"hell");
    }
}
