//! Chunked transfer-encoding framing.
//!
//! A chunked body might look like:
//! A\r\n
//! 0123456789\r\n
//! 0\r\n
//! \r\n

use std::io::{BufRead, Write};

use log::trace;
use thiserror::Error;

use crate::write::chunked::State::{Data, Finished, Size, TailingCrlf};

/// The zero-length chunk that ends a chunked body.
pub const TERMINATOR: &[u8] = b"0\r\n\r\n";

const CRLF: &[u8] = b"\r\n";

/// The maximum size of a single chunk accepted by the decoder.
const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024; // 16 megabytes

/// Gets the size line that starts a chunk of the given length, in lowercase hex.
pub fn chunk_header(len: u64) -> Vec<u8> {
    format!("{:x}\r\n", len).into_bytes()
}

/// Frames the buffer as a single chunk. Must not be called with an empty buffer, as an empty
/// chunk would end the body.
pub fn frame(buf: &[u8]) -> Vec<u8> {
    debug_assert!(!buf.is_empty(), "an empty chunk terminates the body");
    let mut chunk = chunk_header(buf.len() as u64);
    chunk.extend_from_slice(buf);
    chunk.extend_from_slice(CRLF);
    chunk
}

/// A writer that frames every write as a chunk. Empty writes are skipped.
/// The body must be ended with [`ChunkedWriter::finish`].
pub struct ChunkedWriter<W> {
    inner: W,
}

impl<W: Write> ChunkedWriter<W> {
    pub fn new(inner: W) -> ChunkedWriter<W> {
        ChunkedWriter { inner }
    }

    /// Writes the size line of a chunk whose payload the caller writes through
    /// [`ChunkedWriter::get_mut`], followed by [`ChunkedWriter::end_chunk`].
    pub fn start_chunk(&mut self, len: u64) -> std::io::Result<()> {
        trace!("starting chunk of {} bytes", len);
        self.inner.write_all(&chunk_header(len))
    }

    /// Writes the CRLF that ends a chunk started with [`ChunkedWriter::start_chunk`].
    pub fn end_chunk(&mut self) -> std::io::Result<()> {
        self.inner.write_all(CRLF)
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Writes the terminating chunk. Nothing may be written afterwards.
    pub fn finish(&mut self) -> std::io::Result<()> {
        trace!("writing terminating chunk");
        self.inner.write_all(TERMINATOR)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ChunkedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.start_chunk(buf.len() as u64)?;
        self.inner.write_all(buf)?;
        self.end_chunk()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Error for when a chunked body can't be decoded.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The reader failed or ended early.
    #[error("i/o error while decoding chunks: {0}")]
    Io(#[from] std::io::Error),
    /// Size of a chunk can not be parsed as a hex number, or is too large.
    #[error("invalid chunk size {0:?}")]
    InvalidChunkSize(String),
    /// Missing or misplaced CRLF.
    #[error("bad chunk syntax")]
    BadSyntax,
}

/// The state of the chunk decoder.
enum State {
    /// The size of the chunk is being read.
    Size,
    /// The content of a chunk with the given size is being read.
    Data(usize),
    /// The tailing CRLF after the data is being read. True if the chunk was the last one.
    TailingCrlf(bool),
    /// A 0 length chunk has been read last and there are no more chunks to read.
    Finished,
}

/// Decodes a chunked body, returning the concatenated chunk payloads. Reads nothing past the
/// terminating chunk.
pub fn decode(reader: &mut impl BufRead) -> Result<Vec<u8>, ChunkError> {
    let mut body = vec![];
    let mut state = Size;

    loop {
        state = match state {
            Size => Data(parse_chunk_size(&read_crlf_line(reader)?)?),
            Data(size) => {
                let start = body.len();
                body.resize(start + size, 0);
                reader.read_exact(&mut body[start..])?;
                TailingCrlf(size == 0)
            }
            TailingCrlf(is_last) => {
                if !read_crlf_line(reader)?.is_empty() {
                    return Err(ChunkError::BadSyntax);
                }
                if is_last { Finished } else { Size }
            }
            Finished => return Ok(body)
        }
    }
}

/// Reads a line ending in CRLF and returns it without the CRLF.
fn read_crlf_line(reader: &mut impl BufRead) -> Result<String, ChunkError> {
    let mut line = vec![];
    reader.read_until(b'\n', &mut line)?;
    if !line.ends_with(CRLF) {
        return match line.last() {
            Some(b'\n') => Err(ChunkError::BadSyntax),
            _ => Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into())
        };
    }
    line.truncate(line.len() - CRLF.len());
    String::from_utf8(line).map_err(|_| ChunkError::BadSyntax)
}

/// Parses the chunk size from the given line, ignoring any chunk extensions.
fn parse_chunk_size(raw: &str) -> Result<usize, ChunkError> {
    let digits = raw.split(';').next().unwrap_or("").trim();
    let size = usize::from_str_radix(digits, 16).map_err(|_| ChunkError::InvalidChunkSize(raw.to_string()))?;
    if size > MAX_CHUNK_SIZE {
        return Err(ChunkError::InvalidChunkSize(raw.to_string()));
    }
    Ok(size)
}
