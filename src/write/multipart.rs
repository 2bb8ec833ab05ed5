//! multipart/form-data encoding.
//!
//! The encoder collects headers and in-memory values in a buffer and hands it to a [`PartOutput`]
//! whenever a source value has to be copied, so the same field formatting serves both the
//! chunked output written straight to the sink and the plain output spooled to a temporary file.

use std::io::{copy, ErrorKind, Read, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use encoding_rs::Encoding;
use log::debug;
use rand::RngCore;

use crate::common::body::{BodySource, FieldValue, FormField};
use crate::common::header::is_valid_value;
use crate::write::body::ensure_exhausted;
use crate::write::chunked::ChunkedWriter;
use crate::write::error::{ConfigError, EncodingError, Error};

/// Content type of file parts that don't declare one.
pub const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Size of the blocks read from sources of unknown size.
pub const PART_BLOCK_SIZE: usize = 4096;

/// RFC 2046 limits boundaries to 70 characters.
const MAX_BOUNDARY_LEN: usize = 70;

/// Number of random bytes in a generated boundary.
const BOUNDARY_ENTROPY: usize = 40;

/// Generates a fresh boundary from random bytes, base64url-encoded without padding.
pub fn generate_boundary() -> String {
    let mut bytes = [0u8; BOUNDARY_ENTROPY];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Checks the boundary only uses the characters RFC 2046 allows, and does not end in a space.
pub fn validate_boundary(boundary: &str) -> Result<(), ConfigError> {
    let valid = !boundary.is_empty()
        && boundary.len() <= MAX_BOUNDARY_LEN
        && !boundary.ends_with(' ')
        && boundary.bytes().all(|b| b.is_ascii_alphanumeric() || b"'()+_,-./:=? ".contains(&b));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidBoundary(boundary.to_string()))
    }
}

/// Looks up the character set for the given label. Only character sets that text can be
/// encoded into are accepted.
pub fn resolve_charset(label: &str) -> Result<&'static Encoding, EncodingError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| EncodingError::UnknownCharset(label.to_string()))?;
    if encoding.output_encoding() != encoding {
        return Err(EncodingError::UnsupportedCharset(encoding.name().to_string()));
    }
    Ok(encoding)
}

/// Escapes backslashes and double quotes, then transcodes to the character set if one is given.
/// Characters the character set can't represent become decimal numeric character references.
pub fn quote(value: &str, charset: Option<&'static Encoding>) -> Vec<u8> {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    match charset {
        Some(encoding) => encoding.encode(&escaped).0.into_owned(),
        None => escaped.into_bytes()
    }
}

/// Destination of an encoded multipart body.
pub trait PartOutput {
    /// Writes encoded bytes. Never called with an empty buffer.
    fn write_encoded(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Whether source values are copied through [`PartOutput::copy_source`]. If not, the
    /// encoder reads them fully into its own buffer.
    fn streams_sources(&self) -> bool;

    /// Copies a source value to the output.
    fn copy_source(&mut self, source: &mut dyn BodySource) -> std::io::Result<()>;

    /// Ends the body.
    fn finish(&mut self) -> std::io::Result<()>;
}

/// Writes the body straight to a sink, framed as chunks.
pub struct ChunkedOutput<W> {
    writer: ChunkedWriter<W>,
}

impl<W: Write> ChunkedOutput<W> {
    pub fn new(sink: W) -> ChunkedOutput<W> {
        ChunkedOutput { writer: ChunkedWriter::new(sink) }
    }
}

impl<W: Write> PartOutput for ChunkedOutput<W> {
    fn write_encoded(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(buf)
    }

    fn streams_sources(&self) -> bool {
        true
    }

    /// A source of known size is sent as one chunk and copied in bulk. Other sources are sent
    /// one chunk per block read.
    fn copy_source(&mut self, source: &mut dyn BodySource) -> std::io::Result<()> {
        if let Some(size) = source.size().filter(|size| *size > 0) {
            self.writer.start_chunk(size)?;
            let copied = copy(&mut (&mut *source).take(size), self.writer.get_mut())?;
            if copied != size {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("form field source ended after {} of {} bytes", copied, size),
                ));
            }
            ensure_exhausted(source, size)?;
            return self.writer.end_chunk();
        }

        let mut block = vec![0u8; PART_BLOCK_SIZE];
        loop {
            let len = match source.read(&mut block) {
                Ok(0) => return Ok(()),
                Ok(len) => len,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e)
            };
            self.writer.write_all(&block[..len])?;
        }
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.writer.finish()
    }
}

/// Writes the body unframed. Used to spool the body to a temporary file when its length has to
/// be known before the headers are written.
pub struct PlainOutput<W> {
    inner: W,
}

impl<W: Write> PlainOutput<W> {
    pub fn new(inner: W) -> PlainOutput<W> {
        PlainOutput { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> PartOutput for PlainOutput<W> {
    fn write_encoded(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(buf)
    }

    fn streams_sources(&self) -> bool {
        true
    }

    fn copy_source(&mut self, source: &mut dyn BodySource) -> std::io::Result<()> {
        copy(source, &mut self.inner).map(|_| ())
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Collects the whole body in memory.
#[derive(Default)]
pub struct MemoryOutput {
    pub body: Vec<u8>,
}

impl PartOutput for MemoryOutput {
    fn write_encoded(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.body.extend_from_slice(buf);
        Ok(())
    }

    fn streams_sources(&self) -> bool {
        false
    }

    fn copy_source(&mut self, source: &mut dyn BodySource) -> std::io::Result<()> {
        source.read_to_end(&mut self.body).map(|_| ())
    }

    fn finish(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Encodes form fields as multipart/form-data with a fixed boundary.
pub struct MultipartEncoder<'a> {
    boundary: &'a str,
    charset: Option<&'static Encoding>,
    buf: Vec<u8>,
}

impl<'a> MultipartEncoder<'a> {
    /// Creates an encoder. Fails if the boundary is invalid or the character set can't be used.
    pub fn new(boundary: &'a str, charset: Option<&str>) -> Result<MultipartEncoder<'a>, Error> {
        validate_boundary(boundary)?;
        let charset = charset.map(resolve_charset).transpose()?;
        debug!("multipart encoder with boundary {:?}, charset {:?}", boundary, charset.map(Encoding::name));
        Ok(MultipartEncoder { boundary, charset, buf: vec![] })
    }

    /// Checks the fields can be encoded without breaking the part headers. Names, filenames and
    /// content types must not hold line breaks.
    pub fn check(&self, fields: &[FormField]) -> Result<(), ConfigError> {
        for field in fields {
            if !is_valid_value(&field.name) {
                return Err(ConfigError::InvalidHeaderValue("Content-Disposition".to_string(), field.name.clone()));
            }
            if let Some(filename) = field.file_name().filter(|filename| !is_valid_value(filename)) {
                return Err(ConfigError::InvalidHeaderValue("Content-Disposition".to_string(), filename));
            }
            if let Some(content_type) = &field.content_type {
                if !is_valid_value(content_type) {
                    return Err(ConfigError::InvalidHeaderValue("Content-Type".to_string(), content_type.clone()));
                }
            }
        }
        Ok(())
    }

    /// Encodes every field followed by the closing delimiter, then finishes the output.
    pub fn encode(&mut self, fields: &mut [FormField], out: &mut impl PartOutput) -> Result<(), Error> {
        self.check(fields)?;
        self.buf.clear();

        for field in fields.iter_mut() {
            self.encode_field(field, out)?;
        }

        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"--\r\n");
        self.flush(out)?;
        out.finish()?;
        Ok(())
    }

    /// Encodes the fields into memory.
    pub fn encode_to_vec(&mut self, fields: &mut [FormField]) -> Result<Vec<u8>, Error> {
        let mut out = MemoryOutput::default();
        self.encode(fields, &mut out)?;
        Ok(out.body)
    }

    fn encode_field(&mut self, field: &mut FormField, out: &mut impl PartOutput) -> std::io::Result<()> {
        let name = quote(&field.name, self.charset);

        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"\r\nContent-Disposition: form-data; name=\"");
        self.buf.extend_from_slice(&name);
        self.buf.push(b'"');

        if let Some(filename) = field.file_name() {
            let content_type = field.content_type.as_deref().unwrap_or(DEFAULT_FILE_CONTENT_TYPE);
            self.buf.extend_from_slice(b"; filename=\"");
            self.buf.extend_from_slice(&quote(&filename, self.charset));
            self.buf.extend_from_slice(b"\"\r\nContent-Type: ");
            self.buf.extend_from_slice(content_type.as_bytes());
        }
        self.buf.extend_from_slice(b"\r\n\r\n");

        match &mut field.value {
            FieldValue::Bytes(bytes) => self.buf.extend_from_slice(bytes),
            FieldValue::Source(source) if out.streams_sources() => {
                self.flush(out)?;
                out.copy_source(source.as_mut())?;
            }
            FieldValue::Source(source) => {
                source.read_to_end(&mut self.buf)?;
            }
        }

        self.buf.extend_from_slice(b"\r\n");
        Ok(())
    }

    fn flush(&mut self, out: &mut impl PartOutput) -> std::io::Result<()> {
        if !self.buf.is_empty() {
            out.write_encoded(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }
}
