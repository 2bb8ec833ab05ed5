//! Body framing. Picks how a request body goes on the wire, sets the framing headers before
//! anything is written, then writes the headers and the body.

use std::io::{copy, ErrorKind, Read, Seek, SeekFrom, Write};

use log::{debug, warn};
use tempfile::SpooledTempFile;

use crate::common::body::{Body, BodySource, FieldValue, Form, FormField};
use crate::common::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, TRANSFER_ENCODING};
use crate::common::request::{FORM_URLENCODED, MULTIPART_FORM_DATA};
use crate::write::chunked::ChunkedWriter;
use crate::write::error::{ConfigError, Error};
use crate::write::multipart::{ChunkedOutput, generate_boundary, MultipartEncoder, PlainOutput};
use crate::write::request::RequestHead;

/// Size of the blocks read from a stream body.
pub const STREAM_BLOCK_SIZE: usize = 1024;

/// Multipart bodies up to this size are spooled in memory, larger ones to a temporary file.
pub const SPOOL_THRESHOLD: usize = 64 * 1024;

/// Writes the headers and the body, choosing the framing by the kind of body.
pub fn send_body<W: Write>(sink: &mut W, head: &RequestHead, headers: &mut HeaderMap, body: &mut Body) -> Result<(), Error> {
    match body {
        Body::Bytes(bytes) => send_buffer(sink, head, headers, bytes),
        Body::Stream(source) => send_stream(sink, head, headers, source.as_mut()),
        Body::Form(form) => send_form(sink, head, headers, form),
        Body::Empty => {
            debug!("no body, writing headers only");
            head.write(sink, headers)?;
            Ok(())
        }
        Body::Consumed => Err(ConfigError::BodyConsumed.into())
    }
}

fn supply_default_content_type(headers: &mut HeaderMap) {
    if !headers.contains(&CONTENT_TYPE) {
        warn!("Content-Type not set for request body, using {}", FORM_URLENCODED);
        headers.set_content_type(FORM_URLENCODED, &[]);
    }
}

fn send_buffer<W: Write>(sink: &mut W, head: &RequestHead, headers: &mut HeaderMap, buf: &[u8]) -> Result<(), Error> {
    debug!("sending {} byte body with Content-Length", buf.len());
    headers.set_content_length(buf.len() as u64);
    headers.remove(&TRANSFER_ENCODING);
    supply_default_content_type(headers);

    head.write(sink, headers)?;
    sink.write_all(buf)?;
    Ok(())
}

fn send_stream<W: Write>(
    sink: &mut W,
    head: &RequestHead,
    headers: &mut HeaderMap,
    source: &mut dyn BodySource,
) -> Result<(), Error> {
    let length = match (headers.content_length().transpose()?, headers.is_chunked()) {
        (None, false) => return Err(ConfigError::UnframedStream.into()),
        (Some(_), true) => return Err(ConfigError::AmbiguousFraming.into()),
        (length, _) => length
    };
    supply_default_content_type(headers);
    head.write(sink, headers)?;

    match length {
        Some(expected) => {
            debug!("streaming body of {} bytes", expected);
            let sent = copy_blocks(&mut (&mut *source).take(expected), sink)?;
            if sent < expected {
                warn!("Content-Length is {} but the stream body had {} bytes", expected, sent);
            } else {
                ensure_exhausted(source, expected)?;
            }
        }
        None => {
            debug!("streaming chunked body");
            let mut chunked = ChunkedWriter::new(&mut *sink);
            copy_blocks(source, &mut chunked)?;
            chunked.finish()?;
        }
    }
    Ok(())
}

/// Copies the source to the output one block at a time, returning the number of bytes copied.
fn copy_blocks<R: Read + ?Sized>(source: &mut R, out: &mut impl Write) -> std::io::Result<u64> {
    let mut block = [0u8; STREAM_BLOCK_SIZE];
    let mut sent = 0;
    loop {
        let len = match source.read(&mut block) {
            Ok(0) => return Ok(sent),
            Ok(len) => len,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e)
        };
        out.write_all(&block[..len])?;
        sent += len as u64;
    }
}

/// Fails with `InvalidData` if the source still has data after the declared number of bytes.
pub(crate) fn ensure_exhausted<R: Read + ?Sized>(source: &mut R, declared: u64) -> std::io::Result<()> {
    let mut extra = [0u8; 1];
    loop {
        match source.read(&mut extra) {
            Ok(0) => return Ok(()),
            Ok(_) => return Err(std::io::Error::new(
                ErrorKind::InvalidData,
                format!("source has more than the declared {} bytes", declared),
            )),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e)
        }
    }
}

fn send_form<W: Write>(sink: &mut W, head: &RequestHead, headers: &mut HeaderMap, form: &mut Form) -> Result<(), Error> {
    if headers.content_type().as_deref() != Some(MULTIPART_FORM_DATA) {
        debug!("url-encoding {} form fields", form.fields.len());
        let body = urlencode(&mut form.fields)?;
        headers.set_content_type(FORM_URLENCODED, &[]);
        return send_buffer(sink, head, headers, &body);
    }

    let boundary = match &form.options.boundary {
        Some(boundary) => boundary.clone(),
        None => headers.content_type_params()
            .into_iter()
            .find(|(name, _)| name == "boundary")
            .map(|(_, boundary)| boundary)
            .unwrap_or_else(generate_boundary)
    };
    let mut encoder = MultipartEncoder::new(&boundary, form.options.charset.as_deref())?;
    encoder.check(&form.fields)?;
    headers.set_content_type(MULTIPART_FORM_DATA, &[("boundary", &boundary)]);
    form.options.boundary = Some(boundary.clone());

    if headers.is_chunked() {
        debug!("writing multipart body as chunks");
        headers.remove(&CONTENT_LENGTH);
        head.write(sink, headers)?;
        encoder.encode(&mut form.fields, &mut ChunkedOutput::new(&mut *sink))?;
        return Ok(());
    }

    let mut spool = SpooledTempFile::new(SPOOL_THRESHOLD);
    encoder.encode(&mut form.fields, &mut PlainOutput::new(&mut spool))?;
    let length = spool.seek(SeekFrom::End(0))?;
    spool.rewind()?;
    debug!("spooled multipart body of {} bytes", length);

    headers.set_content_length(length);
    headers.remove(&TRANSFER_ENCODING);
    head.write(sink, headers)?;
    copy(&mut spool, sink)?;
    Ok(())
}

/// Serializes the fields as `name=value` pairs joined by `&`. Source values are read fully.
fn urlencode(fields: &mut [FormField]) -> std::io::Result<Vec<u8>> {
    let mut pairs = vec![];
    for field in fields.iter_mut() {
        let value = match &mut field.value {
            FieldValue::Bytes(bytes) => form_urlencoded::byte_serialize(bytes).collect::<String>(),
            FieldValue::Source(source) => {
                let mut bytes = vec![];
                source.read_to_end(&mut bytes)?;
                form_urlencoded::byte_serialize(&bytes).collect::<String>()
            }
        };
        let name: String = form_urlencoded::byte_serialize(field.name.as_bytes()).collect();
        pairs.push(format!("{}={}", name, value));
    }
    Ok(pairs.join("&").into_bytes())
}
