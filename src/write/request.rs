use std::io::Write;

use log::debug;

use crate::common::body::Body;
use crate::common::header::HeaderMap;
use crate::common::method::Method;
use crate::common::request::Request;
use crate::common::version;
use crate::write::body::send_body;
use crate::write::error::{ConfigError, Error};

/// The parts of the request line.
pub struct RequestHead<'a> {
    pub method: &'a Method,
    pub target: &'a str,
    pub version: &'a str,
}

impl<'a> RequestHead<'a> {
    /// Checks the request line can be written as is.
    pub fn check(&self) -> Result<(), ConfigError> {
        let method = self.method.to_string();
        if [method.as_str(), self.target, self.version].iter().any(|part| part.contains(['\r', '\n'])) {
            return Err(ConfigError::LineBreakInRequestLine);
        }
        if !self.method.is_valid() {
            return Err(ConfigError::InvalidMethod(method));
        }
        if self.target.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if !version::is_supported(self.version) {
            return Err(ConfigError::UnsupportedVersion(self.version.to_string()));
        }
        Ok(())
    }

    /// Writes the request line, the headers and the blank line that ends them, all in one write.
    pub fn write(&self, sink: &mut impl Write, headers: &HeaderMap) -> std::io::Result<()> {
        let mut buf = format!("{} {} HTTP/{}\r\n", self.method, self.target, self.version);
        for (header, value) in headers.iter() {
            buf.push_str(&header.capitalized());
            buf.push_str(": ");
            buf.push_str(value);
            buf.push_str("\r\n");
        }
        buf.push_str("\r\n");
        sink.write_all(buf.as_bytes())
    }
}

impl Request {
    /// Writes the request to the sink as `<method> <target> HTTP/<version>`, followed by the
    /// headers and the body. The headers are updated to frame the body.
    ///
    /// Configuration and encoding errors are raised before anything is written. After an i/o
    /// error, whatever was written stays written and a single-pass body counts as sent.
    pub fn execute(&mut self, sink: &mut impl Write, version: &str, target: &str) -> Result<(), Error> {
        if matches!(self.body(), Body::Consumed) {
            return Err(ConfigError::BodyConsumed.into());
        }
        let method = self.method().clone();
        let head = RequestHead { method: &method, target, version };
        head.check()?;
        self.headers.validate()?;

        let (headers, body) = self.parts_mut();
        let result = send_body(sink, &head, headers, body);
        let result = result.and_then(|_| sink.flush().map_err(Error::from));
        match &result {
            Err(Error::Config(_)) | Err(Error::Encoding(_)) => {}
            _ => self.mark_consumed()
        }
        if result.is_ok() {
            debug!("wrote {} {} request", method, target);
        }
        result
    }
}
