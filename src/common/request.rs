use log::warn;

use crate::common::body::{Body, BodySource, Form, FormField, FormOptions};
use crate::common::header::{ACCEPT, ACCEPT_ENCODING, Header, HeaderMap, HOST, RANGE, USER_AGENT};
use crate::common::method::Method;
use crate::write::error::ConfigError;

/// Media type of url-encoded form submissions, and the default content type of request bodies.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// Media type of multipart form submissions.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Headers added to every new request unless the caller already set them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDefaults {
    pub accept: Option<String>,
    pub user_agent: Option<String>,
    /// Only added when the response has a body and no Range header is set.
    pub accept_encoding: Option<String>,
    pub host: Option<String>,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        RequestDefaults {
            accept: Some("*/*".to_string()),
            user_agent: Some(concat!("outbox/", env!("CARGO_PKG_VERSION")).to_string()),
            accept_encoding: Some("gzip;q=1.0,deflate;q=0.6,identity;q=0.3".to_string()),
            host: None,
        }
    }
}

impl RequestDefaults {
    /// Defaults that add nothing.
    pub fn none() -> RequestDefaults {
        RequestDefaults { accept: None, user_agent: None, accept_encoding: None, host: None }
    }

    fn apply(&self, method: &Method, headers: &mut HeaderMap) {
        if let Some(accept_encoding) = &self.accept_encoding {
            if method.response_has_body() && !headers.contains(&ACCEPT_ENCODING) && !headers.contains(&RANGE) {
                headers.set(ACCEPT_ENCODING, accept_encoding.clone());
            }
        }
        set_if_absent(headers, ACCEPT, &self.accept);
        set_if_absent(headers, USER_AGENT, &self.user_agent);
        set_if_absent(headers, HOST, &self.host);
    }
}

fn set_if_absent(headers: &mut HeaderMap, header: Header, value: &Option<String>) {
    if let Some(value) = value {
        if !headers.contains(&header) {
            headers.set(header, value.clone());
        }
    }
}

/// An outgoing HTTP request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    /// The headers.
    pub headers: HeaderMap,
    body: Body,
}

impl Request {
    /// Creates a request with the standard defaults.
    pub fn new(method: Method, path: impl Into<String>) -> Result<Request, ConfigError> {
        Request::with_headers(method, path, HeaderMap::new(), &RequestDefaults::default())
    }

    /// Creates a request with the given headers, adding any defaults they don't already set.
    pub fn with_headers(
        method: Method,
        path: impl Into<String>,
        mut headers: HeaderMap,
        defaults: &RequestDefaults,
    ) -> Result<Request, ConfigError> {
        let path = path.into();
        if path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        defaults.apply(&method, &mut headers);
        Ok(Request { method, path, headers, body: Body::Empty })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path the request was created for. This is what callers normally pass to `execute` as
    /// the target, unless they write an absolute-form or asterisk-form target instead.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Sets an in-memory body, replacing any other body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = Body::Bytes(body.into());
    }

    /// Sets a stream body, replacing any other body. Before sending, either a Content-Length or
    /// chunked transfer-encoding must be set.
    pub fn set_body_stream(&mut self, source: impl BodySource + 'static) {
        self.body = Body::Stream(Box::new(source));
    }

    /// Sets form fields as the body, replacing any other body, and sets the content type to the
    /// enctype. The enctype must be url-encoded or multipart.
    pub fn set_form(&mut self, fields: Vec<FormField>, enctype: &str, options: FormOptions) -> Result<(), ConfigError> {
        let enctype = [FORM_URLENCODED, MULTIPART_FORM_DATA].into_iter()
            .find(|known| known.eq_ignore_ascii_case(enctype.trim()))
            .ok_or_else(|| ConfigError::InvalidEnctype(enctype.to_string()))?;
        self.headers.set_content_type(enctype, &[]);
        self.body = Body::Form(Form { fields, options });
        Ok(())
    }

    /// Url-encodes the pairs into an in-memory body and sets the matching content type.
    pub fn set_form_data(&mut self, pairs: &[(&str, &str)]) {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.headers.set_content_type(FORM_URLENCODED, &[]);
        self.body = Body::Bytes(encoded.into_bytes());
    }

    /// Attaches a body given at send time. Fails if the request already carries a byte or
    /// stream body.
    pub fn supply_body(&mut self, body: impl Into<Vec<u8>>) -> Result<(), ConfigError> {
        if matches!(self.body, Body::Bytes(_) | Body::Stream(_)) {
            return Err(ConfigError::ConflictingBody);
        }
        self.set_body(body);
        Ok(())
    }

    pub fn request_body_permitted(&self) -> bool {
        self.method.request_has_body()
    }

    pub fn response_body_permitted(&self) -> bool {
        self.method.response_has_body()
    }

    #[deprecated(note = "use response_body_permitted")]
    pub fn body_exist(&self) -> bool {
        warn!("Request::body_exist is obsolete; use response_body_permitted");
        self.response_body_permitted()
    }

    /// Borrows the headers and the body together, for sending.
    pub(crate) fn parts_mut(&mut self) -> (&mut HeaderMap, &mut Body) {
        (&mut self.headers, &mut self.body)
    }

    /// Marks a single-pass body as sent.
    pub(crate) fn mark_consumed(&mut self) {
        if self.body.is_single_pass() {
            self.body = Body::Consumed;
        }
    }
}
