use std::fmt::{Display, Formatter};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::common::header::Header::{Custom, Standard};
use crate::write::error::ConfigError;

/// A header. Is either a "Standard" header with a static string, or a "Custom" header with a uniquely allocated String.
/// Names are always stored lowercase so lookups are case-insensitive.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub enum Header {
    Standard(&'static str),
    Custom(String),
}

impl Header {
    pub fn as_str(&self) -> &str {
        match self {
            Header::Standard(str) => str,
            Header::Custom(str) => str.as_str()
        }
    }

    /// Gets the canonical wire form of the name, with every dash-separated word capitalized.
    /// "content-type" becomes "Content-Type".
    pub fn capitalized(&self) -> String {
        self.as_str()
            .split('-')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new()
                }
            })
            .collect::<Vec<String>>()
            .join("-")
    }

    /// Checks that the name is a valid HTTP token.
    fn is_token(&self) -> bool {
        !self.as_str().is_empty() && self.as_str().bytes().all(is_tchar)
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Standard(s) => f.write_str(s),
            Custom(s) => f.write_str(s)
        }
    }
}

macro_rules! standard_headers {
    (
        $(
            $(#[$docs:meta])*
            ($name:ident, $value:expr);
        )+
    ) => {
        $(
            $(#[$docs])*
            pub const $name: Header = Header::Standard($value);
        )+


        impl From<String> for Header {
            /// Gets a header from the given string representing the header name.
            fn from(mut value: String) -> Header {
                value.make_ascii_lowercase();
                match value.as_str() {
                    $(
                    $value => $name,
                    )+
                    _ => Header::Custom(value)
                }
            }
        }
    }
}

impl From<&str> for Header {
    /// Gets a header from the given string representing the header name.
    fn from(value: &str) -> Header {
        Header::from(value.to_string())
    }
}

standard_headers! {
    (ACCEPT, "accept");
    (ACCEPT_CHARSET, "accept-charset");
    (ACCEPT_ENCODING, "accept-encoding");
    (ACCEPT_LANGUAGE, "accept-language");
    (AUTHORIZATION, "authorization");
    (CACHE_CONTROL, "cache-control");
    (CONNECTION, "connection");
    (CONTENT_DISPOSITION, "content-disposition");
    (CONTENT_ENCODING, "content-encoding");
    (CONTENT_LENGTH, "content-length");
    (CONTENT_TYPE, "content-type");
    (COOKIE, "cookie");
    (EXPECT, "expect");
    (FROM, "from");
    (HOST, "host");
    (IF_MATCH, "if-match");
    (IF_MODIFIED_SINCE, "if-modified-since");
    (IF_NONE_MATCH, "if-none-match");
    (ORIGIN, "origin");
    (PROXY_AUTHORIZATION, "proxy-authorization");
    (RANGE, "range");
    (REFERER, "referer");
    (TE, "te");
    (TRAILER, "trailer");
    (TRANSFER_ENCODING, "transfer-encoding");
    (USER_AGENT, "user-agent");
    (UPGRADE, "upgrade");
}

/// Creates a map of headers.
/// ```
/// use outbox::common::header::{CONNECTION, CONTENT_TYPE, CONTENT_LENGTH, Header, TRANSFER_ENCODING};
/// use outbox::header_map;
///
/// let headers = header_map![
///    (CONNECTION, "keep-alive"),
///    (CONTENT_LENGTH, "5"),
///    ("custom-header", "hello"),
///    ("coNtEnt-TyPE", "something"),
///    ("Transfer-encoding", "chunked")
/// ];
///
/// assert!(headers.contains_header_value(&CONNECTION, "keep-alive"));
/// assert!(headers.contains_header_value(&CONTENT_LENGTH, "5"));
/// assert!(headers.contains_header_value(&CONTENT_TYPE, "something"));
/// assert!(headers.contains_header_value(&Header::Custom("custom-header".into()), "hello"));
/// assert!(headers.contains_header_value(&TRANSFER_ENCODING, "chunked"));
/// ```
#[macro_export]
macro_rules! header_map {
    () => { $crate::common::header::HeaderMap::new() };
    ($(($header:expr, $value:expr)),+ $(,)?) => {
        $crate::common::header::HeaderMap::from_pairs(vec![
            $(($header.into(), $value.into()),)+
        ])
    }
}

/// An order-preserving multimap of headers to values.
/// Headers are serialized in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(Header, Vec<String>)>,
}

impl HeaderMap {
    /// Creates an empty header map.
    pub fn new() -> HeaderMap {
        HeaderMap { entries: vec![] }
    }

    /// Gets a header map from the given vector of header value and key pairs.
    pub fn from_pairs(header_values: Vec<(Header, String)>) -> HeaderMap {
        header_values.into_iter().fold(HeaderMap::new(), |mut m, (header, value)| {
            m.add_header(header, value);
            m
        })
    }

    /// Adds a value to the header, keeping any existing values.
    pub fn add_header(&mut self, k: Header, v: String) {
        match self.position(&k) {
            Some(i) => self.entries[i].1.push(v),
            None => self.entries.push((k, vec![v]))
        }
    }

    /// Replaces all values of the header with the given value. An existing header keeps its position.
    pub fn set(&mut self, k: Header, v: impl Into<String>) {
        match self.position(&k) {
            Some(i) => self.entries[i].1 = vec![v.into()],
            None => self.entries.push((k, vec![v.into()]))
        }
    }

    /// Removes the header, returning its values if it was present.
    pub fn remove(&mut self, k: &Header) -> Option<Vec<String>> {
        let i = self.position(k)?;
        Some(self.entries.remove(i).1)
    }

    /// Checks if the header is present.
    pub fn contains(&self, k: &Header) -> bool {
        self.position(k).is_some()
    }

    /// Checks if the map contains the given header and corresponding header value.
    pub fn contains_header_value(&self, k: &Header, v: &str) -> bool {
        self.get(k).map(|values| values.iter().any(|value| value == v)).unwrap_or(false)
    }

    /// Gets all values for the given header.
    pub fn get(&self, k: &Header) -> Option<&[String]> {
        self.position(k).map(|i| self.entries[i].1.as_slice())
    }

    /// Gets the first value for the given header.
    pub fn get_first_header_value(&self, k: &Header) -> Option<&String> {
        self.get(k)?.first()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over every header and value pair, in insertion order. A header with several values
    /// is yielded once per value.
    pub fn iter(&self) -> impl Iterator<Item=(&Header, &String)> {
        self.entries.iter().flat_map(|(header, values)| values.iter().map(move |value| (header, value)))
    }

    /// Gets the media type of the content-type header, lowercased and without parameters.
    pub fn content_type(&self) -> Option<String> {
        let value = self.get_first_header_value(&CONTENT_TYPE)?;
        let media_type = value.split(';').next()?.trim().to_ascii_lowercase();
        if media_type.is_empty() {
            None
        } else {
            Some(media_type)
        }
    }

    /// Gets the parameters of the content-type header. Parameter names are lowercased and quoted
    /// values are unquoted.
    pub fn content_type_params(&self) -> Vec<(String, String)> {
        let value = match self.get_first_header_value(&CONTENT_TYPE) {
            Some(value) => value,
            None => return vec![]
        };
        value.split(';')
            .skip(1)
            .filter_map(|param| {
                let (name, value) = param.split_once('=')?;
                Some((name.trim().to_ascii_lowercase(), value.trim().trim_matches('"').to_string()))
            })
            .collect()
    }

    /// Sets the content-type header to the media type followed by the given parameters.
    /// Parameter values that are not tokens are quoted.
    pub fn set_content_type(&mut self, media_type: &str, params: &[(&str, &str)]) {
        let mut value = media_type.to_string();
        for (name, param) in params {
            value.push_str("; ");
            value.push_str(name);
            value.push('=');
            if !param.is_empty() && param.bytes().all(is_tchar) {
                value.push_str(param);
            } else {
                value.push('"');
                value.push_str(&param.replace('\\', "\\\\").replace('"', "\\\""));
                value.push('"');
            }
        }
        self.set(CONTENT_TYPE, value);
    }

    /// Gets the value of the content-length header. May return None if there's no content-length
    /// header, or an error if the value can not be parsed.
    pub fn content_length(&self) -> Option<Result<u64, ConfigError>> {
        self.get_first_header_value(&CONTENT_LENGTH)
            .map(|value| value.trim().parse().map_err(|_| ConfigError::InvalidContentLength(value.clone())))
    }

    pub fn set_content_length(&mut self, length: u64) {
        self.set(CONTENT_LENGTH, length.to_string());
    }

    /// Checks if chunked transfer-encoding is selected.
    pub fn is_chunked(&self) -> bool {
        self.get(&TRANSFER_ENCODING)
            .map(|values| values.iter()
                .flat_map(|value| value.split(','))
                .any(|coding| coding.trim().eq_ignore_ascii_case("chunked")))
            .unwrap_or(false)
    }

    /// Sets the authorization header for HTTP basic authentication.
    pub fn basic_auth(&mut self, user: &str, password: &str) {
        let credentials = STANDARD.encode(format!("{}:{}", user, password));
        self.set(AUTHORIZATION, format!("Basic {}", credentials));
    }

    /// Checks every name is a token and no value could break out of its header line.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (header, values) in &self.entries {
            if !header.is_token() {
                return Err(ConfigError::InvalidHeaderName(header.to_string()));
            }
            if let Some(value) = values.iter().find(|value| !is_valid_value(value)) {
                return Err(ConfigError::InvalidHeaderValue(header.capitalized(), value.clone()));
            }
        }
        Ok(())
    }

    fn position(&self, k: &Header) -> Option<usize> {
        self.entries.iter().position(|(header, _)| header == k)
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = &'a (Header, Vec<String>);
    type IntoIter = std::slice::Iter<'a, (Header, Vec<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Checks a header value contains no line breaks or NUL bytes.
pub(crate) fn is_valid_value(value: &str) -> bool {
    !value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0)
}

fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
