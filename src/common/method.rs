use std::fmt::{Display, Formatter};

use crate::write::error::ConfigError;

/// An HTTP method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET method.
    GET,
    /// HEAD method.
    HEAD,
    /// POST method.
    POST,
    /// PUT method
    PUT,
    /// DELETE method.
    DELETE,
    /// OPTIONS method.
    OPTIONS,
    /// TRACE method.
    TRACE,
    /// PATCH method.
    PATCH,
    /// Any other method token, such as the WebDAV methods.
    Extension(String),
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Extension(token) => f.write_str(token),
            method => write!(f, "{:?}", method)
        }
    }
}

impl Method {
    /// Converts the given string to a method. Methods are case sensitive. Unknown tokens become
    /// an Extension method; strings that are not tokens are rejected.
    pub fn try_from_str(s: &str) -> Result<Method, ConfigError> {
        Ok(match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "OPTIONS" => Method::OPTIONS,
            "TRACE" => Method::TRACE,
            "PATCH" => Method::PATCH,
            token if is_token(token) => Method::Extension(token.to_string()),
            _ => return Err(ConfigError::InvalidMethod(s.to_string()))
        })
    }

    /// Whether a request with this method is expected to carry a body.
    pub fn request_has_body(&self) -> bool {
        matches!(self, Method::POST | Method::PUT | Method::PATCH | Method::Extension(_))
    }

    /// Whether a response to this method carries a body.
    pub fn response_has_body(&self) -> bool {
        !matches!(self, Method::HEAD)
    }

    /// Checks an extension method built by hand is still a token.
    pub(crate) fn is_valid(&self) -> bool {
        match self {
            Method::Extension(token) => is_token(token),
            _ => true
        }
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
