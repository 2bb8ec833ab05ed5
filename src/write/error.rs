use thiserror::Error;

/// Error for when a request can't be written.
#[derive(Debug, Error)]
pub enum Error {
    /// The request is misconfigured. Nothing was written.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The sink or a body source failed. Bytes written before the failure stay written.
    #[error("i/o error while writing request: {0}")]
    Io(#[from] std::io::Error),
    /// A form name or filename could not be transcoded. Nothing was written.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Error for a request that can not be framed as configured.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Request path is empty.
    #[error("HTTP request path is empty")]
    EmptyPath,
    /// Method, path or version would break the request line.
    #[error("a request line must not contain CR or LF")]
    LineBreakInRequestLine,
    /// Only HTTP/1.0 and HTTP/1.1 can be written.
    #[error("unsupported HTTP version {0:?}")]
    UnsupportedVersion(String),
    /// Method is not a valid token.
    #[error("invalid method {0:?}")]
    InvalidMethod(String),
    /// Header name is not a valid token.
    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),
    /// Header value contains a line break or NUL byte.
    #[error("invalid value for header {0}: {1:?}")]
    InvalidHeaderValue(String, String),
    /// Content-Length is not a number.
    #[error("invalid Content-Length {0:?}")]
    InvalidContentLength(String),
    /// Stream body with neither a Content-Length nor chunked transfer-encoding.
    #[error("Content-Length not given and Transfer-Encoding is not `chunked'")]
    UnframedStream,
    /// Stream body with both a Content-Length and chunked transfer-encoding.
    #[error("both Content-Length and chunked Transfer-Encoding are set")]
    AmbiguousFraming,
    /// A body was supplied for a request that already has one.
    #[error("both the body argument and the request body are set")]
    ConflictingBody,
    /// The single-pass body was already sent.
    #[error("request body was already consumed")]
    BodyConsumed,
    /// Form enctype is neither url-encoded nor multipart.
    #[error("invalid enctype {0:?}")]
    InvalidEnctype(String),
    /// Multipart boundary is empty, too long or contains invalid characters.
    #[error("invalid multipart boundary {0:?}")]
    InvalidBoundary(String),
}

/// Error for form text that can not be transcoded to the requested character set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// Character set label is unknown.
    #[error("unknown charset {0:?}")]
    UnknownCharset(String),
    /// Character set is known but text can not be encoded into it.
    #[error("can not encode into charset {0:?}")]
    UnsupportedCharset(String),
}
