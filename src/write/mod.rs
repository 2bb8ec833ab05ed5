/// Body framing strategies.
pub mod body;
/// Chunked transfer-encoding.
pub mod chunked;
/// Errors raised while writing a request.
pub mod error;
/// multipart/form-data encoding.
pub mod multipart;
/// Request line and header serialization.
pub mod request;

pub use error::{ConfigError, EncodingError, Error};
