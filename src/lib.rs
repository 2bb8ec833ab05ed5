/// Command-line argument parser
pub mod args;
/// HTTP data types.
pub mod common;
/// Components for writing HTTP requests to a byte sink.
pub mod write;

/// Utility components.
pub mod util;
