/// Request body data types.
pub mod body;
/// HTTP header data types and functions.
pub mod header;
/// HTTP method data type and functions.
pub mod method;
/// HTTP request data type and functions.
pub mod request;
/// HTTP version constants and functions.
pub mod version;
