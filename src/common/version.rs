/// HTTP version "1.0", as written after "HTTP/" in a request line.
pub const HTTP_VERSION_1_0: &str = "1.0";
/// HTTP version "1.1", as written after "HTTP/" in a request line.
pub const HTTP_VERSION_1_1: &str = "1.1";

/// Checks if the given raw version string is supported.
pub fn is_supported(raw: &str) -> bool {
    HTTP_VERSION_1_1.eq(raw) || HTTP_VERSION_1_0.eq(raw)
}
