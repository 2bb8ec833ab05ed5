use std::path::Path;

/// Utility for creating mock trait implementations.
#[cfg(test)]
pub mod mock;

/// Guesses a content type for an uploaded file from its extension. Returns None for unknown
/// extensions, leaving the multipart default in place.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match extension.as_str() {
        "ico" => "image/x-icon",
        "js" => "application/javascript",
        "svg" => "image/svg+xml",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" => "text/plain",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => return None
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::util::content_type_for_path;

    #[test]
    fn known_extensions() {
        assert_eq!(content_type_for_path(Path::new("index.HTML")), Some("text/html"));
        assert_eq!(content_type_for_path(Path::new("/a/b/photo.jpeg")), Some("image/jpeg"));
    }

    #[test]
    fn unknown_extensions() {
        assert_eq!(content_type_for_path(Path::new("archive.xyz")), None);
        assert_eq!(content_type_for_path(Path::new("Makefile")), None);
    }
}
