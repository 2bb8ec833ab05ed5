use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::io::{Cursor, Read, Result};
use std::path::{Path, PathBuf};

/// A readable request body, or the value of a form field. Sources are read exactly once.
pub trait BodySource: Read {
    /// The number of bytes left to read, if known up front.
    fn size(&self) -> Option<u64> {
        None
    }

    /// The path the data is read from, if it comes from a file.
    fn path(&self) -> Option<&Path> {
        None
    }
}

impl BodySource for &[u8] {
    fn size(&self) -> Option<u64> {
        Some(self.len() as u64)
    }
}

impl<T: AsRef<[u8]>> BodySource for Cursor<T> {
    fn size(&self) -> Option<u64> {
        let len = self.get_ref().as_ref().len() as u64;
        Some(len.saturating_sub(self.position()))
    }
}

/// A file opened for upload. Knows its size and path, so form fields built from it get file
/// semantics and the chunked encoder can copy it as a single chunk.
pub struct FileSource {
    file: File,
    path: PathBuf,
    size: u64,
}

impl FileSource {
    /// Opens the file at the given path for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<FileSource> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let size = file.metadata()?.len();
        Ok(FileSource { file, path, size })
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file.read(buf)
    }
}

impl BodySource for FileSource {
    fn size(&self) -> Option<u64> {
        Some(self.size)
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Wraps any reader of unknown length, such as a pipe or stdin.
pub struct ReadSource<R>(pub R);

impl<R: Read> Read for ReadSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read> BodySource for ReadSource<R> {}

/// The value of a form field.
pub enum FieldValue {
    Bytes(Vec<u8>),
    Source(Box<dyn BodySource>),
}

impl Debug for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Bytes(bytes) => f.debug_tuple("Bytes").field(&String::from_utf8_lossy(bytes)).finish(),
            FieldValue::Source(source) => f.debug_struct("Source")
                .field("size", &source.size())
                .field("path", &source.path())
                .finish()
        }
    }
}

/// A single field of a submitted form.
#[derive(Debug)]
pub struct FormField {
    /// The field name.
    pub name: String,
    /// The field value.
    pub value: FieldValue,
    /// Explicit filename. Gives the field file semantics.
    pub filename: Option<String>,
    /// Explicit content type, only used for fields with file semantics.
    pub content_type: Option<String>,
    /// Marks the field as a file even without a filename.
    pub is_file: bool,
}

impl FormField {
    /// Creates a field with an in-memory value.
    pub fn text(name: impl Into<String>, value: impl Into<Vec<u8>>) -> FormField {
        FormField::new(name.into(), FieldValue::Bytes(value.into()))
    }

    /// Creates a field whose value is read from the given source.
    pub fn source(name: impl Into<String>, source: impl BodySource + 'static) -> FormField {
        FormField::new(name.into(), FieldValue::Source(Box::new(source)))
    }

    fn new(name: String, value: FieldValue) -> FormField {
        FormField { name, value, filename: None, content_type: None, is_file: false }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> FormField {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> FormField {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn as_file(mut self) -> FormField {
        self.is_file = true;
        self
    }

    /// Gets the filename to declare for this field, or None if the field has no file semantics.
    /// An explicit filename wins over the final component of the source path. A field only
    /// hinted as a file declares an empty filename.
    pub fn file_name(&self) -> Option<String> {
        if let Some(filename) = &self.filename {
            return Some(filename.clone());
        }
        if let FieldValue::Source(source) = &self.value {
            if let Some(name) = source.path().and_then(Path::file_name) {
                return Some(name.to_string_lossy().into_owned());
            }
        }
        if self.is_file {
            return Some(String::new());
        }
        None
    }

    fn is_single_pass(&self) -> bool {
        matches!(self.value, FieldValue::Source(_))
    }
}

/// Options for encoding a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormOptions {
    /// Multipart boundary. Generated when not given.
    pub boundary: Option<String>,
    /// Character set names and filenames are transcoded to before quoting.
    pub charset: Option<String>,
}

/// Structured form data. How it is encoded depends on the request content type.
#[derive(Debug, Default)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub options: FormOptions,
}

/// The body of a request. Exactly one representation is held at a time.
#[derive(Default)]
pub enum Body {
    /// No body; only headers are sent.
    #[default]
    Empty,
    /// A complete in-memory body, sent with a Content-Length.
    Bytes(Vec<u8>),
    /// A stream, sent with either a preset Content-Length or chunked transfer-encoding.
    Stream(Box<dyn BodySource>),
    /// Form fields, url-encoded or multipart-encoded.
    Form(Form),
    /// A single-pass body that was already sent.
    Consumed,
}

impl Body {
    /// Checks if sending the body consumes it, so it can only be sent once.
    pub fn is_single_pass(&self) -> bool {
        match self {
            Body::Stream(_) => true,
            Body::Form(form) => form.fields.iter().any(FormField::is_single_pass),
            _ => false
        }
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Body::Stream(source) => f.debug_struct("Stream").field("size", &source.size()).finish(),
            Body::Form(form) => f.debug_tuple("Form").field(form).finish(),
            Body::Consumed => f.write_str("Consumed")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};
    use std::path::PathBuf;

    use crate::common::body::{Body, BodySource, FormField, ReadSource};
    use crate::util::mock::MockReader;

    #[test]
    fn cursor_size_is_remaining_bytes() {
        let mut cursor = Cursor::new(b"hello world".to_vec());
        assert_eq!(cursor.size(), Some(11));
        let mut buf = [0u8; 6];
        cursor.read_exact(&mut buf).unwrap();
        assert_eq!(cursor.size(), Some(5));
    }

    #[test]
    fn read_source_has_no_size() {
        let source = ReadSource(MockReader::from_strs(vec!["abc"]));
        assert_eq!(source.size(), None);
        assert!(source.path().is_none());
    }

    #[test]
    fn explicit_filename() {
        let field = FormField::text("f", "hi").with_filename("a.txt");
        assert_eq!(field.file_name(), Some("a.txt".to_string()));
    }

    #[test]
    fn filename_from_source_path() {
        let source = MockReader::from_strs(vec!["data"]).with_path(PathBuf::from("/tmp/uploads/report.pdf"));
        let field = FormField::source("doc", source);
        assert_eq!(field.file_name(), Some("report.pdf".to_string()));
    }

    #[test]
    fn file_hint_without_name() {
        assert_eq!(FormField::text("f", "hi").as_file().file_name(), Some(String::new()));
    }

    #[test]
    fn plain_field_has_no_filename() {
        let field = FormField::text("x", "y").with_content_type("text/plain");
        assert_eq!(field.file_name(), None);
    }

    #[test]
    fn single_pass_bodies() {
        assert!(!Body::Bytes(vec![1]).is_single_pass());
        assert!(Body::Stream(Box::new(Cursor::new(vec![1]))).is_single_pass());
        assert!(!Body::Empty.is_single_pass());
    }
}
