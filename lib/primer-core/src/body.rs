//! Body resolution.
//!
//! [`resolve_body`] picks the body representation from the request's files,
//! data and JSON payload, in that order of precedence, and reports the
//! content type and length it implies.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::trace;

use crate::multipart::{Form, Part};
use crate::params::{Data, EncodedForm, ParamValue, encode_params};
use crate::{Error, Result};

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Streams
// ============================================================================

type SharedReader = Arc<Mutex<Box<dyn Read + Send>>>;

/// A caller-provided readable body.
///
/// The stream is only referenced while preparing a request: nothing here reads
/// from it. Clones share the same reader, and equality is handle identity.
#[derive(Clone)]
pub struct BodyStream {
    reader: SharedReader,
    len: Option<u64>,
}

impl BodyStream {
    /// Wrap a reader of unknown length.
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Arc::new(Mutex::new(Box::new(reader))),
            len: None,
        }
    }

    /// Wrap a reader whose total length is known.
    pub fn sized(reader: impl Read + Send + 'static, len: u64) -> Self {
        Self {
            len: Some(len),
            ..Self::new(reader)
        }
    }

    /// Wrap a file, sized by what is left to read from its current position.
    pub fn from_file(mut file: File) -> Result<Self> {
        let len = file
            .metadata()?
            .len()
            .saturating_sub(file.stream_position()?);
        Ok(Self::sized(file, len))
    }

    /// Total length, when known.
    #[must_use]
    pub const fn len(&self) -> Option<u64> {
        self.len
    }

    /// Drain the stream into memory.
    ///
    /// This is for transports; request preparation never calls it.
    pub fn read_to_end(&self) -> Result<Bytes> {
        let mut reader = self
            .reader
            .lock()
            .map_err(|_| std::io::Error::other("body stream lock poisoned"))?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}

impl PartialEq for BodyStream {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.reader, &other.reader)
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Body
// ============================================================================

/// A resolved request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// In-memory bytes.
    Bytes(Bytes),
    /// A stream, read by the transport.
    Stream(BodyStream),
}

impl Body {
    /// Body length, when it can be measured without reading.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        match self {
            Self::Bytes(bytes) => u64::try_from(bytes.len()).ok(),
            Self::Stream(stream) => stream.len(),
        }
    }

    /// The in-memory bytes, if this is not a stream.
    #[must_use]
    pub const fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Stream(_) => None,
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<BodyStream> for Body {
    fn from(stream: BodyStream) -> Self {
        Self::Stream(stream)
    }
}

// ============================================================================
// JSON
// ============================================================================

/// A JSON payload captured from a serializable value.
///
/// Capture failures are kept and reported when the body is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(std::result::Result<serde_json::Value, String>);

impl JsonBody {
    /// Capture a serializable value.
    pub fn new<T: serde::Serialize + ?Sized>(value: &T) -> Self {
        Self(serde_json::to_value(value).map_err(|err| err.to_string()))
    }

    /// Serialize to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the value could not be captured.
    pub fn to_bytes(&self) -> Result<Bytes> {
        match &self.0 {
            Ok(value) => Ok(Bytes::from(serde_json::to_vec(value)?)),
            Err(message) => Err(Error::encoding(format!("invalid JSON body: {message}"))),
        }
    }
}

impl From<serde_json::Value> for JsonBody {
    fn from(value: serde_json::Value) -> Self {
        Self(Ok(value))
    }
}

// ============================================================================
// Files
// ============================================================================

/// A file to upload as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileField {
    filename: Option<String>,
    data: Bytes,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
}

impl FileField {
    /// File content without a filename.
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            filename: None,
            data: data.into(),
            content_type: None,
            headers: Vec::new(),
        }
    }

    /// Read all of `reader` into a new field.
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(Self::new(buf))
    }

    /// Read a file from disk, using its file name as the filename.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let field = Self::new(data);
        Ok(match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => field.with_filename(name),
            None => field,
        })
    }

    /// Set the filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a header to this part.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The filename, if set.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The file content.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    fn into_part(self, field: &str) -> Part {
        let filename = self.filename.unwrap_or_else(|| field.to_string());
        let mut part = Part::file(field, filename, self.data);
        if let Some(content_type) = self.content_type {
            part = part.with_content_type(content_type);
        }
        self.headers
            .into_iter()
            .fold(part, |part, (name, value)| part.with_header(name, value))
    }
}

/// Ordered `(field name, file)` uploads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Files {
    fields: Vec<(String, FileField)>,
}

impl Files {
    /// Create an empty set of files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file under a field name.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, file: FileField) -> Self {
        self.push(name, file);
        self
    }

    /// Add a file under a field name, in place.
    pub fn push(&mut self, name: impl Into<String>, file: FileField) {
        self.fields.push((name.into(), file));
    }

    /// Returns `true` if there are no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(field name, file)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileField)> {
        self.fields.iter().map(|(name, file)| (name.as_str(), file))
    }
}

impl<K: Into<String>> FromIterator<(K, FileField)> for Files {
    fn from_iter<I: IntoIterator<Item = (K, FileField)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, file)| (name.into(), file))
                .collect(),
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Outcome of [`resolve_body`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedBody {
    /// The body, if any.
    pub body: Option<Body>,
    /// The content type implied by the body, if any.
    pub content_type: Option<String>,
    /// The body length, when measurable.
    pub content_length: Option<u64>,
}

impl ResolvedBody {
    fn new(body: Body, content_type: Option<String>) -> Self {
        Self {
            content_length: body.content_length(),
            body: Some(body),
            content_type,
        }
    }
}

/// Resolve the request body.
///
/// Precedence: `files` (multipart, with `data` pairs as extra fields), then
/// `data`, then `json`, then no body.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when files are combined with raw or streamed
/// data, when data pairs cannot be encoded, or when the JSON payload is
/// invalid.
pub fn resolve_body(files: &Files, data: &Data, json: Option<&JsonBody>) -> Result<ResolvedBody> {
    if !files.is_empty() {
        let form = encode_multipart(files, data)?;
        trace!(parts = form.parts().len(), "resolved multipart body");
        let (content_type, body) = form.into_body();
        return Ok(ResolvedBody::new(Body::Bytes(body), Some(content_type)));
    }

    if !data.is_empty() {
        let resolved = match encode_params(data)? {
            EncodedForm::Raw(bytes) => ResolvedBody::new(Body::Bytes(bytes), None),
            EncodedForm::Stream(stream) => ResolvedBody::new(Body::Stream(stream), None),
            EncodedForm::Form(encoded) => ResolvedBody::new(
                Body::Bytes(Bytes::from(encoded)),
                Some(ContentType::FormUrlEncoded.to_string()),
            ),
        };
        trace!(length = ?resolved.content_length, "resolved data body");
        return Ok(resolved);
    }

    if let Some(json) = json {
        let bytes = json.to_bytes()?;
        trace!(length = bytes.len(), "resolved JSON body");
        return Ok(ResolvedBody::new(
            Body::Bytes(bytes),
            Some(ContentType::Json.to_string()),
        ));
    }

    Ok(ResolvedBody::default())
}

fn encode_multipart(files: &Files, data: &Data) -> Result<Form> {
    let mut parts = Vec::new();

    match data {
        Data::Form(params) => {
            for (name, value) in params.iter() {
                push_field_parts(&mut parts, name, value)?;
            }
        }
        Data::Raw(bytes) if bytes.is_empty() => {}
        Data::Raw(_) | Data::Stream(_) => {
            return Err(Error::encoding(
                "data must be key/value pairs when uploading files",
            ));
        }
    }

    for (name, file) in files.iter() {
        parts.push(file.clone().into_part(name));
    }

    Ok(Form::from_parts(parts))
}

fn push_field_parts(parts: &mut Vec<Part>, name: &str, value: &ParamValue) -> Result<()> {
    match value {
        ParamValue::Null => {}
        ParamValue::Text(text) => parts.push(Part::field(name, text.clone())),
        ParamValue::Bytes(bytes) => parts.push(Part::field(name, bytes.clone())),
        ParamValue::List(items) => {
            for item in items {
                if matches!(item, ParamValue::List(_)) {
                    return Err(Error::encoding(format!(
                        "nested sequence for field '{name}'"
                    )));
                }
                push_field_parts(parts, name, item)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::Params;

    fn body_text(resolved: &ResolvedBody) -> String {
        let_assert!(Some(Body::Bytes(bytes)) = &resolved.body);
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(
            ContentType::FormUrlEncoded.as_str(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(ContentType::Json.to_string(), "application/json");
    }

    #[test]
    fn no_input_means_no_body() {
        let resolved = resolve_body(&Files::new(), &Data::default(), None).expect("resolve");
        check!(resolved == ResolvedBody::default());
    }

    #[test]
    fn form_pairs_get_form_content_type() {
        let data = Data::from(vec![("user", "alice"), ("pass", "s3cr3t")]);
        let resolved = resolve_body(&Files::new(), &data, None).expect("resolve");

        check!(body_text(&resolved) == "user=alice&pass=s3cr3t");
        check!(resolved.content_type.as_deref() == Some("application/x-www-form-urlencoded"));
        check!(resolved.content_length == Some(22));
    }

    #[test]
    fn raw_data_has_no_content_type() {
        let resolved =
            resolve_body(&Files::new(), &Data::from("<xml/>"), None).expect("resolve");

        check!(body_text(&resolved) == "<xml/>");
        check!(resolved.content_type.is_none());
        check!(resolved.content_length == Some(6));
    }

    #[test]
    fn unsized_stream_has_no_length() {
        let stream = BodyStream::new(std::io::Cursor::new(vec![1, 2, 3]));
        let resolved =
            resolve_body(&Files::new(), &Data::from(stream.clone()), None).expect("resolve");

        check!(resolved.body == Some(Body::Stream(stream)));
        check!(resolved.content_length.is_none());
        check!(resolved.content_type.is_none());
    }

    #[test]
    fn sized_stream_reports_length() {
        let stream = BodyStream::sized(std::io::Cursor::new(vec![1, 2, 3]), 3);
        let resolved = resolve_body(&Files::new(), &Data::from(stream), None).expect("resolve");
        check!(resolved.content_length == Some(3));
    }

    #[test]
    fn json_body() {
        let json = JsonBody::new(&serde_json::json!({ "name": "Alice" }));
        let resolved = resolve_body(&Files::new(), &Data::default(), Some(&json)).expect("resolve");

        check!(body_text(&resolved) == r#"{"name":"Alice"}"#);
        check!(resolved.content_type.as_deref() == Some("application/json"));
    }

    #[test]
    fn data_wins_over_json() {
        let json = JsonBody::new(&serde_json::json!({ "ignored": true }));
        let data = Data::from(vec![("a", "1")]);
        let resolved = resolve_body(&Files::new(), &data, Some(&json)).expect("resolve");
        check!(body_text(&resolved) == "a=1");
    }

    #[test]
    fn files_win_over_json() {
        let json = JsonBody::new(&serde_json::json!({ "ignored": true }));
        let files = Files::new().file("upload", FileField::new("hello").with_filename("a.txt"));
        let resolved = resolve_body(&files, &Data::default(), Some(&json)).expect("resolve");

        let_assert!(Some(content_type) = resolved.content_type.as_deref());
        check!(content_type.starts_with("multipart/form-data; boundary="));
        check!(!body_text(&resolved).contains("ignored"));
    }

    #[test]
    fn multipart_fields_then_files() {
        let data = Data::from(Params::new().pair("title", "report").pair("skip", None::<&str>));
        let files = Files::new()
            .file("doc", FileField::new("%PDF").with_filename("report.pdf"))
            .file("raw", FileField::new("bytes"));
        let resolved = resolve_body(&files, &data, None).expect("resolve");
        let body = body_text(&resolved);

        let title = body.find("name=\"title\"").expect("title part");
        let doc = body
            .find("name=\"doc\"; filename=\"report.pdf\"")
            .expect("doc part");
        check!(title < doc);
        check!(body.contains("Content-Type: application/pdf\r\n"));
        // Without a filename, the field name is used
        check!(body.contains("name=\"raw\"; filename=\"raw\""));
        check!(!body.contains("skip"));
        check!(resolved.content_length == Some(body.len() as u64));
    }

    #[test]
    fn multipart_boundary_matches_body() {
        let files = Files::new().file("f", FileField::new("x"));
        let resolved = resolve_body(&files, &Data::default(), None).expect("resolve");

        let content_type = resolved.content_type.clone().expect("content type");
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .expect("boundary");
        let body = body_text(&resolved);
        check!(body.starts_with(&format!("--{boundary}\r\n")));
        check!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn files_with_raw_data_is_an_error() {
        let files = Files::new().file("f", FileField::new("x"));
        let_assert!(Err(err) = resolve_body(&files, &Data::from("raw"), None));
        check!(err.is_encoding());
    }

    #[test]
    fn invalid_json_is_an_encoding_error() {
        struct Failing;

        impl serde::Serialize for Failing {
            fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("cannot serialize"))
            }
        }

        let json = JsonBody::new(&Failing);
        let_assert!(Err(err) = resolve_body(&Files::new(), &Data::default(), Some(&json)));
        check!(err.is_encoding());
        check!(err.to_string().contains("cannot serialize"));
    }

    #[test]
    fn stream_read_to_end() {
        let stream = BodyStream::new(std::io::Cursor::new(b"payload".to_vec()));
        let bytes = stream.read_to_end().expect("read");
        check!(&bytes[..] == b"payload");
    }

    #[test]
    fn file_length_counts_from_current_position() {
        let path = std::env::temp_dir().join(format!("primer-body-{}.bin", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"0123456789").expect("write");

        let mut file = File::open(&path).expect("open");
        let mut head = [0; 4];
        file.read_exact(&mut head).expect("read");
        let stream = BodyStream::from_file(file).expect("stream");
        std::fs::remove_file(&path).expect("remove");

        check!(stream.len() == Some(6));
        check!(&stream.read_to_end().expect("read")[..] == b"456789");
    }
}
