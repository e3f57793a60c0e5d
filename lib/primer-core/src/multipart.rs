//! `multipart/form-data` bodies.
//!
//! A [`Form`] is a list of [`Part`]s separated by a boundary token. The
//! boundary is random and checked against every part, so it never shows up
//! inside the payload it delimits.
//!
//! # Example
//!
//! ```
//! use primer_core::multipart::{Form, Part};
//!
//! let form = Form::from_parts(vec![
//!     Part::field("name", "John Doe"),
//!     Part::file("avatar", "photo.jpg", &b"\xFF\xD8"[..]),
//! ]);
//! let boundary = form.boundary().to_string();
//!
//! let (content_type, body) = form.into_body();
//! assert_eq!(content_type, format!("multipart/form-data; boundary={boundary}"));
//! assert!(body.ends_with(format!("--{boundary}--\r\n").as_bytes()));
//! ```

use bytes::{BufMut, Bytes, BytesMut};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// Extension (lower case) to MIME type.
const MIME_TYPES: &[(&str, &str)] = &[
    ("bin", DEFAULT_CONTENT_TYPE),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("md", "text/markdown"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("tar", "application/x-tar"),
    ("txt", "text/plain"),
    ("wasm", "application/wasm"),
    ("webp", "image/webp"),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
];

/// MIME type for a filename, from its extension.
#[must_use]
pub fn mime_type_for(filename: &str) -> &'static str {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .and_then(|extension| {
            MIME_TYPES
                .iter()
                .find(|(known, _)| *known == extension)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

// ============================================================================
// Parts
// ============================================================================

/// One section of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    data: Bytes,
}

impl Part {
    /// A plain field: no filename, no content type.
    #[must_use]
    pub fn field(name: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            headers: Vec::new(),
            data: value.into(),
        }
    }

    /// A file. Its content type comes from [`mime_type_for`] until
    /// [`with_content_type`](Self::with_content_type) overrides it.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let filename = filename.into();
        let content_type = mime_type_for(&filename).to_string();
        Self {
            filename: Some(filename),
            content_type: Some(content_type),
            ..Self::field(name, data)
        }
    }

    /// Override the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a header line after `Content-Type`.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filename, for file parts.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Content type, for file parts or when set explicitly.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Payload.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The header block of this part, each line ending in CRLF, followed by
    /// the blank line.
    fn head(&self) -> Vec<u8> {
        let mut head = b"Content-Disposition: form-data; name=\"".to_vec();
        quote_into(&mut head, &self.name);
        head.push(b'"');
        if let Some(filename) = &self.filename {
            head.extend_from_slice(b"; filename=\"");
            quote_into(&mut head, filename);
            head.push(b'"');
        }
        head.extend_from_slice(b"\r\n");

        let content_type = self.content_type.as_deref().map(|value| ("Content-Type", value));
        let extra = self.headers.iter().map(|(name, value)| (name.as_str(), value.as_str()));
        for (name, value) in content_type.into_iter().chain(extra) {
            head.extend_from_slice(name.as_bytes());
            head.extend_from_slice(b": ");
            head.extend_from_slice(value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }
        head.extend_from_slice(b"\r\n");
        head
    }
}

// `"`, CR and LF would end the quoted-string early.
fn quote_into(out: &mut Vec<u8>, value: &str) {
    for byte in value.bytes() {
        match byte {
            b'"' => out.extend_from_slice(b"%22"),
            b'\r' => out.extend_from_slice(b"%0D"),
            b'\n' => out.extend_from_slice(b"%0A"),
            other => out.push(other),
        }
    }
}

fn occurs_in(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

// ============================================================================
// Form
// ============================================================================

/// A complete multipart body: parts plus their boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    boundary: String,
    parts: Vec<Part>,
}

impl Form {
    /// Build a form with a fresh random boundary.
    ///
    /// Boundaries are 32 hex digits from a v4 UUID; a candidate found in any
    /// part's headers or payload is thrown away and another one drawn.
    #[must_use]
    pub fn from_parts(parts: Vec<Part>) -> Self {
        let heads: Vec<Vec<u8>> = parts.iter().map(Part::head).collect();
        let boundary = std::iter::repeat_with(|| uuid::Uuid::new_v4().simple().to_string())
            .find(|candidate| {
                let needle = candidate.as_bytes();
                !parts
                    .iter()
                    .zip(&heads)
                    .any(|(part, head)| occurs_in(head, needle) || occurs_in(&part.data, needle))
            })
            .unwrap_or_default();
        Self { boundary, parts }
    }

    /// Build an empty form with a fixed boundary.
    ///
    /// The caller is responsible for the boundary not occurring in any part.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Append a part.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// The boundary token.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The parts, in order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode the form, returning its content type and body.
    #[must_use]
    pub fn into_body(self) -> (String, Bytes) {
        let delimiter = format!("--{}", self.boundary);
        let mut body = BytesMut::new();
        for part in &self.parts {
            body.put_slice(delimiter.as_bytes());
            body.put_slice(b"\r\n");
            body.put_slice(&part.head());
            body.put_slice(&part.data);
            body.put_slice(b"\r\n");
        }
        body.put_slice(delimiter.as_bytes());
        body.put_slice(b"--\r\n");
        (self.content_type(), body.freeze())
    }
}
