//! Error types for primer.

use derive_more::{Display, From};

/// Boxed error returned by pluggable components such as auth schemes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for request preparation.
///
/// Any error aborts the whole `prepare` call: no partially prepared request is
/// ever returned.
#[derive(Debug, Display, From)]
pub enum Error {
    /// Hook registration against an event name that is not recognized.
    #[display("unsupported event specified, with event name \"{event}\"")]
    #[from(skip)]
    UnsupportedEvent {
        /// The rejected event name.
        event: String,
    },

    /// A parameter or body value cannot be coerced to pairs or bytes.
    #[display("encoding error: {_0}")]
    #[from(skip)]
    Encoding(String),

    /// JSON body serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// The URL is absent, has no scheme, or cannot be parsed.
    #[display("missing or invalid URL: {reason}")]
    #[from(skip)]
    MissingUrl {
        /// The URL as supplied, if any.
        url: Option<String>,
        /// Why the URL was rejected.
        reason: String,
    },

    /// A header name or value is not valid on the wire.
    #[display("invalid header '{name}': {reason}")]
    #[from(skip)]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Why the header was rejected.
        reason: String,
    },

    /// The request has no method, so it cannot be sent.
    #[display("request method is not set")]
    #[from(skip)]
    MissingMethod,

    /// Failure raised by an authentication scheme.
    #[display("authentication failed: {_0}")]
    #[from(skip)]
    Auth(BoxError),

    /// I/O error while reading a caller-provided file or stream.
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::JsonSerialization(err) => Some(err),
            Self::Auth(err) => Some(err.as_ref()),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an unsupported event error.
    #[must_use]
    pub fn unsupported_event(event: impl Into<String>) -> Self {
        Self::UnsupportedEvent {
            event: event.into(),
        }
    }

    /// Create an encoding error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Create a missing URL error.
    #[must_use]
    pub fn missing_url(url: Option<&str>, reason: impl Into<String>) -> Self {
        Self::MissingUrl {
            url: url.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Create an invalid header error.
    #[must_use]
    pub fn invalid_header(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error raised by an authentication scheme.
    #[must_use]
    pub fn auth(source: impl Into<BoxError>) -> Self {
        Self::Auth(source.into())
    }

    /// Returns `true` if this is an unsupported event error.
    #[must_use]
    pub const fn is_unsupported_event(&self) -> bool {
        matches!(self, Self::UnsupportedEvent { .. })
    }

    /// Returns `true` if a value could not be encoded (form, query or JSON).
    #[must_use]
    pub const fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding(_) | Self::JsonSerialization(_))
    }

    /// Returns `true` if the URL was absent or unparsable.
    #[must_use]
    pub const fn is_missing_url(&self) -> bool {
        matches!(self, Self::MissingUrl { .. })
    }

    /// Returns `true` if an authentication scheme failed.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
