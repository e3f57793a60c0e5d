//! HTTP method types.

use derive_more::Display;

/// HTTP request method.
///
/// Methods are normalized to upper case. Anything outside the standard set is
/// kept verbatim (upper-cased) as [`Method::Extension`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET method - retrieve a resource.
    #[display("GET")]
    Get,
    /// POST method - create a resource.
    #[display("POST")]
    Post,
    /// PUT method - replace a resource.
    #[display("PUT")]
    Put,
    /// DELETE method - remove a resource.
    #[display("DELETE")]
    Delete,
    /// PATCH method - partially update a resource.
    #[display("PATCH")]
    Patch,
    /// HEAD method - retrieve headers only.
    #[display("HEAD")]
    Head,
    /// OPTIONS method - retrieve allowed methods.
    #[display("OPTIONS")]
    Options,
    /// CONNECT method - establish a tunnel.
    #[display("CONNECT")]
    Connect,
    /// TRACE method - loop-back test.
    #[display("TRACE")]
    Trace,
    /// Any other method token, upper-cased.
    #[display("{_0}")]
    Extension(String),
}

impl Method {
    /// Normalize a method string: upper-cases it and maps standard names to
    /// their variant.
    ///
    /// An empty string stays an (empty) extension method, so it remains
    /// distinguishable from an unset method (`None`).
    #[must_use]
    pub fn normalize(method: &str) -> Self {
        let upper = method.to_ascii_uppercase();
        match upper.as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "CONNECT" => Self::Connect,
            "TRACE" => Self::Trace,
            _ => Self::Extension(upper),
        }
    }

    /// The upper-case method name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Extension(name) => name,
        }
    }
}

impl From<&str> for Method {
    fn from(method: &str) -> Self {
        Self::normalize(method)
    }
}

impl From<String> for Method {
    fn from(method: String) -> Self {
        Self::normalize(&method)
    }
}

impl TryFrom<&Method> for http::Method {
    type Error = crate::Error;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        match method {
            Method::Get => Ok(Self::GET),
            Method::Post => Ok(Self::POST),
            Method::Put => Ok(Self::PUT),
            Method::Delete => Ok(Self::DELETE),
            Method::Patch => Ok(Self::PATCH),
            Method::Head => Ok(Self::HEAD),
            Method::Options => Ok(Self::OPTIONS),
            Method::Connect => Ok(Self::CONNECT),
            Method::Trace => Ok(Self::TRACE),
            Method::Extension(name) => Self::from_bytes(name.as_bytes())
                .map_err(|err| crate::Error::encoding(format!("invalid method '{name}': {err}"))),
        }
    }
}

impl From<http::Method> for Method {
    fn from(method: http::Method) -> Self {
        Self::normalize(method.as_str())
    }
}
