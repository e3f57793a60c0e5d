//! Prepared requests.
//!
//! [`PreparedRequest::prepare`] runs a fixed pipeline over a [`RequestSpec`]:
//!
//! 1. method, upper-cased
//! 2. URL, with encoded query parameters appended
//! 3. caller headers
//! 4. the `Cookie` header
//! 5. body, its `Content-Type` default and its length headers
//! 6. authentication, then length headers again
//! 7. hooks from the request
//!
//! Auth sees the final URL, headers and body. Hooks an auth scheme registers
//! run before the request's own hooks.

use std::fmt;

use bytes::Bytes;
use primer_core::{
    Body, COOKIE, Error, HeaderSpec, Headers, HookOwner, Hooks, Method, Result, apply_defaults,
    caller_headers, compose_url, inject, path_url, resolve_body,
};
use tracing::{debug, debug_span, trace};

use crate::{Auth, RequestSpec};

const CONTENT_LENGTH: &str = "Content-Length";
const CONTENT_TYPE: &str = "Content-Type";
const TRANSFER_ENCODING: &str = "Transfer-Encoding";

/// A request ready to be written to the wire.
///
/// Every field is final: the method is normalized, the URL carries its query,
/// headers are merged and the body is encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    method: Option<Method>,
    url: String,
    headers: Headers,
    body: Option<Body>,
    hooks: Hooks,
}

impl PreparedRequest {
    /// Prepare a request.
    ///
    /// `spec` is not modified. Preparing the same description twice gives equal
    /// results, except for multipart boundaries which are random.
    ///
    /// # Errors
    ///
    /// Nothing partial is returned; the first failing stage aborts with:
    /// - [`Error::MissingUrl`] if the URL is absent, relative or has no host
    /// - [`Error::InvalidHeader`] if a header is not valid, whether set by the
    ///   caller or derived from cookies or auth
    /// - [`Error::Encoding`] or [`Error::JsonSerialization`] if parameters or
    ///   the body cannot be encoded
    /// - [`Error::Auth`] if the auth scheme fails
    pub fn prepare(spec: &RequestSpec) -> Result<Self> {
        let _span = debug_span!("prepare", method = ?spec.get_method(), url = ?spec.get_url())
            .entered();

        let mut request = Self {
            method: spec.get_method().map(Method::normalize),
            url: String::new(),
            headers: Headers::new(),
            body: None,
            hooks: Hooks::new(),
        };
        request.prepare_url(spec)?;
        request.prepare_headers(spec.get_headers())?;
        request.prepare_cookies(spec);
        request.prepare_body(spec)?;
        request.prepare_auth(spec)?;
        request.headers.validate()?;
        request.hooks.extend(spec.get_hooks());

        debug!(
            method = ?request.method,
            url = %request.url,
            headers = request.headers.len(),
            hooks = request.hooks.len(),
            "prepared request"
        );
        Ok(request)
    }

    fn prepare_url(&mut self, spec: &RequestSpec) -> Result<()> {
        let url = spec
            .get_url()
            .ok_or_else(|| Error::missing_url(None, "no URL supplied"))?;
        self.url = compose_url(url, spec.get_params())?;
        Ok(())
    }

    fn prepare_headers(&mut self, caller: &HeaderSpec) -> Result<()> {
        self.headers = caller_headers(caller)?;
        Ok(())
    }

    fn prepare_cookies(&mut self, spec: &RequestSpec) {
        if spec.get_headers().is_suppressed(COOKIE) {
            return;
        }
        if inject(&mut self.headers, spec.get_cookies()) {
            trace!("cookie header added");
        }
    }

    fn prepare_body(&mut self, spec: &RequestSpec) -> Result<()> {
        let resolved = resolve_body(spec.get_files(), spec.get_data(), spec.get_json())?;
        if let Some(content_type) = &resolved.content_type {
            apply_defaults(
                &mut self.headers,
                spec.get_headers(),
                [(CONTENT_TYPE, content_type.as_str())],
            );
        }
        self.body = resolved.body;
        self.prepare_content_length(spec.get_headers());
        Ok(())
    }

    fn prepare_content_length(&mut self, caller: &HeaderSpec) {
        if caller.mentions(CONTENT_LENGTH) || caller.mentions(TRANSFER_ENCODING) {
            return;
        }
        self.headers.remove(CONTENT_LENGTH);
        self.headers.remove(TRANSFER_ENCODING);

        match self.body.as_ref().map(Body::content_length) {
            Some(Some(len)) => self.headers.insert(CONTENT_LENGTH, len.to_string()),
            Some(None) => self.headers.insert(TRANSFER_ENCODING, "chunked"),
            None if !matches!(self.method, Some(Method::Get | Method::Head)) => {
                self.headers.insert(CONTENT_LENGTH, "0");
            }
            None => {}
        }
    }

    fn prepare_auth(&mut self, spec: &RequestSpec) -> Result<()> {
        let Some(auth) = spec
            .get_auth()
            .cloned()
            .or_else(|| Auth::from_url(&self.url))
        else {
            return Ok(());
        };
        trace!(kind = auth.kind(), "applying auth");
        auth.apply(self)?;
        self.prepare_content_length(spec.get_headers());
        Ok(())
    }

    /// The normalized method, or `None` if it was never set.
    #[must_use]
    pub const fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// The full URL, query included.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The path and query of the URL, e.g. `/a/b?x=1`.
    #[must_use]
    pub fn path_url(&self) -> String {
        path_url(&self.url)
    }

    /// The merged headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the headers, for auth schemes.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Get a header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Replace the body. Length headers are refreshed once auth completes.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
    }

    /// Hooks to run on the response.
    #[must_use]
    pub const fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Convert into an `http::Request`, reading a streamed body to the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMethod`] if the method is unset,
    /// [`Error::MissingUrl`] if the URL is not a valid URI, and
    /// [`Error::Io`] if a streamed body cannot be read.
    pub fn to_http(&self) -> Result<http::Request<Bytes>> {
        let method = self.method.as_ref().ok_or(Error::MissingMethod)?;
        let body = match &self.body {
            Some(Body::Bytes(bytes)) => bytes.clone(),
            Some(Body::Stream(stream)) => stream.read_to_end()?,
            None => Bytes::new(),
        };

        let mut request = http::Request::new(body);
        *request.method_mut() = http::Method::try_from(method)?;
        *request.uri_mut() = self
            .url
            .parse::<http::Uri>()
            .map_err(|err| Error::missing_url(Some(&self.url), err.to_string()))?;
        *request.headers_mut() = self.headers.to_header_map()?;
        Ok(request)
    }
}

impl HookOwner for PreparedRequest {
    fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }
}

impl fmt::Display for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "<PreparedRequest [{method}]>"),
            None => f.write_str("<PreparedRequest>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn get_without_body_has_no_length() {
        let request = RequestSpec::new("GET", "http://example.com")
            .prepare()
            .expect("prepare");
        check!(request.body().is_none());
        check!(request.header(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn post_without_body_has_zero_length() {
        let request = RequestSpec::new("POST", "http://example.com")
            .prepare()
            .expect("prepare");
        check!(request.header(CONTENT_LENGTH) == Some("0"));
    }

    #[test]
    fn unsized_stream_is_chunked() {
        let stream = primer_core::BodyStream::new(std::io::Cursor::new(b"abc".to_vec()));
        let request = RequestSpec::new("PUT", "http://example.com")
            .data(stream)
            .prepare()
            .expect("prepare");
        check!(request.header(TRANSFER_ENCODING) == Some("chunked"));
        check!(request.header(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn caller_length_headers_are_left_alone() {
        let request = RequestSpec::new("POST", "http://example.com")
            .header("content-length", "99")
            .data("abc")
            .prepare()
            .expect("prepare");
        check!(request.header(CONTENT_LENGTH) == Some("99"));
    }

    #[test]
    fn derived_headers_are_validated() {
        let_assert!(
            Err(Error::InvalidHeader { name, .. }) = RequestSpec::new("GET", "http://example.com")
                .cookie("session", "1\r\nX-Injected: yes")
                .prepare()
        );
        check!(name == "Cookie");
    }

    #[test]
    fn to_http_carries_everything() {
        let request = RequestSpec::new("patch", "http://example.com/a?b=1")
            .header("X-Trace", "1")
            .data("payload")
            .prepare()
            .expect("prepare");
        let http_request = request.to_http().expect("to_http");

        check!(http_request.method() == http::Method::PATCH);
        check!(http_request.uri() == "http://example.com/a?b=1");
        check!(http_request.headers()["x-trace"] == "1");
        check!(http_request.headers()["content-length"] == "7");
        check!(&http_request.body()[..] == b"payload");
    }

    #[test]
    fn to_http_requires_method() {
        let request = RequestSpec::default()
            .url("http://example.com")
            .prepare()
            .expect("prepare");
        let_assert!(Err(Error::MissingMethod) = request.to_http());
    }

    #[test]
    fn display() {
        let request = RequestSpec::new("delete", "http://example.com")
            .prepare()
            .expect("prepare");
        check!(request.to_string() == "<PreparedRequest [DELETE]>");
    }
}
