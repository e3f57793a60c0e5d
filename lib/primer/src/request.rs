//! Request descriptions.
//!
//! A [`RequestSpec`] is what the caller writes: every part of the request in
//! whatever shape is convenient. [`RequestSpec::prepare`] turns it into a
//! [`PreparedRequest`] without modifying it.
//!
//! # Example
//!
//! ```
//! use primer::RequestSpec;
//!
//! let prepared = RequestSpec::new("post", "https://api.example.com/users")
//!     .header("Accept", "application/json")
//!     .query("dry_run", true)
//!     .json(&serde_json::json!({ "name": "Alice" }))
//!     .prepare()
//!     .expect("valid request");
//!
//! assert_eq!(prepared.method().map(|m| m.as_str()), Some("POST"));
//! assert_eq!(prepared.url(), "https://api.example.com/users?dry_run=true");
//! assert_eq!(prepared.header("content-type"), Some("application/json"));
//! ```

use std::fmt;

use primer_core::{
    Cookies, Data, Event, FileField, Files, HeaderSpec, HookOwner, Hooks, JsonBody, ParamValue,
    Params, Registration, Result,
};

use crate::{Auth, PreparedRequest};

/// A declarative description of an HTTP request.
///
/// Everything is optional until [`prepare`](Self::prepare), which needs a URL.
/// An absent method is carried through as "unset".
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    method: Option<String>,
    url: Option<String>,
    headers: HeaderSpec,
    files: Files,
    data: Data,
    json: Option<JsonBody>,
    params: Data,
    auth: Option<Auth>,
    cookies: Cookies,
    hooks: Hooks,
}

impl RequestSpec {
    /// Creates a request with a method and URL.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self::default().method(method).url(url)
    }

    /// Sets the method.
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets a header. Names are case-insensitive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Makes sure a header is not sent, even as a derived default.
    #[must_use]
    pub fn without_header(mut self, name: impl Into<String>) -> Self {
        self.headers.suppress(name);
        self
    }

    /// Replaces all caller headers.
    #[must_use]
    pub fn headers(mut self, headers: impl Into<HeaderSpec>) -> Self {
        self.headers = headers.into();
        self
    }

    /// Appends a query parameter.
    ///
    /// Replaces raw query parameters set with [`params`](Self::params).
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        push_pair(&mut self.params, name, value);
        self
    }

    /// Sets the query parameters.
    #[must_use]
    pub fn params(mut self, params: impl Into<Data>) -> Self {
        self.params = params.into();
        self
    }

    /// Appends a form field to the body data.
    ///
    /// Replaces raw or streamed data set with [`data`](Self::data).
    #[must_use]
    pub fn form(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        push_pair(&mut self.data, name, value);
        self
    }

    /// Sets the body data: raw bytes, a stream, or pairs to form-encode.
    #[must_use]
    pub fn data(mut self, data: impl Into<Data>) -> Self {
        self.data = data.into();
        self
    }

    /// Sets a JSON body, used when there is no data and no files.
    ///
    /// Serialization problems are reported by [`prepare`](Self::prepare).
    #[must_use]
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.json = Some(JsonBody::new(value));
        self
    }

    /// Adds a file upload, which makes the body multipart.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, file: FileField) -> Self {
        self.files.push(name, file);
        self
    }

    /// Replaces all file uploads.
    #[must_use]
    pub fn files(mut self, files: Files) -> Self {
        self.files = files;
        self
    }

    /// Sets the authentication.
    #[must_use]
    pub fn auth(mut self, auth: impl Into<Auth>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    /// Sets HTTP Basic credentials.
    #[must_use]
    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth(Auth::basic(username, password))
    }

    /// Sets a bearer token.
    #[must_use]
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.auth(Auth::bearer(token))
    }

    /// Adds a cookie.
    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push(name, value);
        self
    }

    /// Replaces all cookies.
    #[must_use]
    pub fn cookies(mut self, cookies: impl Into<Cookies>) -> Self {
        self.cookies = cookies.into();
        self
    }

    /// Registers hooks for an event.
    #[must_use]
    pub fn hook(mut self, event: Event, hooks: impl Into<Registration>) -> Self {
        self.hooks.register_event(event, hooks);
        self
    }

    /// Prepares the request for sending.
    ///
    /// # Errors
    ///
    /// See [`PreparedRequest::prepare`].
    pub fn prepare(&self) -> Result<PreparedRequest> {
        PreparedRequest::prepare(self)
    }

    /// The method as given, if any.
    #[must_use]
    pub fn get_method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The URL as given, if any.
    #[must_use]
    pub fn get_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Caller headers.
    #[must_use]
    pub fn get_headers(&self) -> &HeaderSpec {
        &self.headers
    }

    /// File uploads.
    #[must_use]
    pub fn get_files(&self) -> &Files {
        &self.files
    }

    /// Body data.
    #[must_use]
    pub fn get_data(&self) -> &Data {
        &self.data
    }

    /// JSON payload.
    #[must_use]
    pub fn get_json(&self) -> Option<&JsonBody> {
        self.json.as_ref()
    }

    /// Query parameters.
    #[must_use]
    pub fn get_params(&self) -> &Data {
        &self.params
    }

    /// Authentication.
    #[must_use]
    pub fn get_auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    /// Cookies.
    #[must_use]
    pub fn get_cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// Registered hooks.
    #[must_use]
    pub fn get_hooks(&self) -> &Hooks {
        &self.hooks
    }
}

fn push_pair(data: &mut Data, name: impl Into<String>, value: impl Into<ParamValue>) {
    match data {
        Data::Form(params) => params.push(name, value),
        Data::Raw(_) | Data::Stream(_) => *data = Data::Form(Params::new().pair(name, value)),
    }
}

impl HookOwner for RequestSpec {
    fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }
}

impl fmt::Display for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "<Request [{method}]>"),
            None => f.write_str("<Request>"),
        }
    }
}
