//! Turns loosely shaped HTTP request descriptions into wire-ready requests.
//!
//! Describe a request with a [`RequestSpec`], then [`prepare`](RequestSpec::prepare)
//! it: the method is upper-cased, parameters are encoded into the URL, the
//! body is picked and encoded (multipart, form, raw, stream or JSON), headers
//! and cookies are merged, authentication is applied and hooks are collected.
//! The result is a [`PreparedRequest`] that any [`HttpClient`] can send.
//!
//! # Example
//!
//! ```
//! use primer::prelude::*;
//!
//! let request = RequestSpec::new("post", "https://api.example.com/upload")
//!     .query("tag", vec!["a", "b"])
//!     .form("title", "Report")
//!     .file("report", FileField::new("contents").with_filename("report.txt"))
//!     .basic_auth("alice", "secret")
//!     .prepare()?;
//!
//! assert_eq!(request.url(), "https://api.example.com/upload?tag=a&tag=b");
//! assert!(request
//!     .header("content-type")
//!     .is_some_and(|value| value.starts_with("multipart/form-data; boundary=")));
//! assert_eq!(request.header("authorization"), Some("Basic YWxpY2U6c2VjcmV0"));
//! # Ok::<(), primer::Error>(())
//! ```

mod auth;
mod client;
mod prepared;
pub mod prelude;
mod request;

pub use auth::{AUTHORIZATION, Auth, AuthScheme, basic_auth_header};
pub use client::{HttpClient, HttpClientExt};
pub use prepared::PreparedRequest;
pub use request::RequestSpec;

// Re-export core types
pub use primer_core::{
    Body, BodyStream, BoxError, ContentType, Cookies, Data, Error, Event, FileField, Files,
    HeaderSpec, Headers, Hook, HookOwner, Hooks, JsonBody, Method, ParamValue, Params,
    Registration, Response, Result, compose_url, cookie_header, encode_params, inject, merge,
    multipart, path_url, resolve_body,
};
