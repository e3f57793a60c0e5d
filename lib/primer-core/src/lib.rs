//! Core encoding types for primer.
//!
//! This crate provides the building blocks that turn loosely shaped request
//! inputs into wire-ready pieces:
//! - [`encode_params`] and [`Params`] - query string and form encoding
//! - [`resolve_body`] - body selection between files, data and JSON
//! - [`multipart`] - `multipart/form-data` encoding
//! - [`Headers`] and [`merge`] - case-insensitive header sets and merging
//! - [`cookie_header`] and [`inject`] - the `Cookie` header
//! - [`Hooks`] - the per-request hook registry
//! - [`compose_url`] and [`path_url`] - URL composition
//! - [`Method`] - normalized HTTP methods
//! - [`Error`] and [`Result`] - error handling

mod body;
mod cookies;
mod error;
mod headers;
mod hooks;
mod method;
pub mod multipart;
mod params;
pub mod prelude;
mod response;
mod urls;

pub use body::{
    Body, BodyStream, ContentType, FileField, Files, JsonBody, ResolvedBody, resolve_body,
};
pub use cookies::{COOKIE, Cookies, cookie_header, inject};
pub use error::{BoxError, Error, Result};
pub use headers::{HeaderSpec, Headers, apply_defaults, caller_headers, merge};
pub use hooks::{Event, Hook, HookOwner, Hooks, Registration};
pub use method::Method;
pub use params::{Data, EncodedForm, ParamValue, Params, encode_pairs, encode_params};
pub use response::Response;
pub use urls::{compose_url, path_url};
