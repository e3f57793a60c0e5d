//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for easy glob
//! importing:
//!
//! ```ignore
//! use primer::prelude::*;
//! ```

pub use crate::{
    Auth, AuthScheme, Body, Cookies, Data, Error, Event, FileField, Files, Hook, HookOwner,
    HttpClient, HttpClientExt, Method, Params, PreparedRequest, RequestSpec, Response, Result,
};
