//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use primer_core::prelude::*;
//! ```

pub use crate::{
    Body, BodyStream, Cookies, Data, Error, Event, FileField, Files, HeaderSpec, Headers, Hook,
    HookOwner, Hooks, JsonBody, Method, Params, Response, Result,
};
