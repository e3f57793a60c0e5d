//! Transport boundary.
//!
//! Preparation never touches the network. An [`HttpClient`] is whatever moves
//! a [`PreparedRequest`] over the wire; [`HttpClientExt`] adds the glue that
//! prepares requests and runs response hooks around it.

use std::future::Future;

use primer_core::{Error, Event, Response, Result};
use tracing::debug;

use crate::{PreparedRequest, RequestSpec};

/// Sends prepared requests.
///
/// Implement this to plug a transport in. Tests use an in-memory one.
pub trait HttpClient: Send + Sync {
    /// Send the request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the response
    /// cannot be read.
    fn execute(&self, request: &PreparedRequest) -> impl Future<Output = Result<Response>> + Send;
}

/// Extension trait for [`HttpClient`] with convenience methods.
pub trait HttpClientExt: HttpClient {
    /// Send a prepared request and run its response hooks, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMethod`] if the method is unset, or whatever
    /// the transport returns.
    fn send(&self, request: &PreparedRequest) -> impl Future<Output = Result<Response>> + Send {
        async move {
            if request.method().is_none() {
                return Err(Error::MissingMethod);
            }
            debug!(%request, url = request.url(), "sending request");
            let mut response = self.execute(request).await?;
            debug!(status = response.status(), "received response");
            request.hooks().dispatch(Event::Response, &mut response);
            Ok(response)
        }
    }

    /// Prepare and send a request.
    ///
    /// # Errors
    ///
    /// Returns any preparation error, then the same errors as
    /// [`send`](Self::send).
    fn request(&self, spec: &RequestSpec) -> impl Future<Output = Result<Response>> + Send {
        let prepared = spec.prepare();
        async move {
            let prepared = prepared?;
            self.send(&prepared).await
        }
    }
}

impl<T: HttpClient> HttpClientExt for T {}
