//! Pluggable request execution.
//!
//! A [`Transport`] takes a fully prepared request (final URI, merged headers,
//! resolved body) and returns the raw response. It never retries and applies
//! no deadline of its own; the request layer races it against the timeout and
//! cancellation token.
//!
//! The process-wide default is created lazily on first use and shared by every
//! client that does not supply its own transport.

use crate::base::neterror::NetError;
use crate::http::{RequestBody, ResponseBody};
use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use std::sync::Arc;

pub mod hypertransport;

pub use hypertransport::HyperTransport;

/// Executes one HTTP exchange.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: http::Request<RequestBody>,
    ) -> BoxFuture<'_, Result<http::Response<ResponseBody>, NetError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(
        &self,
        request: http::Request<RequestBody>,
    ) -> BoxFuture<'_, Result<http::Response<ResponseBody>, NetError>> {
        (**self).execute(request)
    }
}

static DEFAULT_TRANSPORT: Lazy<Arc<dyn Transport>> =
    Lazy::new(|| Arc::new(HyperTransport::new()));

/// The shared default transport.
pub fn default_transport() -> Arc<dyn Transport> {
    Arc::clone(&DEFAULT_TRANSPORT)
}

/// A fresh transport with default settings, not shared with anyone.
pub fn new_default_transport() -> Arc<dyn Transport> {
    Arc::new(HyperTransport::new())
}
