//! HTTP Client with builder pattern.
//!
//! A [`Client`] carries the settings shared by its requests: the transport,
//! a default timeout and common headers. It is cheap to clone.
//!
//! # Example
//!
//! ```rust,ignore
//! use reqkit::Client;
//! use std::time::Duration;
//!
//! let client = Client::builder()
//!     .timeout(Duration::from_secs(10))
//!     .common_header("user-agent", "reqkit")
//!     .build()?;
//!
//! let resp = client
//!     .request("https://example.com/search")
//!     .with_query("q", "rust")
//!     .get()
//!     .await?;
//! ```

use crate::base::neterror::NetError;
use crate::http::bodyvalue::BodyValue;
use crate::http::formvalues::FormValues;
use crate::http::response::Response;
use crate::transport::{self, Transport};
use crate::urlrequest::request::Request;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// HTTP Client for making requests.
///
/// Use [`Client::builder()`] to configure and create a client.
#[derive(Clone, Default)]
pub struct Client {
    transport: Option<Arc<dyn Transport>>,
    timeout: Option<Duration>,
    headers: Arc<HeaderMap>,
}

impl Client {
    /// Create a new client with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Start building a request to `uri`.
    pub fn request<U: Into<String>>(&self, uri: U) -> Request {
        Request::new(self.clone(), uri)
    }

    /// The transport requests are sent through: the configured one, or the
    /// shared default.
    pub fn transport(&self) -> Arc<dyn Transport> {
        match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => transport::default_transport(),
        }
    }

    /// Default deadline for requests that set none.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Headers added to every request.
    pub fn common_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Send a HEAD request with the given query parameters.
    pub async fn head<U: Into<String>>(&self, uri: U, query: FormValues) -> Result<Response, NetError> {
        self.request(uri).with_queries(query).head().await
    }

    /// Send a GET request with the given query parameters.
    pub async fn get<U: Into<String>>(&self, uri: U, query: FormValues) -> Result<Response, NetError> {
        self.request(uri).with_queries(query).get().await
    }

    /// POST `body`, sent according to its shape.
    pub async fn post<U, B>(&self, uri: U, body: B) -> Result<Response, NetError>
    where
        U: Into<String>,
        B: Into<BodyValue>,
    {
        self.request(uri).with_body(body).post().await
    }

    /// POST `body` encoded as JSON.
    pub async fn post_json<U, T>(&self, uri: U, body: T) -> Result<Response, NetError>
    where
        U: Into<String>,
        T: Serialize + Send + Sync + 'static,
    {
        self.request(uri).with_json_body(body).post().await
    }

    /// POST `body` encoded as XML.
    pub async fn post_xml<U, T>(&self, uri: U, body: T) -> Result<Response, NetError>
    where
        U: Into<String>,
        T: Serialize + Send + Sync + 'static,
    {
        self.request(uri).with_xml_body(body).post().await
    }

    /// POST `form` urlencoded.
    pub async fn post_form<U: Into<String>>(&self, uri: U, form: FormValues) -> Result<Response, NetError> {
        self.request(uri).with_form_body(form).post().await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("custom_transport", &self.transport.is_some())
            .field("timeout", &self.timeout)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    timeout: Option<Duration>,
    headers: HeaderMap,
    error: Option<NetError>,
}

impl ClientBuilder {
    /// Set the default request timeout. Zero disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Set a common header. An empty value removes it.
    pub fn common_header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: fmt::Display,
        V: TryInto<HeaderValue>,
        V::Error: fmt::Display,
    {
        if self.error.is_some() {
            return self;
        }
        let name = match key.try_into() {
            Ok(name) => name,
            Err(e) => {
                self.error = Some(NetError::InvalidHeader(e.to_string()));
                return self;
            }
        };
        match value.try_into() {
            Ok(value) if value.is_empty() => {
                self.headers.remove(&name);
            }
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => self.error = Some(NetError::InvalidHeader(e.to_string())),
        }
        self
    }

    /// Replace every common header.
    pub fn common_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Send requests through `transport` instead of the shared default.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client, NetError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(Client {
            transport: self.transport,
            timeout: self.timeout,
            headers: Arc::new(self.headers),
        })
    }
}
