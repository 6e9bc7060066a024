//! Fluent request builder.
//!
//! A [`Request`] accumulates method, headers, query parameters, a body or an
//! upload form, a timeout and a cancellation token, then sends itself through
//! its client's transport. It can be sent repeatedly; every send resolves the
//! body afresh.

use crate::base::neterror::NetError;
use crate::client::Client;
use crate::http::bodyvalue::BodyValue;
use crate::http::filesource::FileSource;
use crate::http::formvalues::FormValues;
use crate::http::multipart::{self, FormData, FormEntry};
use crate::http::requestbody::RequestBody;
use crate::http::resolver::{self, Encoding, CONTENT_TYPE_FORM, CONTENT_TYPE_JSON, CONTENT_TYPE_XML};
use crate::http::response::Response;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, Uri};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read};
use std::mem;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A single request under construction.
pub struct Request {
    client: Client,
    uri: String,
    method: Method,
    headers: HeaderMap,
    header_error: Option<String>,
    cancel: Option<CancellationToken>,
    query: FormValues,
    timeout: Duration,
    body: Option<BodyValue>,
    encoding: Option<Encoding>,
    content_type: Option<&'static str>,
    form_data: FormData,
}

impl Request {
    pub fn new<U: Into<String>>(client: Client, uri: U) -> Self {
        Self {
            client,
            uri: uri.into(),
            method: Method::GET,
            headers: HeaderMap::new(),
            header_error: None,
            cancel: None,
            query: FormValues::new(),
            timeout: Duration::ZERO,
            body: None,
            encoding: None,
            content_type: None,
            form_data: FormData::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query(&self) -> &FormValues {
        &self.query
    }

    pub fn form_data(&self) -> &FormData {
        &self.form_data
    }

    /// Method used by [`Request::send`]. Defaults to GET.
    pub fn with_method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    /// Set a header, replacing earlier values. An empty value removes the
    /// header instead.
    ///
    /// An invalid name or value is reported when the request is sent.
    pub fn with_header(&mut self, key: &str, value: &str) -> &mut Self {
        let name = match HeaderName::from_bytes(key.as_bytes()) {
            Ok(name) => name,
            Err(_) => {
                self.header_error = Some(format!("invalid header name {:?}", key));
                return self;
            }
        };
        if value.is_empty() {
            self.headers.remove(&name);
            return self;
        }
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(_) => {
                self.header_error = Some(format!("invalid value for header {}", name));
            }
        }
        self
    }

    pub fn with_content_type(&mut self, content_type: &str) -> &mut Self {
        self.with_header(CONTENT_TYPE.as_str(), content_type)
    }

    /// Replace every request header.
    pub fn with_headers(&mut self, headers: HeaderMap) -> &mut Self {
        self.headers = headers;
        self.header_error = None;
        self
    }

    /// Abort the exchange when `token` is cancelled.
    pub fn with_cancellation(&mut self, token: CancellationToken) -> &mut Self {
        self.cancel = Some(token);
        self
    }

    /// Set a query parameter, replacing earlier values of the key.
    pub fn with_query<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query.set(key, value);
        self
    }

    /// Set a query parameter from any displayable value.
    pub fn with_query_value<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.with_query(key, value.to_string())
    }

    /// Replace every query parameter.
    pub fn with_queries(&mut self, query: FormValues) -> &mut Self {
        self.query = query;
        self
    }

    /// Deadline for this request. Zero falls back to the client timeout.
    pub fn with_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Set the body; its shape decides how it is sent.
    pub fn with_body<B: Into<BodyValue>>(&mut self, body: B) -> &mut Self {
        self.set_body(body.into(), None, None)
    }

    /// Send `body` encoded as JSON with `Content-Type: application/json`.
    pub fn with_json_body<T>(&mut self, body: T) -> &mut Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.set_body(
            BodyValue::structured(body),
            Some(Encoding::Json),
            Some(CONTENT_TYPE_JSON),
        )
    }

    /// Send already encoded JSON as-is.
    pub fn with_raw_json_body<B: Into<Bytes>>(&mut self, body: B) -> &mut Self {
        self.set_body(BodyValue::Bytes(body.into()), None, Some(CONTENT_TYPE_JSON))
    }

    /// Send `body` encoded as XML with `Content-Type: application/xml`.
    pub fn with_xml_body<T>(&mut self, body: T) -> &mut Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.set_body(
            BodyValue::structured(body),
            Some(Encoding::Xml),
            Some(CONTENT_TYPE_XML),
        )
    }

    /// Send already encoded XML as-is.
    pub fn with_raw_xml_body<B: Into<Bytes>>(&mut self, body: B) -> &mut Self {
        self.set_body(BodyValue::Bytes(body.into()), None, Some(CONTENT_TYPE_XML))
    }

    /// Send `form` urlencoded.
    pub fn with_form_body(&mut self, form: FormValues) -> &mut Self {
        self.set_body(BodyValue::Form(form), None, Some(CONTENT_TYPE_FORM))
    }

    fn set_body(
        &mut self,
        body: BodyValue,
        encoding: Option<Encoding>,
        content_type: Option<&'static str>,
    ) -> &mut Self {
        self.body = Some(body);
        self.encoding = encoding;
        self.content_type = content_type;
        self
    }

    pub async fn head(&mut self) -> Result<Response, NetError> {
        self.send_by(Method::HEAD).await
    }

    pub async fn get(&mut self) -> Result<Response, NetError> {
        self.send_by(Method::GET).await
    }

    pub async fn post(&mut self) -> Result<Response, NetError> {
        self.send_by(Method::POST).await
    }

    /// Send with the method set by [`Request::with_method`].
    pub async fn send(&mut self) -> Result<Response, NetError> {
        let method = self.method.clone();
        self.send_by(method).await
    }

    /// Resolve the body and send the request with `method`.
    ///
    /// A stream body is consumed by the first send; every other shape is
    /// resolved again on each call.
    pub async fn send_by(&mut self, method: Method) -> Result<Response, NetError> {
        if self.uri.is_empty() {
            return Err(NetError::EmptyRequestUrl);
        }

        let value = match &self.body {
            Some(BodyValue::Stream(_)) => self.body.take(),
            Some(value) => value.try_clone(),
            None => None,
        };
        let resolved = resolver::resolve(value, self.encoding)?;
        let content_type = self.content_type.or(resolved.content_type);

        self.dispatch(method, resolved.body, content_type.map(Cow::Borrowed))
            .await
    }

    /// Append a text field to the upload form.
    pub fn with_form_data_field<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.form_data.add_field(key, value.to_string());
        self
    }

    /// Append a file to the upload form: a path, an open file, or a
    /// previously-received upload.
    pub fn with_form_data_file<K, S>(&mut self, key: K, source: S) -> &mut Self
    where
        K: Into<String>,
        S: Into<FileSource>,
    {
        self.form_data.add_file(key, source);
        self
    }

    /// Append the contents of `reader` as a file named `file_name`.
    pub fn with_form_data_file_from_reader<K, N, R>(
        &mut self,
        key: K,
        file_name: N,
        reader: R,
    ) -> &mut Self
    where
        K: Into<String>,
        N: Into<String>,
        R: Read + Send + 'static,
    {
        self.form_data
            .add_file(key, FileSource::reader(file_name, reader));
        self
    }

    /// Drop every upload entry under `key`.
    pub fn remove_form_data(&mut self, key: &str) -> Option<Vec<FormEntry>> {
        self.form_data.remove(key)
    }

    pub fn clear_form_data(&mut self) -> &mut Self {
        self.form_data.clear();
        self
    }

    /// Upload the form with POST.
    pub async fn upload(&mut self) -> Result<Response, NetError> {
        self.upload_by(Method::POST).await
    }

    /// Assemble the form into a multipart body and send it with `method`,
    /// which must be POST or PUT.
    ///
    /// The form is consumed even when assembly fails.
    pub async fn upload_by(&mut self, method: Method) -> Result<Response, NetError> {
        if self.uri.is_empty() {
            return Err(NetError::EmptyRequestUrl);
        }
        if method != Method::POST && method != Method::PUT {
            return Err(NetError::UnsupportedUploadMethod(method));
        }
        if self.form_data.is_empty() {
            return Err(NetError::EmptyUploadBody);
        }

        let form = mem::take(&mut self.form_data);
        let multipart = tokio::task::spawn_blocking(move || multipart::assemble(form))
            .await
            .map_err(|e| NetError::Io(io::Error::new(io::ErrorKind::Other, e)))??;

        self.dispatch(
            method,
            RequestBody::Bytes(multipart.body),
            Some(Cow::Owned(multipart.content_type)),
        )
        .await
    }

    /// Reset everything except the client and the URI.
    pub fn clear(&mut self) -> &mut Self {
        self.method = Method::GET;
        self.headers.clear();
        self.header_error = None;
        self.cancel = None;
        self.query = FormValues::new();
        self.timeout = Duration::ZERO;
        self.body = None;
        self.encoding = None;
        self.content_type = None;
        self.clear_form_data()
    }

    async fn dispatch(
        &mut self,
        method: Method,
        body: RequestBody,
        content_type: Option<Cow<'static, str>>,
    ) -> Result<Response, NetError> {
        if let Some(err) = &self.header_error {
            return Err(NetError::InvalidHeader(err.clone()));
        }

        let uri = self.target_uri()?;
        let headers = self.merged_headers(content_type.as_deref())?;

        let mut request = http::Request::new(body);
        *request.method_mut() = method.clone();
        *request.uri_mut() = uri;
        *request.headers_mut() = headers;

        let deadline = if self.timeout.is_zero() {
            self.client.timeout()
        } else {
            Some(self.timeout)
        };
        let cancel = self.cancel.clone();
        let transport = self.client.transport();
        let no_body = method == Method::HEAD;

        tracing::debug!(method = %method, url = %request.uri(), "sending request");

        let exchange = async move {
            let response = transport.execute(request).await?;
            Response::from_http(response, no_body).await
        };
        let exchange = async move {
            match deadline {
                Some(limit) => tokio::time::timeout(limit, exchange)
                    .await
                    .map_err(|_| NetError::TimedOut)?,
                None => exchange.await,
            }
        };
        let result = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(NetError::Cancelled),
                    result = exchange => result,
                }
            }
            None => exchange.await,
        };

        match &result {
            Ok(response) => {
                tracing::debug!(method = %method, status = response.status_code(), "response received")
            }
            Err(e) => tracing::debug!(method = %method, error = %e, "request failed"),
        }
        result
    }

    /// The request URI with query parameters merged into any existing query.
    fn target_uri(&self) -> Result<Uri, NetError> {
        let mut url = Url::parse(&self.uri)
            .map_err(|e| NetError::InvalidUrl(format!("{}: {}", self.uri, e)))?;

        if !self.query.is_empty() {
            let query = match url.query().filter(|q| !q.is_empty()) {
                None => self.query.encode(),
                Some(existing) => {
                    let mut merged = FormValues::parse(existing);
                    merged.merge(&self.query);
                    merged.encode()
                }
            };
            url.set_query(Some(&query));
        }

        url.as_str()
            .parse::<Uri>()
            .map_err(|e| NetError::InvalidUrl(format!("{}: {}", url, e)))
    }

    /// Client headers, overridden per key by request headers, then the
    /// forced content type.
    fn merged_headers(&self, content_type: Option<&str>) -> Result<HeaderMap, NetError> {
        let mut headers = self.client.common_headers().clone();
        for name in self.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in &self.headers {
            headers.append(name.clone(), value.clone());
        }

        if let Some(content_type) = content_type {
            let value = HeaderValue::from_str(content_type)
                .map_err(|_| NetError::InvalidHeader(format!("content-type: {}", content_type)))?;
            headers.insert(CONTENT_TYPE, value);
        }
        Ok(headers)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("uri", &self.uri)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("timeout", &self.timeout)
            .field("body", &self.body)
            .field("encoding", &self.encoding)
            .field("form_data", &self.form_data)
            .finish_non_exhaustive()
    }
}
