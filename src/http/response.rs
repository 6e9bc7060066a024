//! Buffered HTTP response.

use crate::base::neterror::NetError;
use crate::http::ResponseBody;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use hyper::ext::ReasonPhrase;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::fmt;

/// HTTP response with its body read into memory.
///
/// Responses to HEAD requests carry no body at all, which is distinct from an
/// empty one: [`Response::body`] returns `None` for them.
#[derive(Debug, Clone)]
pub struct Response {
    status: Option<StatusCode>,
    status_text: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    /// Buffer a transport response. With `no_body` the body is dropped unread.
    pub async fn from_http(
        resp: http::Response<ResponseBody>,
        no_body: bool,
    ) -> Result<Self, NetError> {
        let (parts, body) = resp.into_parts();
        let status_text = match parts.extensions.get::<ReasonPhrase>() {
            Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
            None => canonical_text(parts.status),
        };
        let body = if no_body { None } else { Some(body.bytes().await?) };

        Ok(Self {
            status: Some(parts.status),
            status_text,
            headers: parts.headers,
            body,
        })
    }

    /// Build a response from its parts.
    ///
    /// Without `status_text` the canonical reason phrase of `status` is used.
    pub fn from_parts<B>(
        body: B,
        headers: HeaderMap,
        status: StatusCode,
        status_text: Option<String>,
    ) -> Self
    where
        B: Into<Bytes>,
    {
        Self {
            status: Some(status),
            status_text: status_text.unwrap_or_else(|| canonical_text(status)),
            headers,
            body: Some(body.into()),
        }
    }

    /// A placeholder with no status, headers or body. Decoding it fails with
    /// [`NetError::EmptyResponse`].
    pub fn empty() -> Self {
        Self {
            status: None,
            status_text: String::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Get the status code, `None` for [`Response::empty`].
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Numeric status code, `0` for [`Response::empty`].
    pub fn status_code(&self) -> u16 {
        self.status.map(|s| s.as_u16()).unwrap_or(0)
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the body, `None` if the response carried none (HEAD).
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn len(&self) -> usize {
        self.body.as_ref().map(Bytes::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Body as text, invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.bytes())
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NetError> {
        self.ensure_decodable()?;
        serde_json::from_slice(self.bytes()).map_err(NetError::deserialization)
    }

    /// Decode the body as XML.
    pub fn xml<T: DeserializeOwned>(&self) -> Result<T, NetError> {
        self.ensure_decodable()?;
        let text = std::str::from_utf8(self.bytes()).map_err(NetError::deserialization)?;
        quick_xml::de::from_str(text).map_err(NetError::deserialization)
    }

    fn ensure_decodable(&self) -> Result<(), NetError> {
        if self.status.is_none() {
            return Err(NetError::EmptyResponse);
        }
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

fn canonical_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_owned()
}
