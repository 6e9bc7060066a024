//! Shared helpers for integration tests.
#![allow(dead_code)]

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, Method, StatusCode};
use reqkit::http::{RequestBody, ResponseBody};
use reqkit::transport::Transport;
use reqkit::NetError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request as seen by the transport.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// In-process transport that records requests and echoes their body back.
#[derive(Clone)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<Recorded>>>,
    status: StatusCode,
    reply: Option<Bytes>,
    delay: Option<Duration>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            requests: Arc::default(),
            status: StatusCode::OK,
            reply: None,
            delay: None,
        }
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Reply with a fixed body instead of echoing.
    pub fn with_reply(mut self, reply: &'static str) -> Self {
        self.reply = Some(Bytes::from_static(reply.as_bytes()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("no request was sent")
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for RecordingTransport {
    fn execute(
        &self,
        request: http::Request<RequestBody>,
    ) -> BoxFuture<'_, Result<http::Response<ResponseBody>, NetError>> {
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let body = body.into_bytes().await?;
            self.requests.lock().unwrap().push(Recorded {
                method: parts.method.clone(),
                uri: parts.uri.to_string(),
                headers: parts.headers.clone(),
                body: body.clone(),
            });

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let reply = self.reply.clone().unwrap_or(body);
            Ok(http::Response::builder()
                .status(self.status)
                .header("x-method", parts.method.as_str())
                .body(ResponseBody::from(reply))
                .unwrap())
        })
    }
}

/// A decoded multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Extract the boundary from a `multipart/form-data` content type.
pub fn boundary_of(content_type: &str) -> String {
    content_type
        .split("boundary=")
        .nth(1)
        .expect("content type has no boundary")
        .to_string()
}

/// Minimal multipart/form-data parser for assertions.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Vec<ParsedPart> {
    let delimiter = format!("--{}", boundary);
    let separator = format!("\r\n{}", delimiter);

    let mut rest = body
        .strip_prefix(delimiter.as_bytes())
        .expect("body does not start with the boundary");
    let mut parts = Vec::new();

    loop {
        if rest == b"--\r\n" {
            break;
        }
        rest = rest.strip_prefix(b"\r\n").expect("missing CRLF after boundary");

        let end = find(rest, separator.as_bytes()).expect("unterminated part");
        let part = &rest[..end];
        rest = &rest[end + separator.len()..];

        let header_end = find(part, b"\r\n\r\n").expect("part without headers");
        let headers = std::str::from_utf8(&part[..header_end]).unwrap();
        let data = part[header_end + 4..].to_vec();

        let mut parsed = ParsedPart {
            name: String::new(),
            file_name: None,
            content_type: None,
            data,
        };
        for line in headers.split("\r\n") {
            let (key, value) = line.split_once(": ").expect("malformed header");
            match key {
                "Content-Disposition" => {
                    for param in value.split("; ").skip(1) {
                        let (k, v) = param.split_once('=').expect("malformed parameter");
                        let v = v.trim_matches('"').to_string();
                        match k {
                            "name" => parsed.name = v,
                            "filename" => parsed.file_name = Some(v),
                            _ => {}
                        }
                    }
                }
                "Content-Type" => parsed.content_type = Some(value.to_string()),
                _ => {}
            }
        }
        parts.push(parsed);
    }
    parts
}

/// Group text parts by name, values in wire order.
pub fn fields_of(parts: &[ParsedPart]) -> BTreeMap<String, Vec<String>> {
    let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for part in parts.iter().filter(|p| p.file_name.is_none()) {
        fields
            .entry(part.name.clone())
            .or_default()
            .push(String::from_utf8(part.data.clone()).unwrap());
    }
    fields
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
