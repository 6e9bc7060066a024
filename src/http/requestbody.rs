//! Request body for POST/PUT operations.
//!
//! `RequestBody` is what the resolver and the multipart assembler hand to a
//! [`Transport`](crate::transport::Transport): either nothing, a buffered byte
//! payload, or a caller-supplied reader streamed without buffering.

use bytes::Bytes;
use futures::TryStreamExt;
use http_body::Frame;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use std::fmt;
use std::io;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::ReaderStream;

/// Body type handed to hyper.
pub type HyperBody = UnsyncBoxBody<Bytes, io::Error>;

/// An async byte source passed through to the transport as-is.
pub struct BodyStream {
    reader: Pin<Box<dyn AsyncRead + Send>>,
}

impl BodyStream {
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            reader: Box::pin(reader),
        }
    }

    /// Read the stream to its end.
    pub async fn read_all(mut self) -> io::Result<Bytes> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }

    fn into_reader(self) -> Pin<Box<dyn AsyncRead + Send>> {
        self.reader
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream").finish_non_exhaustive()
    }
}

/// Request body for HTTP methods that send data.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body (GET, HEAD, DELETE).
    #[default]
    Empty,
    /// Body with raw bytes.
    Bytes(Bytes),
    /// Body read from a stream of unknown length.
    Stream(BodyStream),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::from(s.to_owned()))
    }
}

impl From<&[u8]> for RequestBody {
    fn from(s: &[u8]) -> Self {
        RequestBody::Bytes(Bytes::copy_from_slice(s))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl From<BodyStream> for RequestBody {
    fn from(s: BodyStream) -> Self {
        RequestBody::Stream(s)
    }
}

impl RequestBody {
    /// Check if the body is empty.
    ///
    /// A stream is never considered empty, its length is unknown.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Bytes(b) => b.is_empty(),
            RequestBody::Stream(_) => false,
        }
    }

    /// Length in bytes when known up front.
    pub fn len(&self) -> Option<usize> {
        match self {
            RequestBody::Empty => Some(0),
            RequestBody::Bytes(b) => Some(b.len()),
            RequestBody::Stream(_) => None,
        }
    }

    /// Buffered bytes, if this body is not a stream.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            RequestBody::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Drain the body into memory.
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        match self {
            RequestBody::Empty => Ok(Bytes::new()),
            RequestBody::Bytes(b) => Ok(b),
            RequestBody::Stream(s) => s.read_all().await,
        }
    }

    /// Convert into a boxed hyper body.
    pub fn into_hyper(self) -> HyperBody {
        match self {
            RequestBody::Empty => Empty::<Bytes>::new()
                .map_err(|never| match never {})
                .boxed_unsync(),
            RequestBody::Bytes(b) => Full::new(b).map_err(|never| match never {}).boxed_unsync(),
            RequestBody::Stream(s) => {
                let frames = ReaderStream::new(s.into_reader()).map_ok(Frame::data);
                StreamBody::new(frames).boxed_unsync()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body::Body;

    #[test]
    fn test_empty_body() {
        let body = RequestBody::Empty;
        assert!(body.is_empty());
        assert_eq!(body.len(), Some(0));
    }

    #[test]
    fn test_bytes_body() {
        let body = RequestBody::Bytes(Bytes::from("hello"));
        assert!(!body.is_empty());
        assert_eq!(body.len(), Some(5));
        assert_eq!(body.as_bytes().unwrap(), "hello");
    }

    #[test]
    fn test_stream_len_unknown() {
        let body = RequestBody::from(BodyStream::new(&b"abc"[..]));
        assert!(!body.is_empty());
        assert_eq!(body.len(), None);
        assert!(body.as_bytes().is_none());
    }

    #[test]
    fn test_from_conversions() {
        let body: RequestBody = "hello world".to_string().into();
        assert_eq!(body.len(), Some(11));
        let body: RequestBody = "test".into();
        assert_eq!(body.len(), Some(4));
        let body: RequestBody = vec![1u8, 2, 3, 4].into();
        assert_eq!(body.len(), Some(4));
        let body: RequestBody = Bytes::from_static(b"raw").into();
        assert_eq!(body.len(), Some(3));
        let body: RequestBody = b"slice".as_slice().into();
        assert_eq!(body.len(), Some(5));
    }

    #[test]
    fn test_default_is_empty() {
        assert!(RequestBody::default().is_empty());
    }

    #[tokio::test]
    async fn test_stream_into_bytes() {
        let body = RequestBody::from(BodyStream::new(&b"streamed"[..]));
        assert_eq!(body.into_bytes().await.unwrap(), "streamed");
    }

    #[tokio::test]
    async fn test_into_hyper_sizes() {
        let full = RequestBody::from("test").into_hyper();
        assert_eq!(full.size_hint().exact(), Some(4));

        let empty = RequestBody::Empty.into_hyper();
        assert_eq!(empty.size_hint().exact(), Some(0));
    }

    #[tokio::test]
    async fn test_into_hyper_stream_collects() {
        let body = RequestBody::from(BodyStream::new(&b"chunked payload"[..])).into_hyper();
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(collected, "chunked payload");
    }
}
