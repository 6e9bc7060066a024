//! Response body as produced by a transport.

use crate::base::neterror::{BoxError, NetError};
use bytes::Bytes;
use http_body::Body;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use std::fmt;

/// Type-erased response body.
///
/// Transports wrap whatever body their client hands back (hyper's `Incoming`,
/// an in-memory buffer in tests) so the request layer only deals with one type.
pub struct ResponseBody {
    inner: UnsyncBoxBody<Bytes, BoxError>,
}

impl ResponseBody {
    /// Wrap any body with byte frames.
    pub fn new<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self {
            inner: body.map_err(Into::into).boxed_unsync(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Empty::<Bytes>::new())
    }

    /// Read entire body as bytes.
    pub async fn bytes(self) -> Result<Bytes, NetError> {
        let collected = self
            .inner
            .collect()
            .await
            .map_err(NetError::HttpBodyError)?;
        Ok(collected.to_bytes())
    }
}

impl From<Bytes> for ResponseBody {
    fn from(data: Bytes) -> Self {
        Self::new(Full::new(data))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(data: &'static str) -> Self {
        Self::from(Bytes::from_static(data.as_bytes()))
    }
}

impl From<String> for ResponseBody {
    fn from(data: String) -> Self {
        Self::from(Bytes::from(data))
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}
