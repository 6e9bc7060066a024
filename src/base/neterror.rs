use http::Method;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used to carry foreign causes (serializers, hyper, marshalers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum NetError {
    // Request construction
    #[error("empty request url")]
    EmptyRequestUrl,
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    // Body resolution
    #[error("invalid request body: {type_name} is not a recognized body shape")]
    InvalidBody { type_name: &'static str },
    #[error("request body serialization failed: {0}")]
    Serialization(#[source] BoxError),
    #[error(transparent)]
    Marshal(BoxError),

    // Upload assembly
    #[error("empty upload body")]
    EmptyUploadBody,
    #[error("upload target {} is not a regular file", path.display())]
    NotRegularFile { path: PathBuf },
    #[error("invalid upload body: {type_name} is not a recognized file source")]
    InvalidUploadBody { type_name: &'static str },
    #[error("unsupported upload method: {0}")]
    UnsupportedUploadMethod(Method),
    #[error(transparent)]
    Io(#[from] std::io::Error),

    // Deadline and cancellation
    #[error("request timed out")]
    TimedOut,
    #[error("request cancelled")]
    Cancelled,

    // Transport
    #[error("name not resolved: {0}")]
    NameNotResolved(String),
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    // Response handling
    #[error("failed to read response body: {0}")]
    HttpBodyError(#[source] BoxError),
    #[error("response body decoding failed: {0}")]
    Deserialization(#[source] BoxError),
    #[error("empty response")]
    EmptyResponse,
}

impl NetError {
    /// Wrap a serializer failure.
    pub fn serialization<E: Into<BoxError>>(err: E) -> Self {
        NetError::Serialization(err.into())
    }

    /// Wrap a decoder failure.
    pub fn deserialization<E: Into<BoxError>>(err: E) -> Self {
        NetError::Deserialization(err.into())
    }

    /// True for failures raised before any network activity took place.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            NetError::EmptyRequestUrl
                | NetError::InvalidUrl(_)
                | NetError::InvalidHeader(_)
                | NetError::InvalidBody { .. }
                | NetError::Serialization(_)
                | NetError::Marshal(_)
                | NetError::EmptyUploadBody
                | NetError::NotRegularFile { .. }
                | NetError::InvalidUploadBody { .. }
                | NetError::UnsupportedUploadMethod(_)
        )
    }

    /// True when the request deadline or cancellation ended the exchange.
    pub fn is_timeout_or_cancel(&self) -> bool {
        matches!(self, NetError::TimedOut | NetError::Cancelled)
    }
}
