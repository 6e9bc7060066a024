//! Request bodies, uploads and responses.
//!
//! - [`resolver`]: turns a [`BodyValue`] into a [`RequestBody`]
//! - [`multipart`]: encodes a [`FormData`] set into a multipart body
//! - [`response`]: the buffered [`Response`]

pub mod bodyvalue;
pub mod filesource;
pub mod formvalues;
pub mod multipart;
pub mod requestbody;
pub mod resolver;
pub mod response;
pub mod responsebody;

// Re-exports for convenience
pub use bodyvalue::{BodyValue, StructuredValue, TextMarshaler};
pub use filesource::{FileSource, UploadedFile};
pub use formvalues::FormValues;
pub use multipart::{FormData, FormEntry, Multipart};
pub use requestbody::{BodyStream, RequestBody};
pub use resolver::{Encoding, ResolvedBody};
pub use response::Response;
pub use responsebody::ResponseBody;
