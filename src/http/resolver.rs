//! Body resolution.
//!
//! Turns a [`BodyValue`] plus an optional declared [`Encoding`] into a
//! transmittable [`RequestBody`]. Resolution is pure: it performs no I/O, never
//! retries and never logs. Any error means no body was produced.

use crate::base::neterror::NetError;
use crate::http::bodyvalue::{BodyValue, StructuredValue};
use crate::http::requestbody::RequestBody;
use bytes::Bytes;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Declared structured encoding for a body value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Xml,
}

impl Encoding {
    /// Content type forced on requests using this encoding.
    pub fn content_type(self) -> &'static str {
        match self {
            Encoding::Json => CONTENT_TYPE_JSON,
            Encoding::Xml => CONTENT_TYPE_XML,
        }
    }
}

/// Output of [`resolve`]: the body plus the content type it forces, if any.
#[derive(Debug, Default)]
pub struct ResolvedBody {
    pub body: RequestBody,
    pub content_type: Option<&'static str>,
}

/// Resolve a body value into a request body.
///
/// With a declared encoding the value is serialized and the matching content
/// type is forced. Without one, the value's shape decides:
///
/// | shape | body |
/// |---|---|
/// | `Text` | UTF-8 bytes |
/// | `Bytes` | as-is |
/// | `Form` | urlencoded pairs |
/// | `Stream` | passed through |
/// | `Display` | the displayed string |
/// | `Marshal` | marshalled bytes, or the marshaler's own error |
/// | anything else | [`NetError::InvalidBody`] |
pub fn resolve(
    value: Option<BodyValue>,
    encoding: Option<Encoding>,
) -> Result<ResolvedBody, NetError> {
    let Some(value) = value else {
        return Ok(ResolvedBody::default());
    };

    if let Some(encoding) = encoding {
        let data = encode(&value, encoding)?;
        return Ok(ResolvedBody {
            body: RequestBody::Bytes(Bytes::from(data)),
            content_type: Some(encoding.content_type()),
        });
    }

    let body = match value {
        BodyValue::Text(s) => RequestBody::Bytes(Bytes::from(s)),
        BodyValue::Bytes(b) => RequestBody::Bytes(b),
        BodyValue::Form(f) => RequestBody::Bytes(Bytes::from(f.encode())),
        BodyValue::Stream(s) => RequestBody::Stream(s),
        BodyValue::Display(d) => RequestBody::Bytes(Bytes::from(d.to_string())),
        BodyValue::Marshal(m) => {
            RequestBody::Bytes(Bytes::from(m.marshal_text().map_err(NetError::Marshal)?))
        }
        other @ (BodyValue::Structured(_) | BodyValue::Unrecognized { .. }) => {
            return Err(NetError::InvalidBody {
                type_name: other.kind(),
            })
        }
    };

    Ok(ResolvedBody {
        body,
        content_type: None,
    })
}

/// Serialize a value with the declared encoding.
fn encode(value: &BodyValue, encoding: Encoding) -> Result<Vec<u8>, NetError> {
    match value {
        BodyValue::Structured(s) => encode_structured(s.as_ref(), encoding, None),
        BodyValue::Text(s) => encode_structured(s, encoding, None),
        BodyValue::Bytes(b) => encode_structured(&b.to_vec(), encoding, Some("bytes")),
        BodyValue::Form(f) => encode_structured(f, encoding, None),
        BodyValue::Display(d) => encode_structured(&d.to_string(), encoding, None),
        BodyValue::Marshal(m) => {
            let raw = m.marshal_text().map_err(NetError::Serialization)?;
            let text = String::from_utf8(raw).map_err(NetError::serialization)?;
            encode_structured(&text, encoding, None)
        }
        BodyValue::Unrecognized { value, .. } => encode_structured(value.as_ref(), encoding, None),
        BodyValue::Stream(_) => Err(NetError::serialization(
            "stream value has no structured form",
        )),
    }
}

fn encode_structured(
    value: &dyn StructuredValue,
    encoding: Encoding,
    xml_root: Option<&str>,
) -> Result<Vec<u8>, NetError> {
    match (encoding, xml_root) {
        (Encoding::Json, _) => value.to_json(),
        (Encoding::Xml, None) => value.to_xml(),
        (Encoding::Xml, Some(root)) => value.to_xml_with_root(root),
    }
    .map_err(NetError::Serialization)
}
