//! Request body values.
//!
//! A [`BodyValue`] is one of a closed set of recognized shapes. The resolver
//! matches on the shape in a fixed precedence order, so there is no runtime
//! type inspection: anything that is not one of the shapes below is carried as
//! [`BodyValue::Unrecognized`]. It is rejected when sent as-is, but still
//! serializes under a declared encoding.

use crate::base::neterror::BoxError;
use crate::http::formvalues::FormValues;
use crate::http::requestbody::BodyStream;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// A value with a text conversion that may fail.
pub trait TextMarshaler: Send + Sync {
    fn marshal_text(&self) -> Result<Vec<u8>, BoxError>;
}

/// Object-safe view of a `serde::Serialize` value.
pub trait StructuredValue: Send + Sync {
    fn to_json(&self) -> Result<Vec<u8>, BoxError>;

    /// Values with no element name of their own (strings, numbers,
    /// sequences, maps) are wrapped in a root tag named after their type.
    fn to_xml(&self) -> Result<Vec<u8>, BoxError>;

    /// Serialize under an explicit root tag.
    fn to_xml_with_root(&self, root: &str) -> Result<Vec<u8>, BoxError>;
}

impl<T> StructuredValue for T
where
    T: Serialize + Send + Sync,
{
    fn to_json(&self) -> Result<Vec<u8>, BoxError> {
        Ok(serde_json::to_vec(self)?)
    }

    fn to_xml(&self) -> Result<Vec<u8>, BoxError> {
        match quick_xml::se::to_string(self) {
            Ok(xml) => Ok(xml.into_bytes()),
            Err(quick_xml::DeError::Unsupported(_)) => self.to_xml_with_root(xml_root_name::<T>()),
            Err(e) => Err(e.into()),
        }
    }

    fn to_xml_with_root(&self, root: &str) -> Result<Vec<u8>, BoxError> {
        Ok(quick_xml::se::to_string_with_root(root, self)?.into_bytes())
    }
}

/// Root tag for a value without one: the last path segment of its type,
/// without generics. `str` and `String` become `string`.
fn xml_root_name<T: ?Sized>() -> &'static str {
    let name = std::any::type_name::<T>();
    let name = name.split('<').next().unwrap_or(name);
    let name = name.trim_start_matches('&');
    let name = name.rsplit("::").next().unwrap_or(name);
    match name {
        "str" | "String" => "string",
        other => other,
    }
}

/// A request body value.
pub enum BodyValue {
    /// Text, sent as its UTF-8 bytes.
    Text(String),
    /// Raw bytes, sent as-is.
    Bytes(Bytes),
    /// Key/value pairs, sent urlencoded.
    Form(FormValues),
    /// A reader passed through to the transport unbuffered.
    Stream(BodyStream),
    /// A value with a stable string conversion.
    Display(Arc<dyn fmt::Display + Send + Sync>),
    /// A value whose text conversion may fail.
    Marshal(Arc<dyn TextMarshaler>),
    /// A serde value; only sendable with a declared encoding.
    Structured(Arc<dyn StructuredValue>),
    /// Anything else. Not a body on its own; the value is kept so a
    /// declared encoding can still serialize it.
    Unrecognized {
        type_name: &'static str,
        value: Arc<dyn StructuredValue>,
    },
}

impl BodyValue {
    /// Wrap an async reader.
    pub fn stream<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        BodyValue::Stream(BodyStream::new(reader))
    }

    /// Wrap a value whose `Display` output is the body.
    pub fn display<D>(value: D) -> Self
    where
        D: fmt::Display + Send + Sync + 'static,
    {
        BodyValue::Display(Arc::new(value))
    }

    /// Wrap a value with a fallible text conversion.
    pub fn marshaler<M>(value: M) -> Self
    where
        M: TextMarshaler + 'static,
    {
        BodyValue::Marshal(Arc::new(value))
    }

    /// Wrap a serde value for JSON or XML encoding.
    pub fn structured<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        BodyValue::Structured(Arc::new(value))
    }

    /// Name of the shape, used in error messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BodyValue::Text(_) => "text",
            BodyValue::Bytes(_) => "bytes",
            BodyValue::Form(_) => "form",
            BodyValue::Stream(_) => "stream",
            BodyValue::Display(_) => "display",
            BodyValue::Marshal(_) => "marshal",
            BodyValue::Structured(_) => "structured",
            BodyValue::Unrecognized { type_name, .. } => *type_name,
        }
    }

    /// Clone every shape except a stream, which can only be read once.
    pub fn try_clone(&self) -> Option<Self> {
        Some(match self {
            BodyValue::Text(s) => BodyValue::Text(s.clone()),
            BodyValue::Bytes(b) => BodyValue::Bytes(b.clone()),
            BodyValue::Form(f) => BodyValue::Form(f.clone()),
            BodyValue::Stream(_) => return None,
            BodyValue::Display(d) => BodyValue::Display(Arc::clone(d)),
            BodyValue::Marshal(m) => BodyValue::Marshal(Arc::clone(m)),
            BodyValue::Structured(s) => BodyValue::Structured(Arc::clone(s)),
            BodyValue::Unrecognized { type_name, value } => BodyValue::Unrecognized {
                type_name: *type_name,
                value: Arc::clone(value),
            },
        })
    }
}

impl fmt::Debug for BodyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            BodyValue::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            BodyValue::Form(v) => f.debug_tuple("Form").field(v).finish(),
            BodyValue::Stream(s) => f.debug_tuple("Stream").field(s).finish(),
            BodyValue::Display(d) => f.debug_tuple("Display").field(&d.to_string()).finish(),
            BodyValue::Marshal(_) => f.write_str("Marshal(..)"),
            BodyValue::Structured(_) => f.write_str("Structured(..)"),
            BodyValue::Unrecognized { type_name, .. } => {
                f.debug_tuple("Unrecognized").field(type_name).finish()
            }
        }
    }
}

impl From<String> for BodyValue {
    fn from(s: String) -> Self {
        BodyValue::Text(s)
    }
}

impl From<&str> for BodyValue {
    fn from(s: &str) -> Self {
        BodyValue::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for BodyValue {
    fn from(v: Vec<u8>) -> Self {
        BodyValue::Bytes(Bytes::from(v))
    }
}

impl From<&[u8]> for BodyValue {
    fn from(v: &[u8]) -> Self {
        BodyValue::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<Bytes> for BodyValue {
    fn from(b: Bytes) -> Self {
        BodyValue::Bytes(b)
    }
}

impl From<FormValues> for BodyValue {
    fn from(f: FormValues) -> Self {
        BodyValue::Form(f)
    }
}

impl From<BodyStream> for BodyValue {
    fn from(s: BodyStream) -> Self {
        BodyValue::Stream(s)
    }
}

// Scalars are valid query and header values but never bodies on their own.
macro_rules! unrecognized_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for BodyValue {
                fn from(value: $ty) -> Self {
                    BodyValue::Unrecognized {
                        type_name: stringify!($ty),
                        value: Arc::new(value),
                    }
                }
            }
        )*
    };
}

unrecognized_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char);
