//! High-level request API.

pub mod request;

pub use request::Request;
