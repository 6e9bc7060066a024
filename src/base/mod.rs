//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): the single error type of the crate
//! - [`IoResultExt`](context::IoResultExt): path context for filesystem errors

pub mod context;
pub mod neterror;

pub use neterror::{BoxError, NetError};
