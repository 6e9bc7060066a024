//! Socket and connection setup.
//!
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`stream`]: the connected socket, plain or TLS
//! - [`tls`]: TLS configuration with BoringSSL

pub mod connectjob;
pub mod stream;
pub mod tls;
