//! # reqkit
//!
//! A fluent HTTP request library.
//!
//! `reqkit` builds requests step by step (method, headers, query
//! parameters, body, timeout, cancellation), sends them through a pluggable
//! [`Transport`](transport::Transport), and returns a fully buffered
//! [`Response`](http::Response).
//!
//! ## Features
//!
//! - **Body resolution**: text, bytes, forms, streams, displayable and
//!   marshalable values, or any serde value as JSON/XML
//! - **Multipart uploads**: fields and files from paths, open handles, readers
//!   or previously-received uploads, encoded in sorted key order
//! - **Layered headers**: client-wide common headers overridden per request
//! - **Deadlines and cancellation**: per-request or client-wide timeouts and
//!   `CancellationToken` support
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reqkit::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reqkit::NetError> {
//!     let client = Client::new();
//!     let response = client
//!         .request("https://example.com/api")
//!         .with_query("page", "1")
//!         .with_json_body(serde_json::json!({"name": "reqkit"}))
//!         .post()
//!         .await?;
//!     println!("Status: {}", response.status_code());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and helpers
//! - [`http`] - Body values, resolution, multipart assembly and responses
//! - [`socket`] - DNS, TCP and TLS connection setup
//! - [`transport`] - The transport trait and its hyper implementation
//! - [`urlrequest`] - The fluent request builder

pub mod base;
pub mod client;
pub mod http;
pub mod socket;
pub mod transport;
pub mod urlrequest;

pub use base::neterror::NetError;
pub use client::{Client, ClientBuilder};
pub use http::{BodyValue, FileSource, FormData, FormValues, Response, UploadedFile};
pub use urlrequest::Request;
