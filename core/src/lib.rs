//! Client core for a key-based remote CRUD service.
//!
//! # Overview
//! Four operations (`create`, `get`, `update`, `delete`) against one
//! resource, authenticated with an `x-api-key` header. `CrudClient` builds
//! `HttpRequest` values and parses `HttpResponse` values without touching the
//! network; `BlockingClient` pairs it with a `Transport` (by default `ureq`)
//! for callers that just want one call per operation.
//!
//! # Design
//! - Configuration belongs to a client instance. An uninitialized client
//!   rejects every operation with `ApiError::Configuration`.
//! - Inputs are checked before any request is built, so a rejected call
//!   never reaches the transport.
//! - Non-2xx responses go through `error::normalize`, a pure function of
//!   status and body. Transport failures are passed through untouched.
//! - Success bodies are returned as `serde_json::Value` with no schema.
//!
//! ```no_run
//! use crud_core::{BlockingClient, Record};
//!
//! # fn main() -> Result<(), crud_core::ApiError> {
//! let client = BlockingClient::new("https://crud.example.com", "my-key")?;
//! let created = client.create(&Record::new("hello").with_tx_hash("0xabc"))?;
//! let id = created["id"].as_str().unwrap_or_default();
//! client.update(id, &Record::new("hello again"))?;
//! client.delete(id)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::CrudClient;
pub use config::Config;
pub use error::{normalize, ApiError, ErrorKind, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
#[cfg(feature = "blocking")]
pub use transport::UreqTransport;
pub use transport::{BlockingClient, Transport};
pub use types::{is_truthy, Record};
