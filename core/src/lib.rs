//! Synchronous JSON REST client.
//!
//! # Overview
//! `RestClient` wraps a base URL and a `Transport`. Its verb methods (`get`,
//! `post`, `put`, `delete`) resolve the target URL, attach the JSON default
//! headers, encode payloads, run the request and return the raw response
//! body. Statuses in `[400, 600)` become `ApiError::HttpError`.
//!
//! # Design
//! - The client holds no mutable state and is `Send + Sync` whenever its
//!   transport is.
//! - The network is reached only through the `Transport` trait. The default
//!   `UreqTransport` is blocking; tests plug in an in-memory one.
//! - Logging goes through `tracing`; install a subscriber to see it.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;

pub use client::{parse_json, RestClient};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, TransportError, UreqTransport};
