//! Error types for the REST client.
//!
//! # Design
//! Every failure is handed straight back to the caller; nothing is retried.
//! `HttpError` carries only the status line. The response body of a failed
//! call is dropped, so callers that need it must talk to the transport
//! directly.

use std::fmt;

/// Errors returned by `RestClient` operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Neither the supplied path nor the base URL could be parsed.
    InvalidUrl(String),

    /// A header name or value is not valid HTTP syntax.
    InvalidHeader(String),

    /// The server answered with a status in `[400, 600)`.
    ///
    /// `status_text` is the standard reason phrase for `status`, not the
    /// phrase the server sent; codes without one (e.g. 599) get an empty
    /// string.
    HttpError { status: u16, status_text: String },

    /// The transport failed before a response arrived (DNS, connect, TLS,
    /// timeout, broken body stream).
    TransportError(String),

    /// The request payload could not be serialized to JSON.
    SerializationError(String),

    /// A response body could not be decoded by `parse_json`.
    DeserializationError(String),
}

impl ApiError {
    /// Status code of an `HttpError`, `None` for every other variant.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidUrl(msg) => write!(f, "invalid URL: {msg}"),
            ApiError::InvalidHeader(msg) => write!(f, "invalid header: {msg}"),
            ApiError::HttpError { status, status_text } => {
                if status_text.is_empty() {
                    write!(f, "HTTP status {status}")
                } else {
                    write!(f, "HTTP status {status} {status_text}")
                }
            }
            ApiError::TransportError(msg) => write!(f, "transport failed: {msg}"),
            ApiError::SerializationError(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            ApiError::DeserializationError(msg) => {
                write!(f, "deserialization failed: {msg}")
            }
        }
    }
}

impl std::error::Error for ApiError {}
