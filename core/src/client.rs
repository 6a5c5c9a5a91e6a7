//! Generic JSON REST client.
//!
//! # Design
//! `RestClient` holds a transport and the base URL and nothing else; it has
//! no mutable state, so one client can serve any number of threads. Every
//! verb method funnels into `request`, which is split into two pure halves
//! around the transport call:
//!
//! - `build_request` resolves the URL and lays the caller's headers over the
//!   JSON defaults.
//! - `check_status` turns 4xx/5xx into `ApiError::HttpError` and hands back
//!   the raw body otherwise.
//!
//! Response bodies are returned as bytes. Decoding is the caller's business;
//! `parse_json` is there for the common case.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use ureq::http::{HeaderName, HeaderValue, Uri};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

pub const ACCEPT: &str = "Accept";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const READ_ONLY_DB: &str = "Read-Only-DB";
pub const APPLICATION_JSON: &str = "application/json";

/// Synchronous REST client bound to one base URL.
///
/// The base URL is not validated until a relative path has to be resolved
/// against it.
#[derive(Debug, Clone)]
pub struct RestClient<T = UreqTransport> {
    transport: T,
    base_url: String,
}

impl RestClient<UreqTransport> {
    pub fn new(base_url: &str) -> Self {
        Self::with_config(base_url, &ClientConfig::default())
    }

    pub fn with_config(base_url: &str, config: &ClientConfig) -> Self {
        Self::with_transport(base_url, UreqTransport::new(config))
    }
}

impl<T: Transport> RestClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Effective URL for `path_or_url`.
    ///
    /// An absolute URL with a host is returned exactly as given. Anything
    /// else is resolved against the base URL as an RFC 3986 reference. The
    /// result must also be a valid request URI, so an absolute URL with
    /// characters that need escaping (spaces, say) is rejected rather than
    /// rewritten.
    pub fn resolve(&self, path_or_url: &str) -> Result<String, ApiError> {
        let resolved = match Url::parse(path_or_url) {
            Ok(url) if url.has_host() => path_or_url.to_string(),
            _ => {
                let base = Url::parse(&self.base_url)
                    .map_err(|e| ApiError::InvalidUrl(format!("base URL {:?}: {e}", self.base_url)))?;
                base.join(path_or_url)
                    .map_err(|e| ApiError::InvalidUrl(format!("{path_or_url:?}: {e}")))?
                    .to_string()
            }
        };
        resolved
            .parse::<Uri>()
            .map_err(|e| ApiError::InvalidUrl(format!("{resolved:?}: {e}")))?;
        Ok(resolved)
    }

    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Vec<u8>>,
        extra_headers: &Headers,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.resolve(path)?;
        let mut headers = default_headers();
        headers.extend_from(extra_headers);
        validate_headers(&headers)?;
        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Send one request and return the response body of a non-error status.
    #[instrument(level = "debug", skip_all, fields(method = %method, path = %path))]
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Vec<u8>>,
        extra_headers: &Headers,
    ) -> Result<Vec<u8>, ApiError> {
        let request = self.build_request(method, path, body, extra_headers)?;
        let response = self.transport.execute(&request).map_err(|err| {
            warn!(url = %request.url, error = %err, "transport failed");
            ApiError::from(err)
        })?;
        debug!(status = response.status, url = %request.url, "response received");
        check_status(response)
    }

    /// `GET path`. With `read_only` false the request carries
    /// `Read-Only-DB: false`.
    pub fn get(&self, path: &str, read_only: bool) -> Result<Vec<u8>, ApiError> {
        let mut headers = Headers::new();
        if !read_only {
            headers.set(READ_ONLY_DB, "false");
        }
        self.request(HttpMethod::Get, path, None, &headers)
    }

    /// `POST path` with `payload` encoded as JSON.
    pub fn post<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<Vec<u8>, ApiError> {
        let body = encode_json(payload)?;
        self.request(HttpMethod::Post, path, Some(body), &Headers::new())
    }

    /// `PUT path` with `payload` encoded as JSON.
    pub fn put<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<Vec<u8>, ApiError> {
        let body = encode_json(payload)?;
        self.request(HttpMethod::Put, path, Some(body), &Headers::new())
    }

    pub fn delete(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        self.request(HttpMethod::Delete, path, None, &Headers::new())
    }
}

/// Decode a response body returned by one of the verb methods.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn default_headers() -> Headers {
    let mut headers = Headers::new();
    headers.set(ACCEPT, APPLICATION_JSON);
    headers.set(CONTENT_TYPE, APPLICATION_JSON);
    headers
}

fn validate_headers(headers: &Headers) -> Result<(), ApiError> {
    for (name, value) in headers.iter() {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::InvalidHeader(format!("name {name:?}: {e}")))?;
        HeaderValue::from_str(value)
            .map_err(|e| ApiError::InvalidHeader(format!("value of {name:?}: {e}")))?;
    }
    Ok(())
}

fn encode_json<P: Serialize + ?Sized>(payload: &P) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(payload).map_err(|e| ApiError::SerializationError(e.to_string()))
}

/// 4xx and 5xx are failures; every other status yields the body unchanged.
fn check_status(response: HttpResponse) -> Result<Vec<u8>, ApiError> {
    if (400..600).contains(&response.status) {
        warn!(status = response.status, status_text = %response.status_text, "request rejected");
        return Err(ApiError::HttpError {
            status: response.status,
            status_text: response.status_text,
        });
    }
    Ok(response.body)
}
