//! The network seam of the client.
//!
//! # Design
//! `RestClient` never talks to a socket itself. It hands an `HttpRequest` to
//! a `Transport` and gets back an `HttpResponse` with the body fully read,
//! whatever the status code. Tests substitute an in-memory transport; real
//! traffic goes through `UreqTransport`.

use std::fmt;

use tracing::{debug, trace};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};

/// Failure of the underlying network exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::TransportError(err.message)
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        TransportError::new(err.to_string())
    }
}

/// Executes one request synchronously.
///
/// Implementations must return 4xx/5xx responses as `Ok`; only failures to
/// obtain a response at all are `Err`. They are shared between threads, so
/// any internal state needs its own synchronization.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a pooled `ureq::Agent`.
///
/// Redirects are followed here rather than inside ureq: only 301, 302, 303,
/// 307 and 308 with a `Location` header are followed, and any other 3xx is
/// returned as an ordinary response. 301-303 continue as a bodiless `GET`,
/// 307 and 308 repeat the method and body.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    max_body_bytes: u64,
    max_redirects: u32,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("max_body_bytes", &self.max_body_bytes)
            .field("max_redirects", &self.max_redirects)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        // Status codes are classified by RestClient and redirects are
        // followed by `execute`, so ureq hands back every response as is.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            max_body_bytes: config.max_body_bytes,
            max_redirects: config.max_redirects,
        }
    }

    fn send_once(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &Headers,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, TransportError> {
        trace!(method = %method, url = %url, "executing request");

        let result = match method {
            HttpMethod::Get => with_headers(self.agent.get(url), headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), headers).call(),
            HttpMethod::Post => {
                let builder = with_headers(self.agent.post(url), headers);
                match body {
                    Some(bytes) => builder.send(bytes),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = with_headers(self.agent.put(url), headers);
                match body {
                    Some(bytes) => builder.send(bytes),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result?;

        let status = response.status();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
            .collect();
        // The body reader owns the connection; it goes back to the pool (or
        // is closed) when `response` drops, on success and error alike.
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()?;

        Ok(HttpResponse {
            status: status.as_u16(),
            // ureq does not expose the reason phrase the server sent.
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &Headers) -> ureq::RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

/// Where a response sends the client next, if it is a followed redirect.
fn redirect_target(response: &HttpResponse, current_url: &str) -> Result<Option<String>, TransportError> {
    if !matches!(response.status, 301 | 302 | 303 | 307 | 308) {
        return Ok(None);
    }
    let Some(location) = response.headers.get("location") else {
        return Ok(None);
    };
    let next = Url::parse(current_url)
        .and_then(|base| base.join(location))
        .map_err(|e| TransportError::new(format!("bad Location header {location:?}: {e}")))?;
    Ok(Some(next.to_string()))
}

/// Method and whether the body is resent for the hop after a redirect.
fn redirected_method(status: u16, method: HttpMethod) -> (HttpMethod, bool) {
    match status {
        307 | 308 => (method, true),
        _ => (HttpMethod::Get, false),
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut method = request.method;
        let mut url = request.url.clone();
        let mut body = request.body.as_deref();
        let mut followed = 0;

        loop {
            let response = self.send_once(method, &url, &request.headers, body)?;
            if self.max_redirects == 0 {
                return Ok(response);
            }
            let Some(next) = redirect_target(&response, &url)? else {
                return Ok(response);
            };
            if followed == self.max_redirects {
                return Err(TransportError::new(format!(
                    "stopped after {} redirects",
                    self.max_redirects
                )));
            }
            followed += 1;

            let (next_method, keep_body) = redirected_method(response.status, method);
            debug!(status = response.status, from = %url, to = %next, "following redirect");
            method = next_method;
            if !keep_body {
                body = None;
            }
            url = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, location: Option<&str>) -> HttpResponse {
        HttpResponse {
            status,
            status_text: String::new(),
            headers: location.into_iter().map(|l| ("Location", l)).collect(),
            body: Vec::new(),
        }
    }

    #[test]
    fn redirect_without_location_is_final() {
        for status in [301, 302, 303, 307, 308] {
            assert_eq!(redirect_target(&response(status, None), "http://h/a").unwrap(), None);
        }
    }

    #[test]
    fn unfollowed_statuses_are_final() {
        for status in [200, 300, 304, 305, 399] {
            assert_eq!(redirect_target(&response(status, Some("/b")), "http://h/a").unwrap(), None);
        }
    }

    #[test]
    fn location_resolves_against_current_url() {
        let next = redirect_target(&response(302, Some("../c?x=1")), "http://h/a/b/").unwrap();
        assert_eq!(next.as_deref(), Some("http://h/a/c?x=1"));

        let next = redirect_target(&response(308, Some("https://other/z")), "http://h/a").unwrap();
        assert_eq!(next.as_deref(), Some("https://other/z"));
    }

    #[test]
    fn see_other_switches_to_get_and_drops_body() {
        for status in [301, 302, 303] {
            assert_eq!(redirected_method(status, HttpMethod::Post), (HttpMethod::Get, false));
            assert_eq!(redirected_method(status, HttpMethod::Delete), (HttpMethod::Get, false));
        }
    }

    #[test]
    fn temporary_and_permanent_redirect_keep_method_and_body() {
        assert_eq!(redirected_method(307, HttpMethod::Put), (HttpMethod::Put, true));
        assert_eq!(redirected_method(308, HttpMethod::Post), (HttpMethod::Post, true));
    }
}
