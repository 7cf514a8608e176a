//! Generic JSON HTTP client for the task API.
//!
//! # Design
//! `HttpClient` owns the base URL, the timeout and the default headers. Each
//! verb is split the same way: `build_request` produces an `HttpRequest`,
//! the `Transport` executes it under the client's timeout, and
//! `parse_response` turns the `HttpResponse` into a decoded body or an
//! `HttpError`. Building and parsing never touch the network.

use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::HttpError;
use crate::http::{remove_header, set_header, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError, UreqTransport};

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

const AUTHORIZATION: &str = "Authorization";

/// JSON client bound to one base URL.
pub struct HttpClient<T = UreqTransport> {
    base_url: String,
    timeout: Duration,
    headers: RwLock<Vec<(String, String)>>,
    transport: T,
}

impl HttpClient<UreqTransport> {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self::with_transport(base_url, timeout, UreqTransport::new(timeout))
    }

    /// Client with the configured base URL, timeout, extra headers and
    /// optional bearer token.
    pub fn from_config(config: &ClientConfig) -> Self {
        let client = Self::with_timeout(&config.base_url, config.timeout)
            .with_headers(config.headers.iter().cloned());
        if let Some(token) = &config.auth_token {
            client.set_auth_token(token);
        }
        client
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(base_url: &str, timeout: Duration, transport: T) -> Self {
        let headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            headers: RwLock::new(headers),
            transport,
        }
    }

    /// Merge per-instance headers over the defaults. Names match
    /// case-insensitively and later values win.
    pub fn with_headers(self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        {
            let mut current = self.headers.write();
            for (name, value) in headers {
                set_header(&mut current, &name, value);
            }
        }
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Snapshot of the headers attached to every request.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.headers.read().clone()
    }

    /// Attach `Authorization: Bearer <token>` to all subsequent requests.
    pub fn set_auth_token(&self, token: &str) {
        set_header(&mut self.headers.write(), AUTHORIZATION, format!("Bearer {token}"));
    }

    pub fn clear_auth_token(&self) {
        remove_header(&mut self.headers.write(), AUTHORIZATION);
    }

    /// Join the base URL and a resource path, adding the leading slash when
    /// the path lacks one.
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, HttpError> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| HttpError::network(format!("failed to encode request body: {e}")))?;
        Ok(HttpRequest {
            method,
            url: self.build_url(path),
            headers: self.headers(),
            body,
        })
    }

    /// Execute a built request under the client timeout and decode the reply.
    pub async fn send<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R, HttpError> {
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, "sending request");

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.transport.execute(request)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Err(_) | Ok(Err(TransportError::TimedOut)) => {
                tracing::warn!(%method, %url, elapsed_ms, "request timed out");
                return Err(HttpError::timeout());
            }
            Ok(Err(TransportError::Io(message))) => {
                tracing::warn!(%method, %url, error = %message, "request failed before a response");
                return Err(HttpError::network(message));
            }
        };

        if response.is_success() {
            tracing::info!(%method, %url, status = response.status, elapsed_ms, "request completed");
        } else {
            tracing::warn!(%method, %url, status = response.status, elapsed_ms, "request rejected");
        }
        parse_response(response)
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, HttpError> {
        let request = self.build_request::<()>(HttpMethod::Get, path, None)?;
        self.send(request).await
    }

    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, HttpError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.build_request(HttpMethod::Post, path, Some(body))?;
        self.send(request).await
    }

    /// PUT with an optional body; the completion endpoint takes none.
    pub async fn put<B, R>(&self, path: &str, body: Option<&B>) -> Result<R, HttpError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.build_request(HttpMethod::Put, path, body)?;
        self.send(request).await
    }

    pub async fn patch<B, R>(&self, path: &str, body: &B) -> Result<R, HttpError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.build_request(HttpMethod::Patch, path, Some(body))?;
        self.send(request).await
    }

    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, HttpError> {
        let request = self.build_request::<()>(HttpMethod::Delete, path, None)?;
        self.send(request).await
    }
}

/// Map a response to its decoded body or an `HttpError`.
///
/// A success without a JSON body decodes an empty JSON object instead, so
/// `serde_json::Value` or any all-default struct works as a "no content"
/// target.
pub fn parse_response<R: DeserializeOwned>(response: HttpResponse) -> Result<R, HttpError> {
    if !response.is_success() {
        return Err(HttpError::new(error_message(&response), response.status));
    }

    if response.is_json() && !response.body.trim().is_empty() {
        serde_json::from_str(&response.body)
            .map_err(|e| HttpError::network(format!("failed to decode response body: {e}")))
    } else {
        serde_json::from_value(Value::Object(serde_json::Map::new()))
            .map_err(|e| HttpError::network(format!("failed to decode empty response: {e}")))
    }
}

/// Message for a non-2xx response.
///
/// JSON bodies contribute their `message` or `error` string field; other
/// bodies contribute their text. Otherwise the message is synthesized from
/// the status line.
pub fn error_message(response: &HttpResponse) -> String {
    let from_body = if response.is_json() {
        serde_json::from_str::<Value>(&response.body)
            .ok()
            .and_then(|body| {
                ["message", "error"].iter().find_map(|field| {
                    body.get(field)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
            })
    } else {
        Some(response.body.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    from_body.unwrap_or_else(|| {
        format!(
            "HTTP {}: {}",
            response.status,
            status_text(response.status)
        )
    })
}

fn status_text(status: u16) -> &'static str {
    ureq::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status")
}
