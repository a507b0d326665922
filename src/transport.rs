//! HTTP transport for REDCap requests.
//!
//! Each call is one form-encoded POST to the configured host. There are no
//! retries: a failed request is returned to the caller as it happened.

use crate::payload::Payload;
use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use url::Url;

type CacheKey = (String, Payload);

/// Sends payloads and reads REDCap responses.
///
/// With memoization on, a JSON response is kept per host and payload and
/// returned for identical later calls until [`Transport::flush_cache`].
pub struct Transport {
    http_client: reqwest::Client,
    timeout: Option<Duration>,
    cache: Option<Mutex<HashMap<CacheKey, JsonValue>>>,
    log: AtomicBool,
}

impl Transport {
    pub fn new(http_client: reqwest::Client, cache: bool) -> Self {
        Self {
            http_client,
            timeout: None,
            cache: cache.then(|| Mutex::new(HashMap::new())),
            log: AtomicBool::new(false),
        }
    }

    /// Sets a per-request timeout. Without one reqwest's defaults apply.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn log_enabled(&self) -> bool {
        self.log.load(Ordering::Relaxed)
    }

    /// Turns payload and body logging on or off.
    pub fn set_log(&self, enabled: bool) {
        self.log.store(enabled, Ordering::Relaxed);
    }

    /// Empties the memo cache and returns how many entries were dropped.
    pub fn flush_cache(&self) -> usize {
        let Some(cache) = &self.cache else {
            return 0;
        };
        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        let flushed = cache.len();
        cache.clear();
        if self.log_enabled() {
            tracing::debug!(entries = flushed, "Flushed REDCap response cache");
        }
        flushed
    }

    /// Posts `payload` and parses the body as JSON.
    pub async fn post(&self, host: &str, payload: &Payload) -> Result<JsonValue> {
        if let Some(cached) = self.cached(host, payload) {
            tracing::debug!(
                host = %host,
                content = payload.get("content").unwrap_or_default(),
                "Serving REDCap response from cache"
            );
            return Ok(cached);
        }

        let parsed = self.post_uncached(host, payload).await?;
        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert((host.to_string(), payload.clone()), parsed.clone());
        }
        Ok(parsed)
    }

    /// Posts `payload` and parses the body as JSON, bypassing the memo cache.
    ///
    /// Imports go through here so a write is never answered from memory.
    pub async fn post_uncached(&self, host: &str, payload: &Payload) -> Result<JsonValue> {
        let (status, raw_body) = self.execute(host, payload).await?;
        match serde_json::from_str::<JsonValue>(&raw_body) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_response = %raw_body,
                    "Failed to deserialize response"
                );
                Err(Error::DeserializationFailed {
                    raw_response: raw_body,
                    serde_error: e.to_string(),
                    status,
                })
            }
        }
    }

    /// Posts `payload` and returns the body untouched.
    ///
    /// Used for endpoints such as `surveyLink` whose body is not JSON.
    /// Raw responses are never memoized.
    pub async fn post_raw(&self, host: &str, payload: &Payload) -> Result<String> {
        let (_, raw_body) = self.execute(host, payload).await?;
        Ok(raw_body)
    }

    fn cached(&self, host: &str, payload: &Payload) -> Option<JsonValue> {
        let cache = self.cache.as_ref()?;
        let cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(&(host.to_string(), payload.clone())).cloned()
    }

    /// Sends one request and returns the status and body of a 2xx response.
    async fn execute(&self, host: &str, payload: &Payload) -> Result<(StatusCode, String)> {
        let url = Url::parse(host)?;
        let start_time = Instant::now();

        tracing::debug!(
            url = %url,
            content = payload.get("content").unwrap_or_default(),
            "Executing REDCap request"
        );
        if self.log_enabled() {
            tracing::debug!(payload = ?payload, "REDCap POST to {}", url);
        }

        let mut request = self.http_client.post(url).form(payload.pairs());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers: HeaderMap = response.headers().clone();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "Received REDCap response"
        );

        if !status.is_success() {
            let raw_response = response.text().await.unwrap_or_default();

            if status.is_client_error() {
                tracing::error!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Client error (4xx)"
                );
            } else {
                tracing::warn!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Server error"
                );
            }

            return Err(Error::HttpError {
                status,
                raw_response,
                headers,
            });
        }

        let raw_body = response.text().await?;
        if self.log_enabled() {
            tracing::debug!(response = %raw_body, "REDCap response body");
        }
        Ok((status, raw_body))
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("timeout", &self.timeout)
            .field("cache", &self.cache_enabled())
            .field("log", &self.log_enabled())
            .finish()
    }
}
