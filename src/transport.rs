// src/transport.rs
//! HTTP transport and clock seams.
//!
//! Every outbound call in the crate goes through [`HttpTransport`], so sources
//! and the messenger can be exercised against in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{RelayError, Result};

/// Status + body of any completed HTTP exchange (including 4xx/5xx).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type Headers = Vec<(String, String)>;

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST raw bytes as-is. Signed calls rely on the body not being re-encoded.
    async fn post_bytes(&self, url: &str, headers: &Headers, body: Vec<u8>) -> Result<RawResponse>;

    async fn get(&self, url: &str, query: &[(&str, String)], headers: &Headers)
        -> Result<RawResponse>;

    /// `application/x-www-form-urlencoded` POST.
    async fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<RawResponse>;
}

/// Production transport over a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeouts(Duration::from_secs(5), Duration::from_secs(20))
    }

    pub fn with_timeouts(connect: Duration, request: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("offer-relay/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect)
            .timeout(request)
            .build()
            .map_err(|e| RelayError::TransportFailure(format!("build http client: {e}")))?;
        Ok(Self { http })
    }

    async fn finish(resp: reqwest::Response) -> Result<RawResponse> {
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| RelayError::TransportFailure(format!("read body: {e}")))?;
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_bytes(&self, url: &str, headers: &Headers, body: Vec<u8>) -> Result<RawResponse> {
        let mut req = self.http.post(url).body(body);
        for (k, v) in headers {
            req = req.header(k.as_str(), v.as_str());
        }
        let resp = req
            .send()
            .await
            .map_err(|e| RelayError::TransportFailure(e.to_string()))?;
        Self::finish(resp).await
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &Headers,
    ) -> Result<RawResponse> {
        let mut req = self.http.get(url).query(query);
        for (k, v) in headers {
            req = req.header(k.as_str(), v.as_str());
        }
        let resp = req
            .send()
            .await
            .map_err(|e| RelayError::TransportFailure(e.to_string()))?;
        Self::finish(resp).await
    }

    async fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<RawResponse> {
        let resp = self
            .http
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| RelayError::TransportFailure(e.to_string()))?;
        Self::finish(resp).await
    }
}

/// Source of "now" for request signing.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Frozen clock for deterministic signatures in tests and tools.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_status_is_still_a_response() {
        let r = RawResponse::new(503, "busy");
        assert!(!r.is_success());
        assert!(RawResponse::new(204, "").is_success());
    }
}
