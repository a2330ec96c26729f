// src/signing.rs
//! Signed requests for the affiliate GraphQL endpoint.
//!
//! Signature = sha256_hex(app_id ∥ timestamp ∥ canonical_body ∥ secret).
//! The upstream rejects timestamps outside a narrow window, so a failed
//! transport call is retried with the next offset from [`SKEW_OFFSETS_SECS`].

use std::fmt;
use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{RelayError, Result};
use crate::transport::{Clock, Headers, HttpTransport, RawResponse};

/// Timestamp offsets tried in order, relative to the local clock.
pub const SKEW_OFFSETS_SECS: [i64; 7] = [0, -1, 1, -2, 2, -3, 3];

/// How much of a signature may appear in logs.
const SIGNATURE_LOG_PREFIX: usize = 8;

#[derive(Clone)]
pub struct Credentials {
    pub app_id: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Bytes that are both hashed and sent. Compact JSON, map keys in sorted order.
pub fn canonical_body(body: &Value) -> Vec<u8> {
    // Serializing a `Value` cannot fail (string keys only).
    serde_json::to_vec(body).unwrap_or_default()
}

pub fn sign(creds: &Credentials, timestamp: i64, canonical: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(creds.app_id.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(canonical);
    hasher.update(creds.secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn authorization_header(creds: &Credentials, timestamp: i64, signature: &str) -> String {
    format!(
        "SHA256 Credential={}, Timestamp={}, Signature={}",
        creds.app_id, timestamp, signature
    )
}

pub struct SignedRequestBuilder {
    transport: Arc<dyn HttpTransport>,
    offsets: Vec<i64>,
}

impl SignedRequestBuilder {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            offsets: SKEW_OFFSETS_SECS.to_vec(),
        }
    }

    /// Sign `body` and POST it, walking the skew offsets until the transport
    /// returns. Any HTTP status is a completed attempt and is handed back.
    pub async fn sign_and_send(
        &self,
        endpoint: &str,
        body: &Value,
        creds: &Credentials,
        clock: &dyn Clock,
    ) -> Result<RawResponse> {
        let canonical = canonical_body(body);
        let now = clock.now_unix();
        let mut last_err = RelayError::TransportFailure("no timestamp offsets configured".into());

        for (attempt, offset) in self.offsets.iter().enumerate() {
            let ts = now + offset;
            let signature = sign(creds, ts, &canonical);
            let headers: Headers = vec![
                (
                    "Authorization".to_string(),
                    authorization_header(creds, ts, &signature),
                ),
                ("Content-Type".to_string(), "application/json".to_string()),
            ];

            tracing::debug!(
                endpoint,
                offset,
                sig_prefix = &signature[..SIGNATURE_LOG_PREFIX.min(signature.len())],
                "signed request"
            );

            match self
                .transport
                .post_bytes(endpoint, &headers, canonical.clone())
                .await
            {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    tracing::warn!(offset, attempt, error = %e, "signed request transport error");
                    if attempt > 0 {
                        counter!("relay_signed_retries_total").increment(1);
                    }
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}
