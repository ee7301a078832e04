//! Slack request signature verification.
//!
//! Slack signs every request with
//! `v0=hex(HMAC-SHA256(secret, "v0:{timestamp}:{body}"))`, sent in
//! `X-Slack-Signature` next to `X-Slack-Request-Timestamp`.

use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

const VERSION: &str = "v0";
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Why a request was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("invalid request timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("request timestamp outside the accepted window")]
    Stale,

    #[error("signature mismatch")]
    Mismatch,

    #[error("unusable signing secret")]
    InvalidKey,
}

/// Verifies request signatures with the app's signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: SecretString,
    max_age: Duration,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"[REDACTED]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>, max_age: Duration) -> Self {
        Self {
            secret: SecretString::new(secret.into().into()),
            max_age,
        }
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::InvalidKey)?;
        mac.update(VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        Ok(mac)
    }

    /// Signature header value for `body` sent at `timestamp`.
    pub fn sign(&self, timestamp: i64, body: &[u8]) -> Result<String, SignatureError> {
        let digest = self.mac(&timestamp.to_string(), body)?.finalize().into_bytes();
        Ok(format!("{VERSION}={}", hex::encode(digest)))
    }

    /// Check a request's signature headers against its raw body.
    ///
    /// `now` is the current Unix time in seconds.
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        let timestamp = timestamp.ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;
        let signature = signature.ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;

        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_string()))?;
        if now.abs_diff(sent_at) > self.max_age.as_secs() {
            return Err(SignatureError::Stale);
        }

        let expected = signature
            .strip_prefix("v0=")
            .and_then(|hex_sig| hex::decode(hex_sig).ok())
            .ok_or(SignatureError::Mismatch)?;

        self.mac(timestamp.trim(), body)?
            .verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}

/// Middleware rejecting requests whose Slack signature does not verify.
///
/// The body is buffered to compute the HMAC and handed on unchanged.
pub async fn require_signature(
    State(verifier): State<std::sync::Arc<SignatureVerifier>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => return AppError::BadRequest(format!("unreadable body: {e}")).into_response(),
    };

    let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
    let now = chrono::Utc::now().timestamp();

    if let Err(e) = verifier.verify(header(TIMESTAMP_HEADER), header(SIGNATURE_HEADER), &bytes, now)
    {
        warn!(path = %parts.uri.path(), error = %e, "Rejected unsigned request");
        return AppError::Unauthorized(e.to_string()).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
