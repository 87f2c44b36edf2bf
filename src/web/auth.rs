//! Shared-secret and origin checks for the HTTP API.
//!
//! The key travels in the `x-api-key` header and is compared in constant
//! time. Submissions may alternatively be authorized by an allow-listed
//! `Origin`.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::config::AccessConfig;
use crate::error::SubmissionError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Access rules resolved from configuration.
#[derive(Clone, Default)]
pub struct AccessPolicy {
    api_key: Option<SecretString>,
    allowed_origins: Vec<String>,
    require_submission_api_key: bool,
}

impl AccessPolicy {
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            allowed_origins: config.allowed_origins.clone(),
            require_submission_api_key: config.require_submission_api_key,
        }
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    fn expected_key(&self) -> &str {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().trim())
            .unwrap_or_default()
    }

    /// Whether the request carries the configured key.
    fn has_valid_key(&self, headers: &HeaderMap) -> bool {
        keys_match(self.expected_key(), header_str(headers, API_KEY_HEADER))
    }

    /// Authorize a submission.
    ///
    /// A valid key always passes. Without one, the request is rejected when
    /// the key is mandatory; otherwise an allow-listed origin passes, and an
    /// unconfigured service accepts everyone.
    pub fn check_submission(&self, headers: &HeaderMap) -> Result<(), SubmissionError> {
        let expected = self.expected_key();
        if self.has_valid_key(headers) {
            return Ok(());
        }

        if self.require_submission_api_key && !expected.is_empty() {
            return Err(SubmissionError::unauthorized("Submission API key required."));
        }

        let origin = header_str(headers, "origin");
        if !origin.is_empty() && self.allowed_origins.iter().any(|o| o == origin) {
            return Ok(());
        }

        if expected.is_empty() && self.allowed_origins.is_empty() {
            return Ok(());
        }

        Err(SubmissionError::unauthorized(
            "Unauthorized submission origin or API key.",
        ))
    }

    /// Authorize an admin endpoint. A configured key is mandatory.
    pub fn check_admin(&self, headers: &HeaderMap) -> Result<(), SubmissionError> {
        if self.expected_key().is_empty() {
            return Err(SubmissionError::unauthorized(
                "API_KEY is required for this endpoint.",
            ));
        }
        if !self.has_valid_key(headers) {
            return Err(SubmissionError::unauthorized("Unauthorized API key."));
        }
        Ok(())
    }
}

/// Constant-time key comparison. Empty values never match.
pub fn keys_match(expected: &str, received: &str) -> bool {
    if expected.is_empty() || received.is_empty() {
        return false;
    }
    bool::from(expected.as_bytes().ct_eq(received.as_bytes()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default()
}

/// Client identity used for rate limiting.
///
/// One reverse proxy is trusted: the last `X-Forwarded-For` hop wins, then
/// the socket peer, then `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddress(pub String);

impl<S> FromRequestParts<S> for ClientAddress
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').map(str::trim).find(|hop| !hop.is_empty()))
            .map(str::to_string);

        let client = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        Ok(ClientAddress(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn policy(key: Option<&str>, origins: &[&str], require: bool) -> AccessPolicy {
        AccessPolicy::new(&AccessConfig {
            api_key: key.map(|k| SecretString::from(k.to_string())),
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            require_submission_api_key: require,
        })
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn message(result: Result<(), SubmissionError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn open_service_accepts_any_submission() {
        assert!(policy(None, &[], false).check_submission(&HeaderMap::new()).is_ok());
    }

    #[test]
    fn valid_key_passes_submission() {
        let p = policy(Some("secret"), &["https://app.example"], true);
        assert!(p.check_submission(&headers(&[("x-api-key", "secret")])).is_ok());
    }

    #[test]
    fn required_key_overrides_origin() {
        let p = policy(Some("secret"), &["https://app.example"], true);
        assert_eq!(
            message(p.check_submission(&headers(&[("origin", "https://app.example")]))),
            "Submission API key required."
        );
    }

    #[test]
    fn allowed_origin_passes_when_key_optional() {
        let p = policy(Some("secret"), &["https://app.example"], false);
        assert!(p
            .check_submission(&headers(&[("origin", "https://app.example")]))
            .is_ok());
        assert_eq!(
            message(p.check_submission(&headers(&[("origin", "https://evil.example")]))),
            "Unauthorized submission origin or API key."
        );
    }

    #[test]
    fn key_configured_without_origins_rejects_anonymous() {
        let p = policy(Some("secret"), &[], false);
        assert_eq!(
            message(p.check_submission(&HeaderMap::new())),
            "Unauthorized submission origin or API key."
        );
    }

    #[test]
    fn admin_requires_configured_key() {
        assert_eq!(
            message(policy(None, &[], false).check_admin(&headers(&[("x-api-key", "x")]))),
            "API_KEY is required for this endpoint."
        );
        let p = policy(Some("secret"), &[], false);
        assert_eq!(
            message(p.check_admin(&headers(&[("x-api-key", "wrong")]))),
            "Unauthorized API key."
        );
        assert!(p.check_admin(&headers(&[("x-api-key", " secret ")])).is_ok());
    }

    #[test]
    fn empty_keys_never_match() {
        assert!(!keys_match("", ""));
        assert!(!keys_match("abc", ""));
        assert!(!keys_match("abc", "abcd"));
        assert!(keys_match("abc", "abc"));
    }
}
