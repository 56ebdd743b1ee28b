//! Caller identity extraction
//!
//! Identity is asserted by the API gateway in a base64-encoded JSON header;
//! verification happened upstream. This module only decodes the claim.

use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::utils::errors::{HishoError, Result};

pub const USERINFO_HEADER: &str = "x-apigateway-api-userinfo";

/// Extract the caller's user id from the gateway userinfo header
pub fn user_id_from_headers(headers: &HeaderMap) -> Result<String> {
    let raw = headers
        .get(USERINFO_HEADER)
        .ok_or_else(|| HishoError::Authentication(format!("Missing {USERINFO_HEADER} header")))?;

    let decoded = STANDARD
        .decode(raw.as_bytes())
        .map_err(|e| HishoError::Authentication(format!("Failed to decode userinfo: {e}")))?;

    let claims: serde_json::Value = serde_json::from_slice(&decoded)
        .map_err(|e| HishoError::Authentication(format!("Failed to parse userinfo: {e}")))?;

    claims
        .get("user_id")
        .or_else(|| claims.get("sub"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| HishoError::Authentication("userinfo carries no user id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(claims: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            USERINFO_HEADER,
            HeaderValue::from_str(&STANDARD.encode(claims)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_user_id_claim() {
        let headers = headers_with(r#"{"user_id": "abc123"}"#);
        assert_eq!(user_id_from_headers(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_sub_fallback() {
        let headers = headers_with(r#"{"sub": "def456"}"#);
        assert_eq!(user_id_from_headers(&headers).unwrap(), "def456");
    }

    #[test]
    fn test_missing_header_rejected() {
        assert!(user_id_from_headers(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_bad_base64_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(USERINFO_HEADER, HeaderValue::from_static("!!not-base64!!"));
        assert!(user_id_from_headers(&headers).is_err());
    }

    #[test]
    fn test_claims_without_id_rejected() {
        let headers = headers_with(r#"{"email": "a@example.com"}"#);
        assert!(user_id_from_headers(&headers).is_err());
    }
}
