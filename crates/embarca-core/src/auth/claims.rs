//! Unverified access-token claim decoding.
//!
//! The client only ever decodes tokens it previously received from the
//! backend at login or refresh time, so the payload is read without
//! signature verification. That trust boundary is deliberate: no signing
//! key ships with the app and expiry is enforced by the backend anyway.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use serde::Deserialize;

use crate::api::ApiError;

/// Claims carried by an access token.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub data: serde_json::Value,
    /// Expiration, seconds since epoch.
    pub exp: i64,
}

impl TokenClaims {
    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

/// Decode the payload segment of a JWT without verifying the signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ApiError> {
    let mut segments = token.splitn(3, '.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_header), Some(payload)) => payload,
        _ => {
            return Err(ApiError::InvalidResponse(
                "access token has fewer than 2 segments".to_string(),
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| ApiError::InvalidResponse(format!("access token payload base64: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::InvalidResponse(format!("access token claims: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{}.{}.sig", header, body)
    }

    #[test]
    fn test_decodes_claims() {
        let token = make_token(&serde_json::json!({
            "id": 7,
            "email": "agent@embarca.app",
            "level": 2,
            "data": { "name": "Ana" },
            "exp": 4102444800i64
        }));

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.email, "agent@embarca.app");
        assert_eq!(claims.level, 2);
        assert_eq!(claims.data["name"], "Ana");
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_expired_claims() {
        let token = make_token(&serde_json::json!({
            "id": 1,
            "email": "agent@embarca.app",
            "exp": 1000
        }));

        let claims = decode_claims(&token).unwrap();
        assert!(claims.is_expired());
    }

    #[test]
    fn test_rejects_malformed_token() {
        assert!(decode_claims("not-a-token").is_err());
        assert!(decode_claims("one.!!!notbase64!!!.sig").is_err());

        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let body = URL_SAFE_NO_PAD.encode(b"not json");
        assert!(decode_claims(&format!("{}.{}.sig", header, body)).is_err());
    }
}
