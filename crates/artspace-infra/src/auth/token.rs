//! HMAC-SHA256 signed access tokens.
//!
//! Token format: `base64url(claims JSON) "." base64url(HMAC-SHA256(secret, payload))`,
//! both parts without padding. Claims carry the caller's user id under `sub`
//! and an expiry (unix seconds) under `exp`.
//!
//! Verification uses constant-time comparison (`Mac::verify_slice`) and
//! yields the verified claims as a [`SecurityContext`]. Whether `sub` is a
//! valid user id is decided later by identity resolution, not here.

use std::collections::HashMap;

use artspace_types::chat::UserId;
use artspace_types::error::AuthError;
use artspace_types::identity::{EXPIRY_CLAIM, NAME_IDENTIFIER_CLAIM, SecurityContext};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies access tokens with a shared secret.
pub struct TokenAuthority {
    secret: Vec<u8>,
}

impl TokenAuthority {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Mint a token for `user_id` valid for `ttl`.
    pub fn issue(&self, user_id: UserId, ttl: Duration) -> Result<String, AuthError> {
        let mut claims = serde_json::Map::new();
        claims.insert(NAME_IDENTIFIER_CLAIM.to_string(), Value::String(user_id.to_string()));
        self.issue_claims(claims, Utc::now() + ttl)
    }

    /// Mint a token carrying arbitrary claims plus `exp`.
    pub fn issue_claims(
        &self,
        mut claims: serde_json::Map<String, Value>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        claims.insert(EXPIRY_CLAIM.to_string(), Value::from(expires_at.timestamp()));

        let json = serde_json::to_vec(&Value::Object(claims)).map_err(|_| AuthError::Malformed)?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes())?);

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<SecurityContext, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against an explicit clock.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SecurityContext, AuthError> {
        let (payload, signature) = token.trim().split_once('.').ok_or(AuthError::Malformed)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: serde_json::Map<String, Value> =
            serde_json::from_slice(&json).map_err(|_| AuthError::Malformed)?;

        let expires_at = claims
            .get(EXPIRY_CLAIM)
            .and_then(Value::as_i64)
            .ok_or(AuthError::Malformed)?;
        if now.timestamp() >= expires_at {
            return Err(AuthError::Expired);
        }

        let claims: HashMap<String, String> = claims
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect();

        Ok(SecurityContext::from_claims(claims))
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority() -> TokenAuthority {
        TokenAuthority::new(b"test-secret".to_vec())
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let auth = authority();
        let token = auth.issue(UserId(42), Duration::hours(1)).unwrap();

        let ctx = auth.verify(&token).unwrap();
        assert_eq!(ctx.claim(NAME_IDENTIFIER_CLAIM), Some("42"));
        assert!(ctx.claim(EXPIRY_CLAIM).is_some());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = authority().issue(UserId(1), Duration::hours(1)).unwrap();
        let other = TokenAuthority::new(b"another-secret".to_vec());
        assert!(matches!(other.verify(&token), Err(AuthError::BadSignature)));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let auth = authority();
        let token = auth.issue(UserId(1), Duration::hours(1)).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged_claims = URL_SAFE_NO_PAD.encode(br#"{"sub":"2","exp":9999999999}"#);
        let forged = format!("{forged_claims}.{signature}");
        assert!(matches!(auth.verify(&forged), Err(AuthError::BadSignature)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = authority();
        let token = auth.issue(UserId(1), Duration::minutes(5)).unwrap();
        let later = Utc::now() + Duration::minutes(10);
        assert!(matches!(auth.verify_at(&token, later), Err(AuthError::Expired)));
    }

    #[test]
    fn garbage_is_malformed() {
        let auth = authority();
        assert!(matches!(auth.verify("not-a-token"), Err(AuthError::Malformed)));
        assert!(matches!(auth.verify("abc.!!!"), Err(AuthError::Malformed)));
    }

    #[test]
    fn non_numeric_subject_survives_verification() {
        // Verification only checks the signature; identity resolution rejects it later.
        let auth = authority();
        let mut claims = serde_json::Map::new();
        claims.insert("sub".to_string(), Value::String("alice".to_string()));
        let token = auth
            .issue_claims(claims, Utc::now() + Duration::hours(1))
            .unwrap();

        let ctx = auth.verify(&token).unwrap();
        assert_eq!(ctx.claim(NAME_IDENTIFIER_CLAIM), Some("alice"));
    }
}
