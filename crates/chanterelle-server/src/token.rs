//! Signed session tokens.
//!
//! Format: `v1.<base64url(claims json)>.<base64url(hmac-sha256)>`. The MAC
//! covers the encoded payload part so the claims never need re-serializing
//! to verify.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION_V1: &str = "v1";
const MAX_TOKEN_LEN: usize = 2048;

/// Why a token was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("unsupported token version")]
    UnsupportedVersion,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token payload is unreadable")]
    InvalidPayload,

    #[error("token expired")]
    Expired,

    #[error("signing key rejected: {0}")]
    Key(String),
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// The admin identifier the token was issued to
    pub sub: String,
    /// Issued at, seconds since epoch
    pub iat: i64,
    /// Expires at, seconds since epoch
    pub exp: i64,
}

impl SessionClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens with a shared HMAC key.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: SecretString,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` valid from now.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let ttl = chrono::Duration::from_std(self.ttl).map_err(|_| TokenError::InvalidPayload)?;
        let expires_at = now + ttl;
        let claims = SessionClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let payload = serde_json::to_vec(&claims).map_err(|_| TokenError::InvalidPayload)?;
        let payload_part = URL_SAFE_NO_PAD.encode(payload);
        let sig_part = URL_SAFE_NO_PAD.encode(self.sign(&payload_part)?);

        Ok(IssuedToken {
            token: format!("{}.{}.{}", TOKEN_VERSION_V1, payload_part, sig_part),
            expires_at: claims.expires_at(),
        })
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::Malformed);
        }

        let mut parts = token.split('.');
        let (Some(version), Some(payload_part), Some(sig_part), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        if version != TOKEN_VERSION_V1 {
            return Err(TokenError::UnsupportedVersion);
        }

        let sig = URL_SAFE_NO_PAD
            .decode(sig_part)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        mac.verify_slice(&sig).map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| TokenError::InvalidPayload)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::InvalidPayload)?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, payload_part: &str) -> Result<Vec<u8>, TokenError> {
        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| TokenError::Key(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(
            SecretString::new(secret.to_string()),
            Duration::from_secs(24 * 60 * 60),
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer("test-secret");
        let issued = issuer.issue("+18025551234").unwrap();

        assert!(issued.token.starts_with("v1."));
        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "+18025551234");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert_eq!(claims.expires_at(), issued.expires_at);
    }

    #[test]
    fn test_rejects_other_key() {
        let issued = issuer("key-a").issue("band@example.com").unwrap();
        assert_eq!(
            issuer("key-b").verify(&issued.token),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let issuer = issuer("test-secret");
        let issued = issuer.issue("+18025551234").unwrap();
        let parts: Vec<&str> = issued.token.split('.').collect();

        let forged_claims = SessionClaims {
            sub: "+19995550000".into(),
            iat: 0,
            exp: i64::MAX / 2,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(issuer.verify(&forged), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_rejects_expired() {
        let issuer = issuer("test-secret");
        let issued_at = Utc::now() - chrono::Duration::hours(25);
        let issued = issuer.issue_at("+18025551234", issued_at).unwrap();

        assert_eq!(issuer.verify(&issued.token), Err(TokenError::Expired));
        assert!(issuer
            .verify_at(&issued.token, issued_at + chrono::Duration::hours(1))
            .is_ok());
    }

    #[test]
    fn test_rejects_malformed_and_versions() {
        let issuer = issuer("test-secret");
        assert_eq!(issuer.verify("garbage"), Err(TokenError::Malformed));
        assert_eq!(issuer.verify("a.b.c.d"), Err(TokenError::Malformed));

        let issued = issuer.issue("+18025551234").unwrap();
        let v2 = issued.token.replacen("v1.", "v2.", 1);
        assert_eq!(issuer.verify(&v2), Err(TokenError::UnsupportedVersion));
    }
}
