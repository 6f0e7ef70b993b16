//! Bearer token verification
//!
//! Compact three-part tokens (`header.claims.signature`, base64url),
//! HMAC-SHA256 signed with a shared secret. Verification is a pure
//! function of the token, the secret and the current time; the expiry
//! claim is checked while decoding and re-checked on the decoded
//! timestamp.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    Expired,
    Malformed(String),
    UnsupportedScheme(String),
    InvalidClaims(String),
    Unknown(String),
}

/// Verified caller identity extracted from a token.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub subject: String,
    pub user_id: Option<u64>,
    pub role: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    exp: Option<i64>,
}

pub struct TokenVerifier {
    secret: Vec<u8>,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    pub fn verify(&self, raw: &str) -> Result<Identity, VerificationError> {
        self.verify_at(raw, Utc::now())
    }

    fn verify_at(&self, raw: &str, now: DateTime<Utc>) -> Result<Identity, VerificationError> {
        let mut parts = raw.split('.');
        let (header_b64, claims_b64, sig_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => {
                    return Err(VerificationError::Malformed(
                        "token must have three parts".to_string(),
                    ))
                }
            };

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;
        let header: Header = serde_json::from_slice(&header_bytes)
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;
        if header.alg != "HS256" {
            return Err(VerificationError::UnsupportedScheme(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            return Err(VerificationError::Malformed("signature mismatch".to_string()));
        }

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;
        let claims: Claims = serde_json::from_slice(&claims_bytes)
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;

        let subject = match claims.sub {
            Some(s) if !s.is_empty() => s,
            _ => {
                return Err(VerificationError::InvalidClaims(
                    "subject claim is empty".to_string(),
                ))
            }
        };
        let iat = claims.iat.ok_or_else(|| {
            VerificationError::InvalidClaims("issued-at claim is missing".to_string())
        })?;
        let exp = claims.exp.ok_or_else(|| {
            VerificationError::InvalidClaims("expiry claim is missing".to_string())
        })?;

        if exp <= now.timestamp() {
            return Err(VerificationError::Expired);
        }

        let issued_at = Utc.timestamp_opt(iat, 0).single().ok_or_else(|| {
            VerificationError::InvalidClaims("issued-at claim is out of range".to_string())
        })?;
        let expires_at = Utc.timestamp_opt(exp, 0).single().ok_or_else(|| {
            VerificationError::InvalidClaims("expiry claim is out of range".to_string())
        })?;

        // Second expiry check, on the decoded timestamp the identity
        // will carry.
        if expires_at <= now {
            return Err(VerificationError::Expired);
        }

        Ok(Identity {
            subject,
            user_id: claims.user_id,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }

    /// Sign a token with this verifier's secret. Used by the token CLI
    /// and by tests; the service itself only verifies.
    pub fn issue(
        &self,
        subject: &str,
        user_id: Option<u64>,
        role: Option<&str>,
        ttl_secs: i64,
    ) -> Result<String, VerificationError> {
        let now = Utc::now().timestamp();
        let header = Header {
            alg: "HS256".to_string(),
            typ: Some("JWT".to_string()),
        };
        let claims = Claims {
            sub: Some(subject.to_string()),
            user_id,
            role: role.map(str::to_string),
            iat: Some(now),
            exp: Some(now + ttl_secs),
        };

        let header_json = serde_json::to_vec(&header)
            .map_err(|e| VerificationError::Unknown(e.to_string()))?;
        let claims_json = serde_json::to_vec(&claims)
            .map_err(|e| VerificationError::Unknown(e.to_string()))?;
        let header_b64 = URL_SAFE_NO_PAD.encode(header_json);
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims_json);

        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}.{}", header_b64, claims_b64, signature))
    }

    fn mac(&self) -> Result<HmacSha256, VerificationError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| VerificationError::Unknown(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(b"unit-test-secret")
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let verifier = verifier();
        let token = verifier
            .issue("alice", Some(42), Some("ADMIN"), 3600)
            .unwrap();

        let identity = verifier.verify(&token).unwrap();
        assert_eq!(identity.subject, "alice");
        assert_eq!(identity.user_id, Some(42));
        assert_eq!(identity.role.as_deref(), Some("ADMIN"));
        assert!(identity.expires_at > identity.issued_at);
    }

    #[test]
    fn test_optional_claims_absent() {
        let verifier = verifier();
        let token = verifier.issue("bob", None, None, 3600).unwrap();

        let identity = verifier.verify(&token).unwrap();
        assert_eq!(identity.user_id, None);
        assert_eq!(identity.role, None);
    }

    #[test]
    fn test_expired_token() {
        let verifier = verifier();
        let token = verifier.issue("alice", None, None, -60).unwrap();
        assert_eq!(verifier.verify(&token), Err(VerificationError::Expired));
    }

    #[test]
    fn test_expiry_checked_against_passed_time() {
        let verifier = verifier();
        let token = verifier.issue("alice", None, None, 60).unwrap();

        let later = Utc::now() + Duration::seconds(120);
        assert_eq!(
            verifier.verify_at(&token, later),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = verifier().issue("alice", None, None, 3600).unwrap();
        let other = TokenVerifier::new(b"another-secret");
        assert!(matches!(
            other.verify(&token),
            Err(VerificationError::Malformed(_))
        ));
    }

    #[test]
    fn test_tampered_claims_are_rejected() {
        let verifier = verifier();
        let token = verifier.issue("alice", Some(1), None, 3600).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD
            .encode(r#"{"sub":"mallory","iat":0,"exp":9999999999}"#);
        parts[1] = &forged;
        let forged_token = parts.join(".");

        assert!(matches!(
            verifier.verify(&forged_token),
            Err(VerificationError::Malformed(_))
        ));
    }

    #[test]
    fn test_unsupported_scheme() {
        let verifier = verifier();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
        let claims = URL_SAFE_NO_PAD.encode(r#"{"sub":"alice","iat":0,"exp":9999999999}"#);
        let token = format!("{}.{}.{}", header, claims, URL_SAFE_NO_PAD.encode("sig"));

        assert_eq!(
            verifier.verify(&token),
            Err(VerificationError::UnsupportedScheme("none".to_string()))
        );
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        let verifier = verifier();
        let token = verifier.issue("", None, None, 3600).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(VerificationError::InvalidClaims(_))
        ));
    }

    #[test]
    fn test_garbage_tokens_are_malformed() {
        let verifier = verifier();
        for raw in ["", "abc", "a.b", "a.b.c.d", "not base64 at all.!!.??"] {
            assert!(
                matches!(verifier.verify(raw), Err(VerificationError::Malformed(_))),
                "expected malformed for {:?}",
                raw
            );
        }
    }
}
