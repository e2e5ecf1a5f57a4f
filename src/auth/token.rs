//! Session token issuance and verification (HS256 JWT).
//!
//! Tokens are self-contained: three unpadded base64url segments
//! (`header.payload.signature`) signed with a process-wide symmetric secret.
//! Validity is purely a function of the signature and the embedded expiry, so
//! verification never touches the persistence collaborator.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Minimal identity data embedded in a signed token. Contains no secrets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    #[serde(rename = "sub")]
    pub user_id: String,
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub tier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenPayload {
    #[serde(flatten)]
    claims: SessionClaims,
    iat: i64,
    exp: i64,
}

/// Why a token was rejected. The reason stays inside the subsystem for
/// logging; callers observe one coarse "invalid" outcome.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid token ttl")]
    InvalidTtl,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Issues and verifies HS256 session tokens with one symmetric secret.
///
/// The secret is an explicitly constructed configuration value, loaded once
/// at startup; it must stay byte-stable across restarts within a deployment
/// or every standing session invalidates.
#[derive(Clone)]
pub struct TokenCodec {
    secret: SecretString,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }

    /// Create a signed session token valid for `ttl_seconds` from now.
    ///
    /// # Errors
    ///
    /// Returns an error if the TTL is not positive or encoding/signing fails.
    pub fn issue(&self, claims: &SessionClaims, ttl_seconds: i64) -> Result<String, TokenError> {
        self.issue_at(claims, ttl_seconds, Utc::now().timestamp())
    }

    /// Create a signed session token as of an explicit issue time.
    ///
    /// # Errors
    ///
    /// Returns an error if the TTL is not positive or encoding/signing fails.
    pub fn issue_at(
        &self,
        claims: &SessionClaims,
        ttl_seconds: i64,
        now_unix_seconds: i64,
    ) -> Result<String, TokenError> {
        if ttl_seconds <= 0 {
            return Err(TokenError::InvalidTtl);
        }
        let payload = TokenPayload {
            claims: claims.clone(),
            iat: now_unix_seconds,
            exp: now_unix_seconds + ttl_seconds,
        };
        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let payload_b64 = b64e_json(&payload)?;
        let signing_input = format!("{header_b64}.{payload_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify a session token and return its decoded claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, the signature mismatches,
    /// or the token has expired. Callers outside this subsystem must treat
    /// every failure identically.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a session token against an explicit current time.
    ///
    /// Expiry is exclusive: a token is valid only while `now < exp`.
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::verify`].
    pub fn verify_at(
        &self,
        token: &str,
        now_unix_seconds: i64,
    ) -> Result<SessionClaims, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let payload_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        if parts.next().is_some() {
            return Err(TokenError::TokenFormat);
        }

        // Signature first, so nothing attacker-controlled is parsed before
        // the MAC check. verify_slice compares in constant time.
        let signing_input = format!("{header_b64}.{payload_b64}");
        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let payload: TokenPayload = b64d_json(payload_b64)?;
        if payload.exp <= now_unix_seconds {
            return Err(TokenError::Expired);
        }

        Ok(payload.claims)
    }
}
