//! Password-reset token issuance and validation.
//!
//! The raw token is high-entropy, shown to the user once, and never
//! persisted; the stored record carries only its hash, so a database read
//! alone cannot mint a valid reset. Delivery (email, display) belongs to an
//! external collaborator; this module's contract ends at the raw/hashed pair.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use rand::{RngCore, rngs::OsRng};

use super::password::{Credential, PasswordHasher};

const RESET_TOKEN_BYTES: usize = 32;

/// Hashed-at-rest reset state attached to a user record.
///
/// Exactly one record is active per user: each new request overwrites it,
/// and completion clears it.
#[derive(Clone, Debug)]
pub struct ResetRecord {
    pub token_hash: Credential,
    pub expires_at: DateTime<Utc>,
}

/// Generates single-use, time-limited password-reset tokens.
#[derive(Clone, Debug)]
pub struct ResetTokenIssuer {
    hasher: PasswordHasher,
    ttl_seconds: i64,
}

impl ResetTokenIssuer {
    #[must_use]
    pub fn new(hasher: PasswordHasher, ttl_seconds: i64) -> Self {
        Self {
            hasher,
            ttl_seconds,
        }
    }

    /// Generate a fresh raw token and its persistable record.
    ///
    /// # Errors
    ///
    /// Returns an error if random generation or hashing fails.
    pub fn issue(&self) -> Result<(String, ResetRecord)> {
        self.issue_at(Utc::now())
    }

    /// Generate a raw token and record with an explicit issue time.
    ///
    /// # Errors
    ///
    /// Returns an error if random generation or hashing fails.
    pub fn issue_at(&self, now: DateTime<Utc>) -> Result<(String, ResetRecord)> {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate reset token")?;
        let raw_token = Base64UrlUnpadded::encode_string(&bytes);
        let record = ResetRecord {
            token_hash: self.hasher.hash(&raw_token)?,
            expires_at: now + Duration::seconds(self.ttl_seconds),
        };
        Ok((raw_token, record))
    }

    /// True only for the exact raw token behind `record`, and only before
    /// its expiry. A matched but expired token is invalid; the caller should
    /// require reissuance, not retry.
    #[must_use]
    pub fn validate(&self, candidate: &str, record: &ResetRecord) -> bool {
        self.validate_at(candidate, record, Utc::now())
    }

    #[must_use]
    pub fn validate_at(&self, candidate: &str, record: &ResetRecord, now: DateTime<Utc>) -> bool {
        self.hasher.verify(candidate, &record.token_hash) && now < record.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> ResetTokenIssuer {
        ResetTokenIssuer::new(PasswordHasher::new().with_work_factor(1), 3600)
    }

    #[test]
    fn issue_and_validate_round_trip() -> Result<()> {
        let issuer = issuer();
        let now = Utc::now();
        let (raw, record) = issuer.issue_at(now)?;

        assert!(issuer.validate_at(&raw, &record, now));
        assert!(!issuer.validate_at("some-other-token", &record, now));
        Ok(())
    }

    #[test]
    fn raw_token_has_expected_entropy_and_is_not_stored() -> Result<()> {
        let issuer = issuer();
        let (raw, record) = issuer.issue()?;

        let decoded = Base64UrlUnpadded::decode_vec(&raw).expect("base64url token");
        assert_eq!(decoded.len(), RESET_TOKEN_BYTES);
        // Only the hash is kept, never the raw value.
        assert!(!record.token_hash.as_str().contains(&raw));
        Ok(())
    }

    #[test]
    fn expired_token_invalid_even_when_correct() -> Result<()> {
        let issuer = issuer();
        let now = Utc::now();
        let (raw, record) = issuer.issue_at(now)?;

        let one_tick_before = record.expires_at - Duration::seconds(1);
        assert!(issuer.validate_at(&raw, &record, one_tick_before));
        // Boundary is exclusive: at the expiry instant the token is dead.
        assert!(!issuer.validate_at(&raw, &record, record.expires_at));
        assert!(!issuer.validate_at(&raw, &record, record.expires_at + Duration::hours(1)));
        Ok(())
    }

    #[test]
    fn tokens_are_single_issue_unique() -> Result<()> {
        let issuer = issuer();
        let (first, first_record) = issuer.issue()?;
        let (second, second_record) = issuer.issue()?;

        assert_ne!(first, second);
        // Each raw token only matches its own record.
        assert!(!issuer.validate(&first, &second_record));
        assert!(!issuer.validate(&second, &first_record));
        Ok(())
    }
}
