//! Password hashing and verification.
//!
//! Passwords and reset tokens are Argon2id-hashed with a per-call random salt
//! and stored as PHC strings. Verification recomputes from the parameters
//! embedded in the stored string and compares in constant time.

use anyhow::Result;
use argon2::{
    Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _,
    password_hash::{SaltString, rand_core::OsRng},
};
use std::fmt;

/// One-way hashed representation of a plaintext secret (PHC string).
///
/// Never round-trips to plaintext; only [`PasswordHasher::verify`] consumes it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The hash is not a secret, but full PHC strings are noisy in logs.
        let prefix = self.0.get(..12).unwrap_or(&self.0);
        write!(f, "Credential({prefix}...)")
    }
}

/// Argon2id hasher with a tunable work factor.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Scale the time cost (iterations). Memory and parallelism keep the
    /// Argon2id defaults; a factor of 0 is clamped to 1.
    #[must_use]
    pub fn with_work_factor(mut self, factor: u32) -> Self {
        self.params = Params::new(
            Params::DEFAULT_M_COST,
            factor.max(1),
            Params::DEFAULT_P_COST,
            None,
        )
        .unwrap_or_default();
        self
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash a plaintext with a fresh random salt.
    ///
    /// Two calls on the same plaintext yield different credentials; both
    /// verify.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying hash computation fails.
    pub fn hash(&self, plaintext: &str) -> Result<Credential> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| anyhow::anyhow!("failed to hash password"))?;
        Ok(Credential(hash.to_string()))
    }

    /// Verify a plaintext against a stored credential.
    ///
    /// A malformed or corrupted credential verifies as `false`, never as a
    /// distinct error, so callers cannot tell it apart from a wrong password.
    #[must_use]
    pub fn verify(&self, plaintext: &str, credential: &Credential) -> bool {
        match PasswordHash::new(credential.as_str()) {
            Ok(parsed) => self
                .argon2()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Validate password strength for signup and reset.
///
/// # Errors
///
/// Returns a message describing the first unmet requirement.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }
    if !password.chars().any(char::is_uppercase) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(char::is_lowercase) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }
    Ok(())
}
