//! Auth configuration and constructed component state.
//!
//! Configuration is assembled once at startup and validated before any
//! request is served: running with a missing or weak signing secret is a
//! fatal configuration error in production, not a degraded mode.

use secrecy::{ExposeSecret, SecretString};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use super::cookie::SessionCookieStore;
use super::password::PasswordHasher;
use super::reset::ResetTokenIssuer;
use super::resolver::SessionResolver;
use super::token::TokenCodec;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_RESET_TTL_SECONDS: i64 = 60 * 60;
const MIN_SECRET_BYTES: usize = 32;

/// Well-known development fallback. Rejected outright in production.
pub const DEV_SIGNING_SECRET: &str = "dossier-dev-secret-do-not-use-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("signing secret is not set")]
    MissingSecret,
    #[error("signing secret must be at least {MIN_SECRET_BYTES} bytes in production")]
    WeakSecret,
    #[error("development fallback signing secret is not allowed in production")]
    FallbackSecret,
    #[error("invalid ttl: {0}")]
    InvalidTtl(String),
    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

/// Parse a TTL string like `7d`, `12h`, `30m`, `45s`, or bare seconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidTtl` for empty, non-numeric, or non-positive
/// input.
pub fn parse_ttl(input: &str) -> Result<i64, ConfigError> {
    let trimmed = input.trim();
    let invalid = || ConfigError::InvalidTtl(input.to_string());
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let (digits, unit_seconds) = match trimmed.char_indices().last() {
        Some((last, 'd')) => (&trimmed[..last], 24 * 60 * 60),
        Some((last, 'h')) => (&trimmed[..last], 60 * 60),
        Some((last, 'm')) => (&trimmed[..last], 60),
        Some((last, 's')) => (&trimmed[..last], 1),
        _ => (trimmed, 1),
    };

    let value: i64 = digits.parse().map_err(|_| invalid())?;
    if value <= 0 {
        return Err(invalid());
    }
    value.checked_mul(unit_seconds).ok_or_else(invalid)
}

/// Process-wide auth configuration, read-only after startup.
#[derive(Clone)]
pub struct AuthConfig {
    signing_secret: SecretString,
    session_ttl_seconds: i64,
    reset_ttl_seconds: i64,
    environment: Environment,
}

impl AuthConfig {
    #[must_use]
    pub fn new(signing_secret: SecretString) -> Self {
        Self {
            signing_secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            reset_ttl_seconds: DEFAULT_RESET_TTL_SECONDS,
            environment: Environment::Development,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn reset_ttl_seconds(&self) -> i64 {
        self.reset_ttl_seconds
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Only mark cookies secure outside local development.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.environment == Environment::Production
    }

    fn validate_secret(&self) -> Result<(), ConfigError> {
        let secret = self.signing_secret.expose_secret();
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        match self.environment {
            Environment::Production => {
                if secret == DEV_SIGNING_SECRET {
                    return Err(ConfigError::FallbackSecret);
                }
                if secret.len() < MIN_SECRET_BYTES {
                    return Err(ConfigError::WeakSecret);
                }
            }
            Environment::Development => {
                if secret == DEV_SIGNING_SECRET {
                    warn!("using the development fallback signing secret");
                } else if secret.len() < MIN_SECRET_BYTES {
                    warn!("signing secret is shorter than {MIN_SECRET_BYTES} bytes");
                }
            }
        }
        Ok(())
    }
}

/// The constructed, immutable component set shared by all request handlers.
pub struct AuthState {
    config: AuthConfig,
    hasher: PasswordHasher,
    tokens: TokenCodec,
    cookies: SessionCookieStore,
    reset: ResetTokenIssuer,
    resolver: SessionResolver,
}

impl AuthState {
    /// Validate the configuration and build every component once.
    ///
    /// # Errors
    ///
    /// Fails fast on a missing, weak, or fallback signing secret so the
    /// process never serves requests with an insecure configuration.
    pub fn new(config: AuthConfig) -> Result<Self, ConfigError> {
        Self::with_hasher(config, PasswordHasher::new())
    }

    /// Like [`AuthState::new`] with an explicit hasher (tests lower the work
    /// factor).
    ///
    /// # Errors
    ///
    /// See [`AuthState::new`].
    pub fn with_hasher(config: AuthConfig, hasher: PasswordHasher) -> Result<Self, ConfigError> {
        config.validate_secret()?;

        let tokens = TokenCodec::new(config.signing_secret.clone());
        let cookies =
            SessionCookieStore::new(config.cookie_secure(), config.session_ttl_seconds());
        let reset = ResetTokenIssuer::new(hasher.clone(), config.reset_ttl_seconds());
        let resolver = SessionResolver::new(cookies.clone(), tokens.clone());

        Ok(Self {
            config,
            hasher,
            tokens,
            cookies,
            reset,
            resolver,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    #[must_use]
    pub fn cookies(&self) -> &SessionCookieStore {
        &self.cookies
    }

    #[must_use]
    pub fn reset(&self) -> &ResetTokenIssuer {
        &self.reset
    }

    #[must_use]
    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }
}
