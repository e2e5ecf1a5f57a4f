//! Authentication and session-credential subsystem.
//!
//! Components, leaves first:
//!
//! - [`PasswordHasher`]: Argon2id hashing and constant-time verification.
//! - [`TokenCodec`]: signed, time-bound session tokens (HS256).
//! - [`SessionCookieStore`]: the session cookie on the HTTP transport.
//! - [`ResetTokenIssuer`]: single-use, hashed-at-rest reset tokens.
//! - [`SessionResolver`]: "who is the current caller" for handlers.
//!
//! [`AuthState`] validates configuration once at startup and owns the
//! constructed components; the persistence collaborator stays behind
//! [`UserStore`].

pub mod cookie;
pub mod error;
pub mod password;
pub mod reset;
pub mod resolver;
pub mod state;
pub mod store;
pub mod token;
pub(crate) mod utils;

pub use cookie::{SESSION_COOKIE_NAME, SessionCookieStore};
pub use error::AuthError;
pub use password::{Credential, PasswordHasher, validate_password_strength};
pub use reset::{ResetRecord, ResetTokenIssuer};
pub use resolver::SessionResolver;
pub use state::{AuthConfig, AuthState, ConfigError, DEV_SIGNING_SECRET, Environment, parse_ttl};
pub use store::{CreateOutcome, MemoryUserStore, NewUser, StoreError, UserRecord, UserStore};
pub use token::{SessionClaims, TokenCodec, TokenError};
