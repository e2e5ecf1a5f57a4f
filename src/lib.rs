//! # Dossier Auth
//!
//! `dossier-auth` is the authentication and session-credential subsystem of
//! the Dossier case-management application: password hashing and
//! verification, signed session tokens, the HTTP session-cookie lifecycle,
//! and the password-reset token flow.
//!
//! ## Sessions
//!
//! Sessions are self-contained HS256 tokens carried in a single `HttpOnly`
//! cookie. Validity is purely a function of signature and expiry; nothing is
//! stored server-side, so there is no revocation list and the token TTL is
//! the only bound on session lifetime.
//!
//! ## Failure policy
//!
//! Authentication failures are deliberately vague: unknown account, wrong
//! password, missing cookie, expired token, and tampered signature are not
//! distinguishable from outside the subsystem. Precise reasons are logged
//! server-side only.
//!
//! ## Persistence
//!
//! The relational store is an external collaborator behind the
//! [`auth::UserStore`] trait; this crate owns the semantics of the
//! `password`, `reset_token`, and `reset_token_expiry` fields, never the
//! schema.

pub mod api;
pub mod auth;
pub mod cli;
