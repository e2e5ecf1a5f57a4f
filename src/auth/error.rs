//! Error taxonomy for the auth subsystem.
//!
//! Validation failures are the caller's fault and safe to describe
//! precisely. Authentication failures are deliberately vague: bad password,
//! unknown account, and invalid session all read the same from outside.
//! Collaborator failures are logged with detail server-side and returned as
//! an opaque fault.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid email or password")]
    Authentication,
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Authentication => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
            )
                .into_response(),
            Self::Persistence(err) => {
                error!("{err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
