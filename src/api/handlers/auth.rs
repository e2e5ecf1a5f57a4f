//! HTTP handlers for signup, login, session, logout, and password reset.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::api::sender::ResetTokenSender;
use crate::auth::{
    AuthError, AuthState, CreateOutcome, NewUser, SessionClaims, UserStore,
    password::validate_password_strength,
    utils::{normalize_email, valid_email},
};

const DEFAULT_TIER: &str = "free";
const MAX_DISPLAY_NAME_LENGTH: usize = 100;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub tier: String,
}

impl From<SessionClaims> for SessionResponse {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            display_name: claims.display_name,
            tier: claims.tier,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

/// Issue a session token for `claims` and build the response headers that
/// attach it as a cookie.
fn session_headers(auth_state: &AuthState, claims: &SessionClaims) -> Option<HeaderMap> {
    let token = match auth_state
        .tokens()
        .issue(claims, auth_state.config().session_ttl_seconds())
    {
        Ok(token) => token,
        Err(err) => {
            error!("failed to issue session token: {err}");
            return None;
        }
    };
    let mut headers = HeaderMap::new();
    if let Err(err) = auth_state.cookies().set(&mut headers, &token) {
        error!("failed to set session cookie: {err}");
        return None;
    }
    Some(headers)
}

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, session cookie set", body = SessionResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 409, description = "Email already registered", body = String)
    ),
    tag = "auth"
)]
pub async fn signup(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn UserStore>>,
    payload: Option<Json<SignupRequest>>,
) -> impl IntoResponse {
    let request: SignupRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email_normalized = normalize_email(&request.email);
    if !valid_email(&email_normalized) {
        return AuthError::Validation("Invalid email".to_string()).into_response();
    }

    if let Err(message) = validate_password_strength(&request.password) {
        return AuthError::Validation(message).into_response();
    }

    let display_name = request.display_name.trim().to_string();
    if display_name.is_empty() || display_name.len() > MAX_DISPLAY_NAME_LENGTH {
        return AuthError::Validation("Invalid display name".to_string()).into_response();
    }

    let password = match auth_state.hasher().hash(&request.password) {
        Ok(credential) => credential,
        Err(err) => {
            error!("failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Signup failed".to_string(),
            )
                .into_response();
        }
    };

    let outcome = store
        .create(NewUser {
            email: email_normalized,
            display_name,
            tier: DEFAULT_TIER.to_string(),
            password,
        })
        .await;

    let user = match outcome {
        Ok(CreateOutcome::Created(user)) => user,
        Ok(CreateOutcome::Conflict) => {
            return (
                StatusCode::CONFLICT,
                "An account with this email already exists".to_string(),
            )
                .into_response();
        }
        Err(err) => return AuthError::Persistence(err).into_response(),
    };

    let claims = SessionClaims {
        user_id: user.id.to_string(),
        email: user.email,
        display_name: user.display_name,
        tier: user.tier,
    };
    let Some(headers) = session_headers(&auth_state, &claims) else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Signup failed".to_string(),
        )
            .into_response();
    };

    (
        StatusCode::CREATED,
        headers,
        Json(SessionResponse::from(claims)),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success, session cookie set", body = SessionResponse),
        (status = 400, description = "Missing payload", body = String),
        (status = 401, description = "Unauthorized", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn UserStore>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Unknown email and wrong password must be indistinguishable from here on.
    let email_normalized = normalize_email(&request.email);
    let user = match store.find_by_email(&email_normalized).await {
        Ok(Some(user)) => user,
        Ok(None) => return AuthError::Authentication.into_response(),
        Err(err) => return AuthError::Persistence(err).into_response(),
    };

    if !auth_state.hasher().verify(&request.password, &user.password) {
        return AuthError::Authentication.into_response();
    }

    let claims = SessionClaims {
        user_id: user.id.to_string(),
        email: user.email,
        display_name: user.display_name,
        tier: user.tier,
    };
    let Some(headers) = session_headers(&auth_state, &claims) else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Login failed".to_string(),
        )
            .into_response();
    };

    (
        StatusCode::OK,
        headers,
        Json(SessionResponse::from(claims)),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    // Missing, expired, and tampered sessions all read the same: no session.
    match auth_state.resolver().current_user(&headers) {
        Some(claims) => (StatusCode::OK, Json(SessionResponse::from(claims))).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Always clear the cookie on the outgoing response, even without a
    // session; tokens are not stored server-side, so the cookie is the
    // session.
    let mut response_headers = HeaderMap::new();
    if let Err(err) = auth_state.cookies().clear(&mut response_headers) {
        error!("failed to clear session cookie: {err}");
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 204, description = "Reset requested; response is identical whether or not the account exists")
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn UserStore>>,
    sender: Extension<Arc<dyn ResetTokenSender>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    // Every path below returns the same 204 so accounts cannot be
    // enumerated; only the existing-account branch mutates state.
    let Some(Json(request)) = payload else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let email_normalized = normalize_email(&request.email);
    if !valid_email(&email_normalized) {
        return StatusCode::NO_CONTENT.into_response();
    }

    let user = match store.find_by_email(&email_normalized).await {
        Ok(Some(user)) => user,
        Ok(None) => return StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("failed to lookup user for reset: {err}");
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    let (raw_token, record) = match auth_state.reset().issue() {
        Ok(pair) => pair,
        Err(err) => {
            error!("failed to issue reset token: {err}");
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    // Overwrites any previous record: one active reset per user.
    if let Err(err) = store.set_reset_record(user.id, record).await {
        error!("failed to store reset record: {err}");
        return StatusCode::NO_CONTENT.into_response();
    }

    if let Err(err) = sender.send(&user.email, &raw_token) {
        error!("failed to hand off reset token: {err}");
    }

    StatusCode::NO_CONTENT.into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 400, description = "Validation error or invalid/expired token", body = String)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn UserStore>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request: ResetPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if let Err(message) = validate_password_strength(&request.new_password) {
        return AuthError::Validation(message).into_response();
    }

    // Unknown account, wrong token, and expired token are one outcome; a
    // matched-but-expired token requires reissuance, not retry.
    let invalid = || {
        (
            StatusCode::BAD_REQUEST,
            "Invalid or expired reset token".to_string(),
        )
            .into_response()
    };

    let email_normalized = normalize_email(&request.email);
    let user = match store.find_by_email(&email_normalized).await {
        Ok(Some(user)) => user,
        Ok(None) => return invalid(),
        Err(err) => return AuthError::Persistence(err).into_response(),
    };

    let Some(record) = user.reset_record() else {
        return invalid();
    };
    if !auth_state.reset().validate(request.token.trim(), &record) {
        return invalid();
    }

    let password = match auth_state.hasher().hash(&request.new_password) {
        Ok(credential) => credential,
        Err(err) => {
            error!("failed to hash new password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Password reset failed".to_string(),
            )
                .into_response();
        }
    };

    if let Err(err) = store.set_password(user.id, password).await {
        return AuthError::Persistence(err).into_response();
    }
    // Consume the record so the token is single-use.
    if let Err(err) = store.clear_reset_record(user.id).await {
        return AuthError::Persistence(err).into_response();
    }

    StatusCode::NO_CONTENT.into_response()
}
