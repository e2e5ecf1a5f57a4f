//! OpenAPI document for the auth API.

use utoipa::OpenApi;

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::session,
        handlers::auth::logout,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,
        handlers::health::health,
    ),
    components(schemas(
        handlers::auth::SignupRequest,
        handlers::auth::LoginRequest,
        handlers::auth::SessionResponse,
        handlers::auth::ForgotPasswordRequest,
        handlers::auth::ResetPasswordRequest,
        handlers::health::Health,
    )),
    tags(
        (name = "auth", description = "Authentication and session endpoints"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_all_auth_paths() {
        let doc = openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/v1/auth/signup",
            "/v1/auth/login",
            "/v1/auth/session",
            "/v1/auth/logout",
            "/v1/auth/forgot-password",
            "/v1/auth/reset-password",
            "/health",
        ] {
            assert!(paths.contains_key(path), "missing path: {path}");
        }
    }
}
