//! Resolving "who is the current caller" from request headers.

use axum::http::HeaderMap;
use chrono::Utc;
use tracing::debug;

use super::cookie::SessionCookieStore;
use super::token::{SessionClaims, TokenCodec};

/// Composes the cookie store and token codec for request handlers.
///
/// "No cookie", "malformed token", "expired token", and "tampered signature"
/// all collapse into one observable outcome: absent. Distinguishing them to
/// an unauthenticated caller has no legitimate use and only aids attackers;
/// the precise reason is still logged server-side.
#[derive(Clone)]
pub struct SessionResolver {
    cookies: SessionCookieStore,
    tokens: TokenCodec,
}

impl SessionResolver {
    #[must_use]
    pub fn new(cookies: SessionCookieStore, tokens: TokenCodec) -> Self {
        Self { cookies, tokens }
    }

    /// Resolve the current caller, or `None`. Never an error.
    #[must_use]
    pub fn current_user(&self, headers: &HeaderMap) -> Option<SessionClaims> {
        self.current_user_at(headers, Utc::now().timestamp())
    }

    #[must_use]
    pub fn current_user_at(
        &self,
        headers: &HeaderMap,
        now_unix_seconds: i64,
    ) -> Option<SessionClaims> {
        let token = self.cookies.get(headers)?;
        match self.tokens.verify_at(&token, now_unix_seconds) {
            Ok(claims) => Some(claims),
            Err(reason) => {
                debug!("rejected session token: {reason}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::COOKIE};
    use secrecy::SecretString;

    const NOW: i64 = 1_700_000_000;

    fn resolver() -> SessionResolver {
        let tokens = TokenCodec::new(SecretString::from(
            "test-signing-secret-at-least-32-bytes".to_string(),
        ));
        SessionResolver::new(SessionCookieStore::new(false, 3600), tokens)
    }

    fn claims() -> SessionClaims {
        SessionClaims {
            user_id: "u1".to_string(),
            email: "a@b.com".to_string(),
            display_name: "Ada".to_string(),
            tier: "free".to_string(),
        }
    }

    fn request_with_token(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("dossier-auth-token={token}");
        headers.insert(COOKIE, HeaderValue::from_str(&value).expect("ascii"));
        headers
    }

    #[test]
    fn valid_cookie_resolves_to_identical_claims() {
        let resolver = resolver();
        let token = resolver
            .tokens
            .issue_at(&claims(), 3600, NOW)
            .expect("issue token");

        let resolved = resolver.current_user_at(&request_with_token(&token), NOW);
        assert_eq!(resolved, Some(claims()));
    }

    #[test]
    fn missing_cookie_is_absent() {
        assert_eq!(resolver().current_user_at(&HeaderMap::new(), NOW), None);
    }

    #[test]
    fn expired_tampered_and_garbage_all_collapse_to_absent() {
        let resolver = resolver();
        let token = resolver
            .tokens
            .issue_at(&claims(), 3600, NOW)
            .expect("issue token");

        // Expired.
        assert_eq!(
            resolver.current_user_at(&request_with_token(&token), NOW + 3600),
            None
        );
        // Tampered signature.
        let mut tampered = token.clone();
        let last = tampered.pop().expect("non-empty token");
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        assert_eq!(
            resolver.current_user_at(&request_with_token(&tampered), NOW),
            None
        );
        // Garbage.
        assert_eq!(
            resolver.current_user_at(&request_with_token("not-a-token"), NOW),
            None
        );
    }
}
