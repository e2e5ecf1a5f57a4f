//! Session cookie lifecycle on the HTTP transport.
//!
//! The token travels in a single named, `HttpOnly` cookie. Every mutation is
//! an explicit transformation of the response `HeaderMap` a handler returns:
//! a clear that only touches ambient request state would report success while
//! the browser keeps the cookie.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue, SET_COOKIE},
};

pub const SESSION_COOKIE_NAME: &str = "dossier-auth-token";

/// Writes, reads, and clears the session cookie.
#[derive(Clone, Debug)]
pub struct SessionCookieStore {
    secure: bool,
    max_age_seconds: i64,
}

impl SessionCookieStore {
    /// `secure` should be true outside local development; `max_age_seconds`
    /// mirrors the token TTL.
    #[must_use]
    pub fn new(secure: bool, max_age_seconds: i64) -> Self {
        Self {
            secure,
            max_age_seconds,
        }
    }

    fn cookie_value(&self, token: &str, max_age: i64) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }

    /// Attach the session token to the outgoing response.
    ///
    /// # Errors
    ///
    /// Returns an error if the token contains bytes invalid in a header.
    pub fn set(&self, headers: &mut HeaderMap, token: &str) -> Result<(), InvalidHeaderValue> {
        let cookie = self.cookie_value(token, self.max_age_seconds)?;
        headers.insert(SET_COOKIE, cookie);
        Ok(())
    }

    /// Read the session token from the incoming request, if present.
    /// Absence is a normal, non-error state.
    #[must_use]
    pub fn get(&self, headers: &HeaderMap) -> Option<String> {
        let header = headers.get(COOKIE)?;
        let value = header.to_str().ok()?;
        for pair in value.split(';') {
            let trimmed = pair.trim();
            let mut parts = trimmed.splitn(2, '=');
            let key = parts.next()?.trim();
            let val = parts.next()?.trim();
            if key == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
        None
    }

    /// Attach an expired, empty cookie to the outgoing response so the
    /// browser drops the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie attributes form an invalid header.
    pub fn clear(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        let cookie = self.cookie_value("", 0)?;
        headers.insert(SET_COOKIE, cookie);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fold the `Set-Cookie` headers of a response into the cookie a browser
    /// would replay: the latest write wins, `Max-Age=0` removes it.
    fn replay(response_headers: &HeaderMap) -> Option<String> {
        let mut jar = None;
        for value in response_headers.get_all(SET_COOKIE) {
            let cookie = value.to_str().expect("ascii cookie");
            let mut attrs = cookie.split(';');
            let pair = attrs.next().expect("cookie pair");
            let token = pair
                .strip_prefix(&format!("{SESSION_COOKIE_NAME}="))
                .expect("named cookie")
                .to_string();
            let expired = attrs.any(|attr| attr.trim() == "Max-Age=0");
            jar = if expired || token.is_empty() {
                None
            } else {
                Some(token)
            };
        }
        jar
    }

    fn request_with_cookie(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("{SESSION_COOKIE_NAME}={token}");
        headers.insert(COOKIE, HeaderValue::from_str(&value).expect("ascii"));
        headers
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = SessionCookieStore::new(false, 3600);
        let mut response = HeaderMap::new();
        store.set(&mut response, "token-value").expect("set cookie");

        let token = replay(&response).expect("cookie present");
        assert_eq!(token, "token-value");

        let request = request_with_cookie(&token);
        assert_eq!(store.get(&request), Some("token-value".to_string()));
    }

    #[test]
    fn clear_after_set_leaves_nothing_to_replay() {
        let store = SessionCookieStore::new(false, 3600);
        let mut response = HeaderMap::new();
        store.set(&mut response, "token-value").expect("set cookie");
        store.clear(&mut response).expect("clear cookie");

        assert_eq!(replay(&response), None);
    }

    #[test]
    fn missing_cookie_is_absent_not_error() {
        let store = SessionCookieStore::new(false, 3600);
        assert_eq!(store.get(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("other=value"));
        assert_eq!(store.get(&headers), None);
    }

    #[test]
    fn get_finds_cookie_among_others() {
        let store = SessionCookieStore::new(false, 3600);
        let mut headers = HeaderMap::new();
        let value = format!("a=1; {SESSION_COOKIE_NAME}=tok; b=2");
        headers.insert(COOKIE, HeaderValue::from_str(&value).expect("ascii"));
        assert_eq!(store.get(&headers), Some("tok".to_string()));
    }

    #[test]
    fn attributes_follow_config() {
        let store = SessionCookieStore::new(true, 60);
        let mut response = HeaderMap::new();
        store.set(&mut response, "tok").expect("set cookie");

        let cookie = response
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("cookie header");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=60"));
        assert!(cookie.contains("Secure"));

        let insecure = SessionCookieStore::new(false, 60);
        let mut response = HeaderMap::new();
        insecure.set(&mut response, "tok").expect("set cookie");
        let cookie = response
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("cookie header");
        assert!(!cookie.contains("Secure"));
    }
}
