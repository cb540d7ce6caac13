use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite, SignedCookieJar};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use feedback_types::Username;

use crate::error::AppError;
use crate::state::{AppState, SessionSettings, with_db};

pub const SESSION_COOKIE: &str = "session";

/// Signed session token payload. Holds nothing but the username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Identity of the caller for the current request.
///
/// Built once per request from the session cookie. A missing, tampered,
/// expired, or stale token (one naming a user that no longer exists) all
/// yield an anonymous session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Username>,
    rejected_cookie: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Anonymous, but the request carried a session cookie that was refused.
    fn rejected() -> Self {
        Self { identity: None, rejected_cookie: true }
    }

    pub fn identity(&self) -> Option<&Username> {
        self.identity.as_ref()
    }

    /// The browser still holds a session cookie that will never be accepted.
    pub fn has_rejected_cookie(&self) -> bool {
        self.rejected_cookie
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if CookieJar::from_headers(&parts.headers).get(SESSION_COOKIE).is_none() {
            return Ok(Self::anonymous());
        }

        let jar: SignedCookieJar =
            SignedCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            debug!("ignoring session cookie with a bad signature");
            return Ok(Self::rejected());
        };

        let username = match verify_token(&state.session.secret, cookie.value()) {
            Ok(username) => username,
            Err(reason) => {
                debug!("ignoring session cookie: {}", reason);
                return Ok(Self::rejected());
            }
        };

        let lookup = username.clone();
        let exists = with_db(state, move |db| Ok(db.user_exists(&lookup)?)).await?;
        if !exists {
            debug!("stale session for deleted user {}", username);
            return Ok(Self::rejected());
        }

        Ok(Self { identity: Some(username), rejected_cookie: false })
    }
}

pub fn create_token(settings: &SessionSettings, username: &Username) -> Result<String, AppError> {
    let claims = Claims {
        sub: username.to_string(),
        exp: (chrono::Utc::now() + settings.lifetime).timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign session token: {e}")))
}

/// Check signature and expiry, then return the username the token names.
pub fn verify_token(secret: &str, token: &str) -> Result<Username, String> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| e.to_string())?;

    Username::parse(&data.claims.sub).map_err(|e| e.to_string())
}

/// Attach a fresh session cookie for `username`.
pub fn sign_in(
    jar: SignedCookieJar,
    settings: &SessionSettings,
    username: &Username,
) -> Result<SignedCookieJar, AppError> {
    let token = create_token(settings, username)?;
    Ok(jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(settings.secure_cookies),
    ))
}

pub fn sign_out(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    fn settings() -> SessionSettings {
        SessionSettings {
            secret: "unit-test-secret".into(),
            lifetime: chrono::Duration::hours(1),
            secure_cookies: false,
        }
    }

    fn alice() -> Username {
        Username::parse("alice").unwrap()
    }

    #[test]
    fn test_token_names_the_user() {
        let token = create_token(&settings(), &alice()).unwrap();
        assert_eq!(verify_token("unit-test-secret", &token).unwrap(), alice());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = create_token(&settings(), &alice()).unwrap();
        assert!(verify_token("another-secret", &token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut expired = settings();
        expired.lifetime = chrono::Duration::hours(-2);
        let token = create_token(&expired, &alice()).unwrap();
        assert!(verify_token("unit-test-secret", &token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(verify_token("unit-test-secret", "not.a.token").is_err());
    }

    #[test]
    fn test_sign_in_sets_http_only_cookie() {
        let jar = sign_in(SignedCookieJar::new(Key::generate()), &settings(), &alice()).unwrap();
        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
