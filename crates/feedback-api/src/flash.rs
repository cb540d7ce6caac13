//! One-shot messages shown on the next rendered page.
//!
//! Messages ride in a signed cookie between the redirecting response and the
//! page that displays them. The cookie value is URL-safe base64 of a JSON
//! list; a value the server did not sign is dropped unread.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

impl Level {
    pub fn css_class(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }
}

/// Queue a message behind any already waiting in `jar`.
pub fn push(jar: SignedCookieJar, level: Level, message: impl Into<String>) -> SignedCookieJar {
    let mut pending = read(&jar);
    pending.push(Flash::new(level, message));

    let encoded = match serde_json::to_vec(&pending) {
        Ok(json) => B64.encode(json),
        Err(e) => {
            debug!("dropping flash messages: {}", e);
            return jar;
        }
    };

    jar.add(
        Cookie::build((FLASH_COOKIE, encoded))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Drain pending messages. The returned jar clears the cookie.
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Vec<Flash>) {
    let pending = read(&jar);
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, pending);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), pending)
}

fn read(jar: &SignedCookieJar) -> Vec<Flash> {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return Vec::new();
    };
    B64.decode(cookie.value())
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_else(|| {
            debug!("ignoring malformed flash cookie");
            Vec::new()
        })
}
