use std::ops::Deref;
use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use tracing::error;

use feedback_db::Database;

use crate::error::AppError;

/// Shortest secret accepted for deriving the cookie signing key.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct AppState(Arc<AppStateInner>);

pub struct AppStateInner {
    pub db: Database,
    pub session: SessionSettings,
    /// Signs every cookie the app sets.
    pub cookie_key: Key,
}

/// How session tokens are signed and how long they stay valid.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub secret: String,
    pub lifetime: chrono::Duration,
    pub secure_cookies: bool,
}

impl AppStateInner {
    pub fn new(db: Database, session: SessionSettings) -> Result<AppState, AppError> {
        if session.secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Internal(format!(
                "session secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        let cookie_key = Key::derive_from(session.secret.as_bytes());
        Ok(AppState(Arc::new(Self { db, session, cookie_key })))
    }
}

impl Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &AppStateInner {
        &self.0
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}

/// Run blocking store work off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Database) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal("store task failed".into())
        })?
}
