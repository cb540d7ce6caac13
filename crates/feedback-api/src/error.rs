use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use feedback_db::DbError;

use crate::views;

/// Failures that end a request. Validation problems and authorization
/// denials are not errors here: handlers resolve them by re-rendering a form
/// or redirecting.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] DbError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Row vanished between the ownership check and the write.
            AppError::Store(DbError::NotFound) => {
                not_found_redirect("The requested record does not exist.")
            }
            AppError::Store(e) => {
                error!("store failure: {}", e);
                server_error()
            }
            AppError::Internal(e) => {
                error!("internal failure: {}", e);
                server_error()
            }
        }
    }
}

/// No cookie jar is in reach here, so the message goes to the log only.
fn not_found_redirect(message: &str) -> Response {
    warn!("not found: {}", message);
    Redirect::to(views::paths::HOME).into_response()
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, views::server_error()).into_response()
}
