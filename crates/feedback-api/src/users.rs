use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::info;

use crate::authz;
use crate::error::AppError;
use crate::flash;
use crate::session::{self, Session};
use crate::state::{AppState, with_db};
use crate::views::{self, paths};

/// GET /users/{username}: profile page, visible to its owner only.
pub async fn show_user(
    State(state): State<AppState>,
    Path(raw_username): Path<String>,
    session: Session,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let username =
        match authz::enforce_path_owner(session.identity(), &raw_username, &jar, paths::user, None) {
            Ok(username) => username,
            Err(redirect) => return Ok(redirect),
        };

    let owner = username.clone();
    let (user, feedback) = with_db(&state, move |db| {
        let user = db.get_user(&owner)?;
        let feedback = db.list_feedback_for_user(&owner)?;
        Ok((user, feedback))
    })
    .await?;

    // The session was checked against the store moments ago; a miss here
    // means the account was deleted in between. Treat it like a logout.
    let Some(user) = user else {
        return Ok((session::sign_out(jar), Redirect::to(paths::HOME)).into_response());
    };

    let (jar, flashes) = flash::take(jar);
    Ok((jar, views::profile(&user, &feedback, &flashes)).into_response())
}

/// POST /users/{username}/delete: remove the account and all its feedback.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw_username): Path<String>,
    session: Session,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let username = match authz::enforce_path_owner(
        session.identity(),
        &raw_username,
        &jar,
        paths::user,
        Some("Cannot delete other users.".into()),
    ) {
        Ok(username) => username,
        Err(redirect) => return Ok(redirect),
    };

    let target = username.clone();
    let removed = with_db(&state, move |db| Ok(db.delete_user(&target)?)).await?;
    info!("Deleted user {} with {} feedback item(s)", username, removed);

    Ok((session::sign_out(jar), Redirect::to(paths::HOME)).into_response())
}
