use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::{info, warn};

use feedback_types::forms::FeedbackForm;
use feedback_types::{Feedback, FieldErrors};

use crate::authz::{self, decide};
use crate::error::AppError;
use crate::flash::{self, Level};
use crate::session::Session;
use crate::state::{AppState, with_db};
use crate::views::{self, paths};

// -- Add --

/// GET /users/{username}/feedback/add
pub async fn add_form(
    Path(raw_username): Path<String>,
    session: Session,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let username = match authz::enforce_path_owner(
        session.identity(),
        &raw_username,
        &jar,
        paths::add_feedback,
        None,
    ) {
        Ok(username) => username,
        Err(redirect) => return Ok(redirect),
    };

    let (jar, flashes) = flash::take(jar);
    let page = views::add_feedback(
        &username,
        &FeedbackForm::default(),
        &FieldErrors::default(),
        &flashes,
    );
    Ok((jar, page).into_response())
}

/// POST /users/{username}/feedback/add
pub async fn add(
    State(state): State<AppState>,
    Path(raw_username): Path<String>,
    session: Session,
    jar: SignedCookieJar,
    form: Result<Form<FeedbackForm>, FormRejection>,
) -> Result<Response, AppError> {
    let username = match authz::enforce_path_owner(
        session.identity(),
        &raw_username,
        &jar,
        paths::add_feedback,
        None,
    ) {
        Ok(username) => username,
        Err(redirect) => return Ok(redirect),
    };
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(views::add_feedback(&username, &form, &errors, &[]).into_response());
        }
    };

    let owner = username.clone();
    let created = with_db(&state, move |db| {
        Ok(db.create_feedback(&owner, &draft.title, &draft.content)?)
    })
    .await?;
    info!("User {} added feedback {}", username, created.id);

    Ok(Redirect::to(&paths::user(&username)).into_response())
}

// -- Update --

/// GET /feedback/{id}/update
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    session: Session,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let feedback = match owned_feedback(&state, &session, &jar, id, not_yours_update(id)).await? {
        Ok(feedback) => feedback,
        Err(redirect) => return Ok(redirect),
    };

    let form = FeedbackForm {
        title: feedback.title.clone(),
        content: feedback.content.clone(),
    };
    let (jar, flashes) = flash::take(jar);
    let page = views::edit_feedback(&feedback, &form, &FieldErrors::default(), &flashes);
    Ok((jar, page).into_response())
}

/// POST /feedback/{id}/update
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    session: Session,
    jar: SignedCookieJar,
    form: Result<Form<FeedbackForm>, FormRejection>,
) -> Result<Response, AppError> {
    let feedback = match owned_feedback(&state, &session, &jar, id, not_yours_update(id)).await? {
        Ok(feedback) => feedback,
        Err(redirect) => return Ok(redirect),
    };
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(views::edit_feedback(&feedback, &form, &errors, &[]).into_response());
        }
    };

    let updated = with_db(&state, move |db| {
        Ok(db.update_feedback(id, &draft.title, &draft.content)?)
    })
    .await?;
    info!("User {} updated feedback {}", updated.owner, id);

    let jar = flash::push(jar, Level::Success, "changes saved!");
    Ok((jar, Redirect::to(&paths::user(&updated.owner))).into_response())
}

// -- Delete --

/// GET or POST /feedback/{id}/delete
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    session: Session,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let feedback = match owned_feedback(&state, &session, &jar, id, not_yours_delete(id)).await? {
        Ok(feedback) => feedback,
        Err(redirect) => return Ok(redirect),
    };

    with_db(&state, move |db| Ok(db.delete_feedback(id)?)).await?;
    info!("User {} deleted feedback {}", feedback.owner, id);

    let jar = flash::push(jar, Level::Success, format!("Feedback item {id} deleted."));
    Ok((jar, Redirect::to(&paths::user(&feedback.owner))).into_response())
}

// -- Ownership --

fn not_yours_update(id: i64) -> String {
    format!(
        "Feedback item {id} belongs to another user. Please select a feedback item from the list below."
    )
}

fn not_yours_delete(id: i64) -> String {
    format!("Feedback item {id} belongs to another user. Please select a feedback item below.")
}

/// Load feedback `id` if the caller owns it, otherwise build the redirect
/// that ends the request.
///
/// Anonymous callers are sent home before the lookup, so they cannot learn
/// which ids exist. For everyone else a missing row short-circuits to a
/// not-found redirect; only an existing row has an owner to compare against.
async fn owned_feedback(
    state: &AppState,
    session: &Session,
    jar: &SignedCookieJar,
    id: i64,
    denied_message: String,
) -> Result<Result<Feedback, Response>, AppError> {
    if session.identity().is_none() {
        return Ok(Err(Redirect::to(paths::HOME).into_response()));
    }

    let Some(feedback) = with_db(state, move |db| Ok(db.get_feedback(id)?)).await? else {
        warn!("Feedback item {} requested but does not exist", id);
        let jar = flash::push(
            jar.clone(),
            Level::Error,
            format!("Feedback item {id} does not exist"),
        );
        return Ok(Err((jar, Redirect::to(paths::HOME)).into_response()));
    };

    let decision = decide(session.identity(), &feedback.owner);
    match authz::enforce(decision, jar, paths::user, Some(denied_message)) {
        Ok(()) => Ok(Ok(feedback)),
        Err(redirect) => Ok(Err(redirect)),
    }
}
