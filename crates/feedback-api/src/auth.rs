use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::{info, warn};

use feedback_db::DbError;
use feedback_types::FieldErrors;
use feedback_types::forms::{LoginForm, RegisterForm};

use crate::credentials;
use crate::error::AppError;
use crate::flash::{self, Flash, Level};
use crate::session::{self, Session};
use crate::state::{AppState, with_db};
use crate::views::{self, paths};

/// GET /: logged-in users go to their profile, everyone else registers.
///
/// Every "not logged in" redirect lands here, so this is where a session
/// cookie that keeps failing verification gets dropped.
pub async fn index(session: Session, jar: SignedCookieJar) -> Response {
    match session.identity() {
        Some(me) => Redirect::to(&paths::user(me)).into_response(),
        None if session.has_rejected_cookie() => {
            (session::sign_out(jar), Redirect::to(paths::REGISTER)).into_response()
        }
        None => Redirect::to(paths::REGISTER).into_response(),
    }
}

pub async fn register_form(jar: SignedCookieJar) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    (
        jar,
        views::register(&RegisterForm::default(), &FieldErrors::default(), &flashes),
    )
}

pub async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let registration = match form.validate() {
        Ok(registration) => registration,
        Err(errors) => return Ok(views::register(&form, &errors, &[]).into_response()),
    };

    let created = with_db(&state, move |db| credentials::register(db, &registration)).await;
    let user = match created {
        Ok(user) => user,
        Err(AppError::Store(DbError::DuplicateKey { field })) => {
            let mut errors = FieldErrors::default();
            errors.insert(field, format!("That {} is already taken.", field.replace('_', " ")));
            return Ok(views::register(&form, &errors, &[]).into_response());
        }
        Err(e) => return Err(e),
    };

    info!("Registered user {}", user.username);
    let jar = session::sign_in(jar, &state.session, &user.username)?;
    Ok((jar, Redirect::to(&paths::user(&user.username))).into_response())
}

pub async fn login_form(jar: SignedCookieJar) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    (
        jar,
        views::login(&LoginForm::default(), &FieldErrors::default(), &flashes),
    )
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let creds = match form.validate() {
        Ok(creds) => creds,
        Err(errors) => return Ok(views::login(&form, &errors, &[]).into_response()),
    };

    let attempt = creds.clone();
    let user = with_db(&state, move |db| {
        credentials::authenticate(db, &attempt.username, &attempt.password)
    })
    .await?;

    match user {
        Some(user) => {
            info!("User {} logged in", user.username);
            let jar = session::sign_in(jar, &state.session, &user.username)?;
            Ok((jar, Redirect::to(&paths::user(&user.username))).into_response())
        }
        None => {
            warn!("Failed login for {:?}", creds.username);
            // No session is set, and the message does not say which field was wrong.
            let (jar, mut flashes) = flash::take(jar);
            flashes.push(Flash::new(Level::Error, "Wrong username or password."));
            let mut errors = FieldErrors::default();
            errors.insert("username", "Bad name/password");
            Ok((jar, views::login(&form, &errors, &flashes)).into_response())
        }
    }
}

/// GET /logout: always ends the session, logged in or not.
pub async fn logout(session: Session, jar: SignedCookieJar) -> impl IntoResponse {
    if let Some(me) = session.identity() {
        info!("User {} logged out", me);
    }
    (session::sign_out(jar), Redirect::to(paths::HOME))
}
