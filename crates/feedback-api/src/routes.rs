use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::state::AppState;
use crate::{auth, feedback, users, views};

pub fn router(state: AppState) -> Router {
    let account_routes = Router::new()
        .route("/", get(auth::index))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout));

    let user_routes = Router::new()
        .route("/users/{username}", get(users::show_user))
        .route("/users/{username}/delete", post(users::delete_user))
        .route(
            "/users/{username}/feedback/add",
            get(feedback::add_form).post(feedback::add),
        );

    let feedback_routes = Router::new()
        .route(
            "/feedback/{id}/update",
            get(feedback::edit_form).post(feedback::update),
        )
        .route(
            "/feedback/{id}/delete",
            get(feedback::delete).post(feedback::delete),
        );

    Router::new()
        .merge(account_routes)
        .merge(user_routes)
        .merge(feedback_routes)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, views::not_found())
}
