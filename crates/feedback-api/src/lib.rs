pub mod auth;
pub mod authz;
pub mod credentials;
pub mod error;
pub mod feedback;
pub mod flash;
pub mod routes;
pub mod session;
pub mod state;
pub mod users;
pub mod views;

pub use authz::{Decision, decide};
pub use error::AppError;
pub use routes::router;
pub use session::Session;
pub use state::{AppState, AppStateInner, SessionSettings};
