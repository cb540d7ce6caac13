pub mod forms;
pub mod models;

pub use forms::{
    Credentials, FeedbackDraft, FeedbackForm, FieldErrors, LoginForm, RegisterForm, Registration,
};
pub use models::{Feedback, User, Username, UsernameError};
