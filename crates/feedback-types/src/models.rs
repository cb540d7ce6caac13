use std::fmt;

use thiserror::Error;

pub const USERNAME_MAX_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("username is required")]
    Empty,
    #[error("username must be at most {USERNAME_MAX_LEN} characters")]
    TooLong,
    #[error("username may not contain '/' or control characters")]
    InvalidCharacter,
}

/// Primary key of a user: 1 to 20 characters.
///
/// Usernames are one URL path segment (percent-encoded when links are built),
/// so `/` and control characters are refused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> Result<Self, UsernameError> {
        if raw.is_empty() {
            return Err(UsernameError::Empty);
        }
        if raw.chars().count() > USERNAME_MAX_LEN {
            return Err(UsernameError::TooLong);
        }
        if raw.chars().any(|c| c == '/' || c.is_control()) {
            return Err(UsernameError::InvalidCharacter);
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered account. The password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: Username,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// A short note owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub owner: Username,
}
