use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{USERNAME_MAX_LEN, Username};

pub const EMAIL_MAX_LEN: usize = 50;
pub const NAME_MAX_LEN: usize = 30;
pub const TITLE_MAX_LEN: usize = 100;

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid form input: {} field(s) rejected", .0.len())]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

fn required(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field, "This field is required.");
    }
}

fn max_len(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.insert(field, format!("Field cannot be longer than {max} characters."));
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

// -- Registration --

/// Raw `/register` form body. Missing fields deserialize as empty strings so
/// that they surface as field errors rather than extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: Username,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::default();

        let username = self.username.trim();
        required(&mut errors, "username", username);
        max_len(&mut errors, "username", username, USERNAME_MAX_LEN);
        let parsed = Username::parse(username);
        if let Err(e) = &parsed {
            errors.insert("username", e.to_string());
        }

        required(&mut errors, "password", &self.password);

        let email = self.email.trim();
        required(&mut errors, "email", email);
        max_len(&mut errors, "email", email, EMAIL_MAX_LEN);
        if !looks_like_email(email) {
            errors.insert("email", "Please enter a valid email address.");
        }

        let first_name = self.first_name.trim();
        required(&mut errors, "first_name", first_name);
        max_len(&mut errors, "first_name", first_name, NAME_MAX_LEN);

        let last_name = self.last_name.trim();
        required(&mut errors, "last_name", last_name);
        max_len(&mut errors, "last_name", last_name, NAME_MAX_LEN);

        match parsed {
            Ok(username) => errors.into_result(|| Registration {
                username,
                password: self.password.clone(),
                email: email.to_owned(),
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
            }),
            Err(_) => Err(errors),
        }
    }
}

// -- Login --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Login input after presence checks. The username is kept raw: a name that
/// could never have been registered simply fails authentication.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = self.username.trim();
        required(&mut errors, "username", username);
        max_len(&mut errors, "username", username, USERNAME_MAX_LEN);
        required(&mut errors, "password", &self.password);

        errors.into_result(|| Credentials {
            username: username.to_owned(),
            password: self.password.clone(),
        })
    }
}

// -- Feedback --

/// Body of both the add and the edit feedback forms.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackForm {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackDraft {
    pub title: String,
    pub content: String,
}

impl FeedbackForm {
    pub fn validate(&self) -> Result<FeedbackDraft, FieldErrors> {
        let mut errors = FieldErrors::default();
        let title = self.title.trim();
        required(&mut errors, "title", title);
        max_len(&mut errors, "title", title, TITLE_MAX_LEN);
        required(&mut errors, "content", &self.content);

        errors.into_result(|| FeedbackDraft {
            title: title.to_owned(),
            content: self.content.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            username: "alice".into(),
            password: "pw1".into(),
            email: "alice@example.com".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
        }
    }

    #[test]
    fn test_valid_registration() {
        let reg = register_form().validate().unwrap();
        assert_eq!(reg.username.as_str(), "alice");
        assert_eq!(reg.email, "alice@example.com");
    }

    #[test]
    fn test_registration_accepts_names_with_spaces_and_accents() {
        for name in ["mary jane", "o'neil", "josé"] {
            let mut form = register_form();
            form.username = name.into();
            assert_eq!(form.validate().unwrap().username.as_str(), name);
        }
    }

    #[test]
    fn test_registration_collects_every_field_error() {
        let errors = RegisterForm::default().validate().unwrap_err();
        for field in ["username", "password", "email", "first_name", "last_name"] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn test_registration_length_bounds() {
        let mut form = register_form();
        form.first_name = "f".repeat(NAME_MAX_LEN + 1);
        form.email = format!("{}@example.com", "e".repeat(EMAIL_MAX_LEN));
        let errors = form.validate().unwrap_err();
        assert!(errors.get("first_name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("username").is_none());
    }

    #[test]
    fn test_registration_rejects_bad_email() {
        for email in ["alice", "alice@", "@example.com", "alice@example", "a b@example.com"] {
            let mut form = register_form();
            form.email = email.into();
            let errors = form.validate().unwrap_err();
            assert_eq!(
                errors.get("email"),
                Some("Please enter a valid email address."),
                "accepted {email}"
            );
        }
    }

    #[test]
    fn test_login_requires_both_fields() {
        let errors = LoginForm { username: "alice".into(), password: String::new() }
            .validate()
            .unwrap_err();
        assert!(errors.get("password").is_some());
        assert!(errors.get("username").is_none());
    }

    #[test]
    fn test_feedback_title_limit() {
        let ok = FeedbackForm { title: "t".repeat(TITLE_MAX_LEN), content: "c".into() };
        assert!(ok.validate().is_ok());

        let long = FeedbackForm { title: "t".repeat(TITLE_MAX_LEN + 1), content: "c".into() };
        let errors = long.validate().unwrap_err();
        assert!(errors.get("title").is_some());
    }

    #[test]
    fn test_feedback_trims_title() {
        let draft = FeedbackForm { title: "  t1 ".into(), content: "body".into() }
            .validate()
            .unwrap();
        assert_eq!(draft, FeedbackDraft { title: "t1".into(), content: "body".into() });
    }
}
