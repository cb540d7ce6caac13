//! Server-rendered HTML pages.
//!
//! Every piece of user-supplied text goes through [`escape`] before it is
//! written into markup.

use std::fmt::Write;

use axum::response::Html;

use feedback_types::forms::{FeedbackForm, LoginForm, RegisterForm};
use feedback_types::{Feedback, FieldErrors, User, Username};

use crate::flash::Flash;

pub mod paths {
    use feedback_types::Username;

    pub const HOME: &str = "/";
    pub const REGISTER: &str = "/register";
    pub const LOGIN: &str = "/login";
    pub const LOGOUT: &str = "/logout";

    /// Usernames may hold spaces, quotes or non-ASCII text; axum decodes
    /// the segment again on the way in.
    fn segment(username: &Username) -> std::borrow::Cow<'_, str> {
        urlencoding::encode(username.as_str())
    }

    pub fn user(username: &Username) -> String {
        format!("/users/{}", segment(username))
    }

    pub fn delete_user(username: &Username) -> String {
        format!("/users/{}/delete", segment(username))
    }

    pub fn add_feedback(username: &Username) -> String {
        format!("/users/{}/feedback/add", segment(username))
    }

    pub fn update_feedback(id: i64) -> String {
        format!("/feedback/{id}/update")
    }

    pub fn delete_feedback(id: i64) -> String {
        format!("/feedback/{id}/delete")
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, identity: Option<&Username>, flashes: &[Flash], body: &str) -> Html<String> {
    let nav = match identity {
        Some(me) => format!(
            r#"<a href="{}">{}</a> <a href="{}">Logout</a>"#,
            paths::user(me),
            escape(me.as_str()),
            paths::LOGOUT
        ),
        None => format!(
            r#"<a href="{}">Register</a> <a href="{}">Login</a>"#,
            paths::REGISTER,
            paths::LOGIN
        ),
    };

    let mut messages = String::new();
    for flash in flashes {
        let _ = write!(
            messages,
            r#"<div class="flash {}">{}</div>"#,
            flash.level.css_class(),
            escape(&flash.message)
        );
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<nav><a href="/">Home</a> {nav}</nav>
{messages}
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    ))
}

fn input(label: &str, name: &str, kind: &str, value: &str, errors: &FieldErrors) -> String {
    let error = errors
        .get(name)
        .map(|e| format!(r#"<span class="field-error">{}</span>"#, escape(e)))
        .unwrap_or_default();
    format!(
        r#"<p><label for="{name}">{label}</label> <input id="{name}" name="{name}" type="{kind}" value="{value}">{error}</p>"#,
        value = escape(value),
    )
}

fn textarea(label: &str, name: &str, value: &str, errors: &FieldErrors) -> String {
    let error = errors
        .get(name)
        .map(|e| format!(r#"<span class="field-error">{}</span>"#, escape(e)))
        .unwrap_or_default();
    format!(
        r#"<p><label for="{name}">{label}</label> <textarea id="{name}" name="{name}">{value}</textarea>{error}</p>"#,
        value = escape(value),
    )
}

// -- Accounts --

pub fn register(form: &RegisterForm, errors: &FieldErrors, flashes: &[Flash]) -> Html<String> {
    let body = format!(
        r#"<h1>Register</h1>
<form method="POST" action="{action}">
{username}
{password}
{email}
{first_name}
{last_name}
<button type="submit">Register</button>
</form>"#,
        action = paths::REGISTER,
        username = input("Username", "username", "text", &form.username, errors),
        password = input("Password", "password", "password", "", errors),
        email = input("Email", "email", "email", &form.email, errors),
        first_name = input("First Name", "first_name", "text", &form.first_name, errors),
        last_name = input("Last Name", "last_name", "text", &form.last_name, errors),
    );
    layout("Register", None, flashes, &body)
}

pub fn login(form: &LoginForm, errors: &FieldErrors, flashes: &[Flash]) -> Html<String> {
    let body = format!(
        r#"<h1>Login</h1>
<form method="POST" action="{action}">
{username}
{password}
<button type="submit">Login</button>
</form>"#,
        action = paths::LOGIN,
        username = input("Username", "username", "text", &form.username, errors),
        password = input("Password", "password", "password", "", errors),
    );
    layout("Login", None, flashes, &body)
}

pub fn profile(user: &User, feedback: &[Feedback], flashes: &[Flash]) -> Html<String> {
    let mut items = String::new();
    for fb in feedback {
        let _ = write!(
            items,
            r#"<li><strong>{title}</strong><p>{content}</p><a href="{edit}">Edit</a> <form method="POST" action="{delete}"><button type="submit">Delete</button></form></li>"#,
            title = escape(&fb.title),
            content = escape(&fb.content),
            edit = paths::update_feedback(fb.id),
            delete = paths::delete_feedback(fb.id),
        );
    }
    if items.is_empty() {
        items.push_str("<li>No feedback yet.</li>");
    }

    let body = format!(
        r#"<h1>{username}</h1>
<h2>Details</h2>
<ul>
<li>Name: {first} {last}</li>
<li>Contact: {email}</li>
</ul>
<h2>Feedback</h2>
<ul>
{items}
</ul>
<a href="{add}">Add feedback</a>
<form method="POST" action="{delete}"><button type="submit">Delete account</button></form>"#,
        username = escape(user.username.as_str()),
        first = escape(&user.first_name),
        last = escape(&user.last_name),
        email = escape(&user.email),
        add = paths::add_feedback(&user.username),
        delete = paths::delete_user(&user.username),
    );
    layout(user.username.as_str(), Some(&user.username), flashes, &body)
}

// -- Feedback --

pub fn add_feedback(
    owner: &Username,
    form: &FeedbackForm,
    errors: &FieldErrors,
    flashes: &[Flash],
) -> Html<String> {
    let body = format!(
        r#"<h1>Add feedback for {owner}</h1>
<form method="POST" action="{action}">
{title}
{content}
<button type="submit">Add</button>
</form>"#,
        owner = escape(owner.as_str()),
        action = paths::add_feedback(owner),
        title = input("Title", "title", "text", &form.title, errors),
        content = textarea("Content", "content", &form.content, errors),
    );
    layout("Add feedback", Some(owner), flashes, &body)
}

pub fn edit_feedback(
    feedback: &Feedback,
    form: &FeedbackForm,
    errors: &FieldErrors,
    flashes: &[Flash],
) -> Html<String> {
    let body = format!(
        r#"<h1>Edit feedback for {owner}</h1>
<form method="POST" action="{action}">
{title}
{content}
<button type="submit">Save</button>
</form>
<a href="{back}">Cancel</a>"#,
        owner = escape(feedback.owner.as_str()),
        action = paths::update_feedback(feedback.id),
        title = input("Title", "title", "text", &form.title, errors),
        content = textarea("Content", "content", &form.content, errors),
        back = paths::user(&feedback.owner),
    );
    layout("Edit feedback", Some(&feedback.owner), flashes, &body)
}

// -- Errors --

pub fn not_found() -> Html<String> {
    layout(
        "Not found",
        None,
        &[],
        r#"<h1>Oops!</h1><p>That page does not exist. <a href="/">Go home</a>.</p>"#,
    )
}

pub fn server_error() -> Html<String> {
    layout(
        "Error",
        None,
        &[],
        r#"<h1>Something went wrong</h1><p>Please try again later. <a href="/">Go home</a>.</p>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::Level;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("it's"), "it&#x27;s");
    }

    #[test]
    fn test_user_paths_percent_encode_the_name() {
        let name = Username::parse("o'neil jr").unwrap();
        assert_eq!(paths::user(&name), "/users/o%27neil%20jr");
        assert_eq!(paths::add_feedback(&name), "/users/o%27neil%20jr/feedback/add");
        let accented = Username::parse("josé").unwrap();
        assert_eq!(paths::delete_user(&accented), "/users/jos%C3%A9/delete");
    }

    #[test]
    fn test_login_page_has_no_registration_fields() {
        let Html(page) = login(&LoginForm::default(), &FieldErrors::default(), &[]);
        assert!(page.contains("Username"));
        assert!(page.contains("Password"));
        assert!(!page.contains("Email"));
        assert!(!page.contains("First Name"));
    }

    #[test]
    fn test_register_never_echoes_password() {
        let form = RegisterForm { password: "hunter2".into(), ..Default::default() };
        let Html(page) = register(&form, &FieldErrors::default(), &[]);
        assert!(!page.contains("hunter2"));
    }

    #[test]
    fn test_profile_escapes_feedback() {
        let owner = Username::parse("alice").unwrap();
        let user = User {
            username: owner.clone(),
            email: "alice@test.com".into(),
            first_name: "Alice".into(),
            last_name: "L".into(),
        };
        let feedback = vec![Feedback {
            id: 7,
            title: "<b>bold</b>".into(),
            content: "plain".into(),
            owner,
        }];
        let Html(page) = profile(&user, &feedback, &[Flash::new(Level::Success, "changes saved!")]);
        assert!(page.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(page.contains("/feedback/7/update"));
        assert!(page.contains("changes saved!"));
        assert!(page.contains("Details"));
    }
}
