use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::warn;

use feedback_types::Username;

use crate::flash::{self, Level};
use crate::views::paths;

/// Outcome of an ownership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Logged in as someone else; send them to their own page.
    DenyRedirectToSelf(Username),
    /// Not logged in.
    DenyRedirectToHome,
}

/// Only the owner of a resource may see or change it.
///
/// For feedback, `owner` must come from the stored row, never from the URL.
pub fn decide(identity: Option<&Username>, owner: &Username) -> Decision {
    match identity {
        None => Decision::DenyRedirectToHome,
        Some(me) if me == owner => Decision::Allow,
        Some(me) => Decision::DenyRedirectToSelf(me.clone()),
    }
}

/// Turn a decision into "carry on" or the redirect that ends the request.
/// `self_target` maps the caller's own username to where a denied caller
/// lands; `message` is flashed on that page.
pub fn enforce(
    decision: Decision,
    jar: &SignedCookieJar,
    self_target: impl FnOnce(&Username) -> String,
    message: Option<String>,
) -> Result<(), Response> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::DenyRedirectToHome => Err(Redirect::to(paths::HOME).into_response()),
        Decision::DenyRedirectToSelf(me) => {
            warn!("{} denied access to a resource they do not own", me);
            let jar = match message {
                Some(message) => flash::push(jar.clone(), Level::Error, message),
                None => jar.clone(),
            };
            Err((jar, Redirect::to(&self_target(&me))).into_response())
        }
    }
}

/// Ownership check for routes that name the owner in the URL. Returns the
/// owner only when the caller is that owner.
///
/// A path segment that is not a valid username is owned by nobody, so it gets
/// the same outcome as someone else's page rather than a bare 400.
pub fn enforce_path_owner(
    identity: Option<&Username>,
    raw_owner: &str,
    jar: &SignedCookieJar,
    self_target: impl FnOnce(&Username) -> String,
    message: Option<String>,
) -> Result<Username, Response> {
    let decision = match Username::parse(raw_owner) {
        Ok(owner) => decide(identity, &owner),
        Err(_) => match identity {
            None => Decision::DenyRedirectToHome,
            Some(me) => Decision::DenyRedirectToSelf(me.clone()),
        },
    };
    enforce(decision, jar, self_target, message)?;
    identity
        .cloned()
        .ok_or_else(|| Redirect::to(paths::HOME).into_response())
}
