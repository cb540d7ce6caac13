use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::{debug, warn};

use feedback_db::Database;
use feedback_db::models::NewUser;
use feedback_types::{Registration, User, Username};

use crate::error::AppError;

/// Create an account, storing an Argon2id hash of the password.
///
/// Conflicts surface as `AppError::Store(DbError::DuplicateKey { .. })`.
pub fn register(db: &Database, registration: &Registration) -> Result<User, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(registration.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?
        .to_string();

    let user = db.create_user(&NewUser {
        username: registration.username.as_str(),
        password_hash: &password_hash,
        email: &registration.email,
        first_name: &registration.first_name,
        last_name: &registration.last_name,
    })?;
    Ok(user)
}

/// `Some(user)` only if the password verifies. Unknown usernames, wrong
/// passwords, and unreadable stored hashes all give `None`.
pub fn authenticate(db: &Database, username: &str, password: &str) -> Result<Option<User>, AppError> {
    let Some(row) = db.get_user_credentials(username)? else {
        debug!("login attempt for unknown user");
        return Ok(None);
    };

    let parsed_hash = match PasswordHash::new(&row.password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("unreadable password hash for {}: {}", row.username, e);
            return Ok(None);
        }
    };

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Ok(None);
    }

    let username = Username::parse(&row.username)
        .map_err(|e| AppError::Internal(format!("corrupt username {:?}: {e}", row.username)))?;
    Ok(Some(User {
        username,
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback_db::DbError;

    fn registration(username: &str, password: &str) -> Registration {
        Registration {
            username: Username::parse(username).unwrap(),
            password: password.into(),
            email: format!("{username}@test.com"),
            first_name: "first".into(),
            last_name: "last".into(),
        }
    }

    #[test]
    fn test_register_never_stores_plaintext() {
        let db = Database::open_in_memory().unwrap();
        register(&db, &registration("alice", "pw1")).unwrap();
        let row = db.get_user_credentials("alice").unwrap().unwrap();
        assert_ne!(row.password, "pw1");
        assert!(row.password.starts_with("$argon2"));
    }

    #[test]
    fn test_authenticate_outcomes() {
        let db = Database::open_in_memory().unwrap();
        register(&db, &registration("alice", "pw1")).unwrap();

        let user = authenticate(&db, "alice", "pw1").unwrap().unwrap();
        assert_eq!(user.username.as_str(), "alice");

        assert!(authenticate(&db, "alice", "wrongpw").unwrap().is_none());
        assert!(authenticate(&db, "nobody", "pw1").unwrap().is_none());
        assert!(authenticate(&db, "alice", "").unwrap().is_none());
    }

    #[test]
    fn test_unreadable_stored_hash_fails_closed() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&NewUser {
            username: "eve",
            password_hash: "not a phc string",
            email: "eve@test.com",
            first_name: "Eve",
            last_name: "E",
        })
        .unwrap();

        assert!(authenticate(&db, "eve", "x").unwrap().is_none());
        assert!(authenticate(&db, "eve", "not a phc string").unwrap().is_none());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let db = Database::open_in_memory().unwrap();
        register(&db, &registration("alice", "secret")).unwrap();
        register(&db, &registration("bob", "secret")).unwrap();
        let a = db.get_user_credentials("alice").unwrap().unwrap();
        let b = db.get_user_credentials("bob").unwrap().unwrap();
        assert_ne!(a.password, b.password);
    }

    #[test]
    fn test_register_duplicate_username() {
        let db = Database::open_in_memory().unwrap();
        register(&db, &registration("alice", "pw1")).unwrap();
        let mut again = registration("alice", "pw2");
        again.email = "different@test.com".into();
        let err = register(&db, &again).unwrap_err();
        assert!(matches!(err, AppError::Store(DbError::DuplicateKey { field: "username" })));
    }
}
