//! Database row types that carry columns the public models must not expose.

/// Full `users` row, including the stored password hash.
pub struct UserRow {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Input for `Database::create_user`. `password_hash` is already hashed.
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}
