use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,

    /// A unique column already holds the submitted value.
    #[error("{field} is already taken")]
    DuplicateKey { field: &'static str },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,
}
