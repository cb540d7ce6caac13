use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            username    TEXT PRIMARY KEY CHECK (length(username) <= 20),
            password    TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE CHECK (length(email) <= 50),
            first_name  TEXT NOT NULL CHECK (length(first_name) <= 30),
            last_name   TEXT NOT NULL CHECK (length(last_name) <= 30)
        );

        -- No ON DELETE CASCADE: removing a user and its feedback is an
        -- explicit transaction in queries::delete_user.
        CREATE TABLE IF NOT EXISTS feedback (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL CHECK (length(title) <= 100),
            content     TEXT NOT NULL,
            username    TEXT NOT NULL REFERENCES users(username)
        );

        CREATE INDEX IF NOT EXISTS idx_feedback_username
            ON feedback(username, id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
