use feedback_types::{Feedback, User, Username};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use crate::models::{NewUser, UserRow};
use crate::{Database, DbError};

impl Database {
    // -- Users --

    /// Insert a user. The username and email uniqueness checks run inside
    /// the insert transaction so the conflicting field can be reported.
    pub fn create_user(&self, new: &NewUser<'_>) -> Result<User, DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if user_exists(&tx, new.username)? {
                return Err(DbError::DuplicateKey { field: "username" });
            }
            let email_taken = tx
                .query_row("SELECT 1 FROM users WHERE email = ?1", [new.email], |_| Ok(()))
                .optional()?
                .is_some();
            if email_taken {
                return Err(DbError::DuplicateKey { field: "email" });
            }

            tx.execute(
                "INSERT INTO users (username, password, email, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (new.username, new.password_hash, new.email, new.first_name, new.last_name),
            )?;
            let user = query_user(&tx, new.username)?.ok_or(DbError::NotFound)?;
            tx.commit()?;
            Ok(user)
        })
    }

    pub fn get_user(&self, username: &Username) -> Result<Option<User>, DbError> {
        self.with_conn(|conn| query_user(conn, username.as_str()))
    }

    /// Row including the password hash, for credential checks only.
    pub fn get_user_credentials(&self, username: &str) -> Result<Option<UserRow>, DbError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT username, password, email, first_name, last_name
                     FROM users WHERE username = ?1",
                    [username],
                    |row| {
                        Ok(UserRow {
                            username: row.get(0)?,
                            password: row.get(1)?,
                            email: row.get(2)?,
                            first_name: row.get(3)?,
                            last_name: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn user_exists(&self, username: &Username) -> Result<bool, DbError> {
        self.with_conn(|conn| user_exists(conn, username.as_str()))
    }

    /// Delete a user together with every feedback item it owns, in one
    /// transaction. Returns the number of feedback rows removed.
    pub fn delete_user(&self, username: &Username) -> Result<usize, DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM feedback WHERE username = ?1", [username.as_str()])?;
            let users = tx.execute("DELETE FROM users WHERE username = ?1", [username.as_str()])?;
            if users == 0 {
                // Dropping the transaction rolls back the feedback delete.
                return Err(DbError::NotFound);
            }
            tx.commit()?;
            debug!("Deleted user {} and {} feedback item(s)", username, removed);
            Ok(removed)
        })
    }

    // -- Feedback --

    /// Fails with `NotFound` when the owner does not exist.
    pub fn create_feedback(
        &self,
        owner: &Username,
        title: &str,
        content: &str,
    ) -> Result<Feedback, DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if !user_exists(&tx, owner.as_str())? {
                return Err(DbError::NotFound);
            }
            tx.execute(
                "INSERT INTO feedback (title, content, username) VALUES (?1, ?2, ?3)",
                (title, content, owner.as_str()),
            )?;
            let id = tx.last_insert_rowid();
            let feedback = query_feedback(&tx, id)?.ok_or(DbError::NotFound)?;
            tx.commit()?;
            Ok(feedback)
        })
    }

    pub fn get_feedback(&self, id: i64) -> Result<Option<Feedback>, DbError> {
        self.with_conn(|conn| query_feedback(conn, id))
    }

    pub fn list_feedback_for_user(&self, owner: &Username) -> Result<Vec<Feedback>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, username FROM feedback
                 WHERE username = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([owner.as_str()], feedback_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_feedback_for_user(&self, owner: &Username) -> Result<u64, DbError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM feedback WHERE username = ?1",
                [owner.as_str()],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }

    pub fn update_feedback(&self, id: i64, title: &str, content: &str) -> Result<Feedback, DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE feedback SET title = ?1, content = ?2 WHERE id = ?3",
                (title, content, id),
            )?;
            if changed == 0 {
                return Err(DbError::NotFound);
            }
            let feedback = query_feedback(&tx, id)?.ok_or(DbError::NotFound)?;
            tx.commit()?;
            Ok(feedback)
        })
    }

    pub fn delete_feedback(&self, id: i64) -> Result<(), DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM feedback WHERE id = ?1", [id])?;
            if removed == 0 {
                return Err(DbError::NotFound);
            }
            tx.commit()?;
            Ok(())
        })
    }
}

fn user_exists(conn: &Connection, username: &str) -> Result<bool, DbError> {
    let found = conn
        .query_row("SELECT 1 FROM users WHERE username = ?1", [username], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<User>, DbError> {
    let row = conn
        .query_row(
            "SELECT username, email, first_name, last_name FROM users WHERE username = ?1",
            [username],
            |row| {
                Ok(User {
                    username: username_at(row, 0)?,
                    email: row.get(1)?,
                    first_name: row.get(2)?,
                    last_name: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

fn query_feedback(conn: &Connection, id: i64) -> Result<Option<Feedback>, DbError> {
    let row = conn
        .query_row(
            "SELECT id, title, content, username FROM feedback WHERE id = ?1",
            [id],
            feedback_from_row,
        )
        .optional()?;
    Ok(row)
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        owner: username_at(row, 3)?,
    })
}

/// Stored usernames were validated on insert; anything else is a corrupt row.
fn username_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Username> {
    let raw: String = row.get(idx)?;
    Username::parse(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> Username {
        Username::parse(raw).unwrap()
    }

    fn seed_user(db: &Database, username: &str) -> User {
        let email = format!("{username}@test.com");
        db.create_user(&NewUser {
            username,
            password_hash: "$argon2id$not-a-real-hash",
            email: &email,
            first_name: "first",
            last_name: "last",
        })
        .unwrap()
    }

    #[test]
    fn test_create_and_get_user() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "alice");
        assert_eq!(user.username, name("alice"));
        assert_eq!(db.get_user(&name("alice")).unwrap(), Some(user));
        assert!(db.get_user(&name("nobody")).unwrap().is_none());

        let creds = db.get_user_credentials("alice").unwrap().unwrap();
        assert_eq!(creds.password, "$argon2id$not-a-real-hash");
    }

    #[test]
    fn test_duplicate_username_and_email() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "alice");

        let dup_name = db.create_user(&NewUser {
            username: "alice",
            password_hash: "h",
            email: "other@test.com",
            first_name: "f",
            last_name: "l",
        });
        assert!(matches!(dup_name, Err(DbError::DuplicateKey { field: "username" })));

        let dup_email = db.create_user(&NewUser {
            username: "bob",
            password_hash: "h",
            email: "alice@test.com",
            first_name: "f",
            last_name: "l",
        });
        assert!(matches!(dup_email, Err(DbError::DuplicateKey { field: "email" })));
        assert!(!db.user_exists(&name("bob")).unwrap());
    }

    #[test]
    fn test_feedback_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "alice");
        let alice = name("alice");

        let fb = db.create_feedback(&alice, "t1", "first").unwrap();
        assert_eq!(fb.owner, alice);
        assert_eq!(db.get_feedback(fb.id).unwrap().as_ref(), Some(&fb));

        let updated = db.update_feedback(fb.id, "t1 edited", "second").unwrap();
        assert_eq!(updated.id, fb.id);
        assert_eq!(updated.title, "t1 edited");
        assert_eq!(updated.content, "second");

        db.delete_feedback(fb.id).unwrap();
        assert!(db.get_feedback(fb.id).unwrap().is_none());
        assert!(matches!(db.delete_feedback(fb.id), Err(DbError::NotFound)));
        assert!(matches!(db.update_feedback(fb.id, "x", "y"), Err(DbError::NotFound)));
    }

    #[test]
    fn test_feedback_requires_existing_owner() {
        let db = Database::open_in_memory().unwrap();
        let result = db.create_feedback(&name("ghost"), "t", "c");
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[test]
    fn test_list_is_scoped_to_owner() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "alice");
        seed_user(&db, "bob");
        let first = db.create_feedback(&name("alice"), "a1", "c").unwrap();
        db.create_feedback(&name("bob"), "b1", "c").unwrap();
        let second = db.create_feedback(&name("alice"), "a2", "c").unwrap();

        let listed = db.list_feedback_for_user(&name("alice")).unwrap();
        assert_eq!(listed, vec![first, second]);
        assert_eq!(db.count_feedback_for_user(&name("bob")).unwrap(), 1);
    }

    #[test]
    fn test_delete_user_cascades_to_own_feedback_only() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "alice");
        seed_user(&db, "bob");
        let alice = name("alice");
        let bob = name("bob");
        for i in 0..3 {
            db.create_feedback(&alice, &format!("a{i}"), "c").unwrap();
        }
        db.create_feedback(&bob, "b", "c").unwrap();
        assert_eq!(db.count_feedback_for_user(&alice).unwrap(), 3);

        assert_eq!(db.delete_user(&alice).unwrap(), 3);
        assert_eq!(db.count_feedback_for_user(&alice).unwrap(), 0);
        assert!(!db.user_exists(&alice).unwrap());
        assert_eq!(db.count_feedback_for_user(&bob).unwrap(), 1);

        assert!(matches!(db.delete_user(&alice), Err(DbError::NotFound)));
    }

    #[test]
    fn test_open_file_database() {
        let path = std::env::temp_dir().join(format!("feedback_db_test_{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        {
            let db = Database::open(&path).unwrap();
            seed_user(&db, "alice");
        }
        let reopened = Database::open(&path).unwrap();
        assert!(reopened.user_exists(&name("alice")).unwrap());
        drop(reopened);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
