//! Load demo accounts and feedback into the configured database.
//!
//! Safe to run repeatedly: users that already exist are left untouched.

use std::path::PathBuf;

use tracing::info;

use feedback_api::{AppError, credentials};
use feedback_db::{Database, DbError};
use feedback_types::{Registration, Username};

struct DemoUser {
    username: &'static str,
    first_name: &'static str,
    feedback: &'static [(&'static str, &'static str)],
}

const DEMO_PASSWORD: &str = "secret";

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        username: "tony",
        first_name: "tony1",
        feedback: &[("testtitle1", "testcontent1"), ("testtitle2", "testcontent2")],
    },
    DemoUser {
        username: "nessa",
        first_name: "nessa",
        feedback: &[],
    },
];

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedback_seed=info,feedback_db=info".into()),
        )
        .init();

    let db_path: PathBuf = std::env::var("FEEDBACK_DB_PATH")
        .unwrap_or_else(|_| "feedback.db".into())
        .into();
    let db = Database::open(&db_path)?;

    for demo in DEMO_USERS {
        let username = Username::parse(demo.username)?;
        let registration = Registration {
            username: username.clone(),
            password: DEMO_PASSWORD.into(),
            email: format!("{}@test.com", demo.username),
            first_name: demo.first_name.into(),
            last_name: "touch".into(),
        };

        match credentials::register(&db, &registration) {
            Ok(_) => info!("Created user {}", username),
            Err(AppError::Store(DbError::DuplicateKey { field })) => {
                info!("Skipping {}: {} already taken", username, field);
                continue;
            }
            Err(e) => return Err(anyhow::anyhow!("failed to create {}: {}", username, e)),
        }

        for (title, content) in demo.feedback {
            let fb = db.create_feedback(&username, title, content)?;
            info!("Created feedback {} for {}", fb.id, username);
        }
    }

    info!("Seeded {}", db_path.display());
    Ok(())
}
