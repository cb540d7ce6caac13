use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use feedback_api::SessionSettings;
use feedback_api::state::MIN_SECRET_LEN;

/// Placeholder session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "oh-so-secret",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub session: SessionSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = lookup("FEEDBACK_SESSION_SECRET").unwrap_or_default();
        if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
            bail!("FEEDBACK_SESSION_SECRET is unset or still a placeholder");
        }
        if secret.len() < MIN_SECRET_LEN {
            bail!("FEEDBACK_SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes");
        }

        let host = lookup("FEEDBACK_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("FEEDBACK_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("FEEDBACK_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {host}:{port}"))?;

        let db_path: PathBuf = lookup("FEEDBACK_DB_PATH")
            .unwrap_or_else(|| "feedback.db".into())
            .into();

        let session_hours: i64 = lookup("FEEDBACK_SESSION_HOURS")
            .map(|v| v.parse())
            .transpose()
            .context("FEEDBACK_SESSION_HOURS must be a whole number")?
            .unwrap_or(24);
        if session_hours <= 0 {
            bail!("FEEDBACK_SESSION_HOURS must be positive");
        }

        let secure_cookies = lookup("FEEDBACK_SECURE_COOKIES")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            addr,
            db_path,
            session: SessionSettings {
                secret,
                lifetime: chrono::Duration::hours(session_hours),
                secure_cookies,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("FEEDBACK_SESSION_SECRET", SECRET)]).unwrap();
        assert_eq!(cfg.addr, "0.0.0.0:5000".parse().unwrap());
        assert_eq!(cfg.db_path, PathBuf::from("feedback.db"));
        assert_eq!(cfg.session.lifetime, chrono::Duration::hours(24));
        assert!(!cfg.session.secure_cookies);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("FEEDBACK_SESSION_SECRET", SECRET),
            ("FEEDBACK_HOST", "127.0.0.1"),
            ("FEEDBACK_PORT", "8080"),
            ("FEEDBACK_DB_PATH", "/tmp/fb.db"),
            ("FEEDBACK_SESSION_HOURS", "2"),
            ("FEEDBACK_SECURE_COOKIES", "true"),
        ])
        .unwrap();
        assert_eq!(cfg.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/fb.db"));
        assert_eq!(cfg.session.lifetime, chrono::Duration::hours(2));
        assert!(cfg.session.secure_cookies);
    }

    #[test]
    fn test_rejects_missing_or_placeholder_secret() {
        assert!(config(&[]).is_err());
        assert!(config(&[("FEEDBACK_SESSION_SECRET", "oh-so-secret")]).is_err());
        assert!(config(&[("FEEDBACK_SESSION_SECRET", "short")]).is_err());
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(config(&[("FEEDBACK_SESSION_SECRET", SECRET), ("FEEDBACK_PORT", "http")]).is_err());
        assert!(
            config(&[("FEEDBACK_SESSION_SECRET", SECRET), ("FEEDBACK_SESSION_HOURS", "0")]).is_err()
        );
    }
}
