//! # jl-config
//!
//! Layered settings for the joke labeler: built-in defaults, then an optional
//! config file, then `JOKES_`-prefixed environment variables (after `.env`).

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use jl_core::TieBreak;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Default location of the optional config file, without extension.
pub const DEFAULT_CONFIG_FILE: &str = "config/joke-labeler";

/// Cookie signing keys are derived from the secret, which needs this many bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub session: SessionSettings,
    pub selection: SelectionSettings,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// When set, static files (the annotation front end) are served from `/`.
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct SessionSettings {
    pub secret_key: SecretString,
    pub cookie_name: String,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionSettings {
    pub tie_break: TieBreak,
}

impl Settings {
    /// Loads `.env`, then the file named by `JOKES_CONFIG` (or the default
    /// path), then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let file = std::env::var("JOKES_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        Self::from_sources(&file, None)
    }

    /// `env` replaces the process environment when given.
    pub fn from_sources(
        file: &str,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000_i64)?
            .set_default("database.url", "sqlite:jokes.db?mode=rwc")?
            .set_default("database.max_connections", 5_i64)?
            .set_default("session.cookie_name", "visitor_id")?
            .set_default("session.secure_cookie", false)?
            .set_default("selection.tie_break", "lowest_id")?
            .set_default("log_level", "info")?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("JOKES")
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        log::debug!(
            "configuration loaded (bind {}:{}, database {})",
            settings.server.host,
            settings.server.port,
            settings.database.url
        );
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret_key.expose_secret().len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "session.secret_key must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid("session.cookie_name is empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_apply() {
        let settings = Settings::from_sources(
            "does/not/exist",
            env(&[("JOKES_SESSION__SECRET_KEY", SECRET)]),
        )
        .unwrap();
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.session.cookie_name, "visitor_id");
        assert_eq!(settings.selection.tie_break, TieBreak::LowestId);
        assert!(settings.server.static_dir.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_sources(
            "does/not/exist",
            env(&[
                ("JOKES_SESSION__SECRET_KEY", SECRET),
                ("JOKES_SERVER__PORT", "8080"),
                ("JOKES_SELECTION__TIE_BREAK", "random"),
                ("JOKES_SESSION__SECURE_COOKIE", "true"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.bind_address(), ("127.0.0.1".to_string(), 8080));
        assert_eq!(settings.selection.tie_break, TieBreak::Random);
        assert!(settings.session.secure_cookie);
    }

    #[test]
    fn test_numeric_secret_is_kept_verbatim() {
        let digits = "0012345678901234567890123456789012345678";
        let settings = Settings::from_sources(
            "does/not/exist",
            env(&[("JOKES_SESSION__SECRET_KEY", digits)]),
        )
        .unwrap();
        assert_eq!(settings.session.secret_key.expose_secret(), digits);
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let err = Settings::from_sources(
            "does/not/exist",
            env(&[("JOKES_SESSION__SECRET_KEY", "too-short")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_secret_fails_to_load() {
        let err = Settings::from_sources("does/not/exist", env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
