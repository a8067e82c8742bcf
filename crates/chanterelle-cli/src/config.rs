//! CLI configuration loaded from environment variables.

use anyhow::{Context, Result};
use chanterelle_portal::{CodeValidation, LoginVariant};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Site API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Where the login session is kept
    #[serde(default)]
    pub session: SessionConfig,

    /// Login flow configuration
    #[serde(default)]
    pub login: LoginConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session file path
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginConfig {
    /// Identifier collected at login (`phone` or `email`)
    #[serde(default)]
    pub variant: LoginVariant,

    /// Local check on the code before it is sent (`numeric` or `length`)
    #[serde(default)]
    pub code_check: CodeCheck,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeCheck {
    #[default]
    Numeric,
    Length,
}

impl From<CodeCheck> for CodeValidation {
    fn from(check: CodeCheck) -> Self {
        match check {
            CodeCheck::Numeric => CodeValidation::Numeric,
            CodeCheck::Length => CodeValidation::LengthOnly,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_session_path() -> PathBuf {
    PathBuf::from(".chanterelle/session.json")
}

fn default_log_level() -> String {
    "warn".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.login.variant, LoginVariant::Phone);
        assert_eq!(
            CodeValidation::from(config.login.code_check),
            CodeValidation::Numeric
        );
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_overrides() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "api": { "base_url": "https://chanterelle.band", "timeout": "3s" },
            "session": { "path": "/tmp/chanterelle.json" },
            "login": { "variant": "email", "code_check": "length" }
        }))
        .unwrap();

        assert_eq!(config.api.timeout, Duration::from_secs(3));
        assert_eq!(config.session.path, PathBuf::from("/tmp/chanterelle.json"));
        assert_eq!(config.login.variant, LoginVariant::Email);
        assert_eq!(
            CodeValidation::from(config.login.code_check),
            CodeValidation::LengthOnly
        );
    }
}
