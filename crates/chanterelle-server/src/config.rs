//! Configuration for the API server.

use crate::identifier::IdentifierKind;
use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Login and session token configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Contact and pending code storage
    #[serde(default)]
    pub store: StoreConfig,

    /// Code and notification delivery
    #[serde(default)]
    pub sender: SenderConfig,

    /// Audience subscription for contact submitters
    #[serde(default)]
    pub mailchimp: MailchimpConfig,

    /// Cross-origin configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for session tokens. Required at startup.
    pub token_secret: Option<SecretString>,

    /// Session token lifetime
    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub token_ttl: Duration,

    /// Verification code lifetime
    #[serde(default = "default_code_ttl", with = "humantime_serde")]
    pub code_ttl: Duration,

    /// Wrong guesses allowed per issued code
    #[serde(default = "default_max_attempts", deserialize_with = "deserialize_u32")]
    pub max_attempts: u32,

    /// Comma separated phone numbers allowed to log in
    #[serde(default)]
    pub admin_phone_numbers: String,

    /// Email address allowed to log in
    pub admin_email: Option<String>,

    /// Which identifier the login form collects
    #[serde(default)]
    pub identifier: IdentifierKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the JSON data file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Enable persistence (if false, data is in-memory only)
    #[serde(default = "default_true", deserialize_with = "deserialize_bool")]
    pub persist: bool,
}

/// Delivery backend for codes and contact notifications.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    /// Log codes instead of sending them
    #[default]
    Log,
    /// Twilio Messages API (SMS or WhatsApp)
    Twilio,
    /// EmailJS REST API
    Emailjs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SenderConfig {
    #[serde(default)]
    pub kind: SenderKind,

    #[serde(default)]
    pub twilio: TwilioConfig,

    #[serde(default)]
    pub emailjs: EmailJsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    /// API base URL
    #[serde(default = "default_twilio_api_url")]
    pub api_url: String,

    pub account_sid: Option<String>,

    pub auth_token: Option<SecretString>,

    /// Sender number, e.g. `+14155238886`
    pub from_number: Option<String>,

    /// Approved content template; plain body text is used when absent
    pub content_sid: Option<String>,

    /// Prefix both numbers with `whatsapp:`
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub whatsapp: bool,

    /// Where contact notifications go; notifications are skipped when absent
    pub notify_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailJsConfig {
    /// API base URL
    #[serde(default = "default_emailjs_api_url")]
    pub api_url: String,

    pub service_id: Option<String>,

    /// Template used for verification codes
    pub template_id: Option<String>,

    /// Template used for contact notifications; falls back to `template_id`
    pub contact_template_id: Option<String>,

    /// Public key
    pub user_id: Option<String>,

    /// Private key
    pub access_token: Option<SecretString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailchimpConfig {
    /// API key; its `-usNN` suffix names the datacenter
    pub api_key: Option<SecretString>,

    /// Audience list id
    pub list_id: Option<String>,

    /// Overrides the URL derived from the key's datacenter
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Comma separated origins; empty allows any origin
    #[serde(default)]
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm", deserialize_with = "deserialize_u32")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub json: bool,
}

/// Shortest accepted session token key, in bytes.
pub const MIN_TOKEN_SECRET_BYTES: usize = 32;

impl AuthConfig {
    /// The session token key, refused when missing or too short to sign with.
    pub fn signing_secret(&self) -> Result<SecretString> {
        let Some(secret) = self.token_secret.as_ref() else {
            bail!("AUTH__TOKEN_SECRET must be set");
        };
        let len = secret.expose_secret().trim().len();
        if len < MIN_TOKEN_SECRET_BYTES {
            bail!(
                "AUTH__TOKEN_SECRET must be at least {} bytes, got {}",
                MIN_TOKEN_SECRET_BYTES,
                len
            );
        }
        Ok(secret.clone())
    }

    /// Parsed admin phone allow-list.
    pub fn admin_phone_numbers(&self) -> Vec<String> {
        split_list(&self.admin_phone_numbers)
    }
}

impl CorsConfig {
    /// Parsed origin list.
    pub fn allowed_origins(&self) -> Vec<String> {
        split_list(&self.allowed_origins)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl: default_token_ttl(),
            code_ttl: default_code_ttl(),
            max_attempts: default_max_attempts(),
            admin_phone_numbers: String::new(),
            admin_email: None,
            identifier: IdentifierKind::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            persist: true,
        }
    }
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            api_url: default_twilio_api_url(),
            account_sid: None,
            auth_token: None,
            from_number: None,
            content_sid: None,
            whatsapp: false,
            notify_number: None,
        }
    }
}

impl Default for EmailJsConfig {
    fn default() -> Self {
        Self {
            api_url: default_emailjs_api_url(),
            service_id: None,
            template_id: None,
            contact_template_id: None,
            user_id: None,
            access_token: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_token_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_code_ttl() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_max_attempts() -> u32 {
    5
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/chanterelle.json")
}

fn default_true() -> bool {
    true
}

fn default_twilio_api_url() -> String {
    "https://api.twilio.com".into()
}

fn default_emailjs_api_url() -> String {
    "https://api.emailjs.com".into()
}

fn default_global_rpm() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".into()
}

// `try_parsing(false)` hands every value over as a string, so numeric and
// boolean fields accept their textual form as well.
fn deserialize_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn deserialize_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid boolean: {other}"))),
        },
    }
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
