//! Delivery of verification codes and contact notifications.

mod emailjs;
mod log;
mod twilio;

pub use emailjs::EmailJsSender;
pub use log::LogSender;
pub use twilio::TwilioSender;

use crate::config::{SenderConfig, SenderKind};
use crate::error::ApiError;
use crate::identifier::Identifier;
use crate::store::ContactRecord;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Timeout for outbound provider calls.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can put a code in front of an admin.
#[async_trait]
pub trait CodeSender: Send + Sync {
    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;

    /// Deliver a verification code to the identifier.
    async fn send_code(&self, identifier: &Identifier, code: &str) -> Result<(), ApiError>;

    /// Tell the admins about a new contact submission.
    async fn notify_contact(&self, contact: &ContactRecord) -> Result<(), ApiError>;

    /// Whether the backend is configured well enough to deliver.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Build the sender selected in configuration.
pub fn from_config(config: &SenderConfig) -> Result<Arc<dyn CodeSender>, ApiError> {
    let sender: Arc<dyn CodeSender> = match config.kind {
        SenderKind::Log => Arc::new(LogSender),
        SenderKind::Twilio => Arc::new(TwilioSender::new(config.twilio.clone(), PROVIDER_TIMEOUT)?),
        SenderKind::Emailjs => {
            Arc::new(EmailJsSender::new(config.emailjs.clone(), PROVIDER_TIMEOUT)?)
        }
    };
    Ok(sender)
}

/// Split a full name into first and last parts ("Mary Ann Smith" → "Mary Ann", "Smith").
pub(crate) fn split_name(name: &str) -> (String, String) {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.split_last() {
        Some((last, rest)) if !rest.is_empty() => (rest.join(" "), (*last).to_string()),
        _ => (name.trim().to_string(), String::new()),
    }
}
