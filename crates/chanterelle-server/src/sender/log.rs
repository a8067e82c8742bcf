//! Development sender that writes codes to the log.

use super::CodeSender;
use crate::error::ApiError;
use crate::identifier::Identifier;
use crate::store::ContactRecord;
use async_trait::async_trait;
use tracing::info;

/// Logs codes and notifications instead of delivering them.
pub struct LogSender;

#[async_trait]
impl CodeSender for LogSender {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send_code(&self, identifier: &Identifier, code: &str) -> Result<(), ApiError> {
        info!(identifier = %identifier, code = %code, "Verification code issued");
        Ok(())
    }

    async fn notify_contact(&self, contact: &ContactRecord) -> Result<(), ApiError> {
        info!(
            contact_id = contact.id,
            name = %contact.name,
            email = %contact.email,
            "New contact submission"
        );
        Ok(())
    }
}
