//! Twilio Messages API sender (SMS or WhatsApp).

use super::CodeSender;
use crate::config::TwilioConfig;
use crate::error::ApiError;
use crate::identifier::Identifier;
use crate::store::ContactRecord;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Sends codes through Twilio.
pub struct TwilioSender {
    client: Client,
    config: TwilioConfig,
}

impl TwilioSender {
    pub fn new(config: TwilioConfig, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn address(&self, number: &str) -> String {
        if self.config.whatsapp {
            format!("whatsapp:{}", number)
        } else {
            number.to_string()
        }
    }

    /// Post one message to the Messages endpoint.
    ///
    /// With a content template configured, `variable` fills slot `1`;
    /// otherwise `body` is sent as plain text.
    async fn post_message(&self, to: &str, body: &str, variable: &str) -> Result<(), ApiError> {
        let (Some(sid), Some(token), Some(from)) = (
            self.config.account_sid.as_deref(),
            self.config.auth_token.as_ref(),
            self.config.from_number.as_deref(),
        ) else {
            return Err(ApiError::Delivery(
                "twilio configuration is not complete".into(),
            ));
        };

        let mut form: Vec<(&str, String)> = vec![("To", self.address(to)), ("From", self.address(from))];
        match self.config.content_sid.as_deref() {
            Some(content_sid) => {
                form.push(("ContentSid", content_sid.to_string()));
                form.push((
                    "ContentVariables",
                    serde_json::json!({ "1": variable }).to_string(),
                ));
            }
            None => form.push(("Body", body.to_string())),
        }

        let response = self
            .client
            .post(format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                self.config.api_url, sid
            ))
            .basic_auth(sid, Some(token.expose_secret()))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "Twilio accepted message");
            Ok(())
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            warn!(%status, "Twilio rejected message");
            Err(ApiError::Delivery(format!(
                "twilio returned {}: {}",
                status.as_u16(),
                message
            )))
        }
    }
}

#[async_trait]
impl CodeSender for TwilioSender {
    fn name(&self) -> &'static str {
        "twilio"
    }

    #[instrument(skip(self, code), fields(identifier = %identifier))]
    async fn send_code(&self, identifier: &Identifier, code: &str) -> Result<(), ApiError> {
        let Identifier::Phone(number) = identifier else {
            return Err(ApiError::Delivery(
                "twilio can only deliver to phone numbers".into(),
            ));
        };

        let body = format!("Your Chanterelle verification code is: {}", code);
        self.post_message(number, &body, code).await?;
        info!("Verification code sent");
        Ok(())
    }

    #[instrument(skip(self, contact), fields(contact_id = contact.id))]
    async fn notify_contact(&self, contact: &ContactRecord) -> Result<(), ApiError> {
        let Some(notify_number) = self.config.notify_number.as_deref() else {
            debug!("No notification number configured, skipping");
            return Ok(());
        };

        let body = format!(
            "New contact from {} <{}>: {}",
            contact.name, contact.email, contact.message
        );
        self.post_message(notify_number, &body, &contact.name).await
    }

    fn is_ready(&self) -> bool {
        self.config.account_sid.is_some()
            && self.config.auth_token.is_some()
            && self.config.from_number.is_some()
    }
}
