//! EmailJS REST sender.

use super::{split_name, CodeSender};
use crate::config::EmailJsConfig;
use crate::error::ApiError;
use crate::identifier::Identifier;
use crate::store::ContactRecord;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const RECIPIENT_NAME: &str = "Chanterelle member";

#[derive(Debug, Serialize)]
struct TemplateParams {
    to_name: String,
    destination: String,
    firstname: String,
    lastname: String,
    email: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: TemplateParams,
}

/// Sends codes and notifications as EmailJS template emails.
pub struct EmailJsSender {
    client: Client,
    config: EmailJsConfig,
}

impl EmailJsSender {
    pub fn new(config: EmailJsConfig, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    async fn send(&self, template_id: Option<&str>, params: TemplateParams) -> Result<(), ApiError> {
        let (Some(service_id), Some(template_id), Some(user_id)) = (
            self.config.service_id.as_deref(),
            template_id,
            self.config.user_id.as_deref(),
        ) else {
            return Err(ApiError::Delivery(
                "emailjs configuration is not complete".into(),
            ));
        };

        let request = SendRequest {
            service_id,
            template_id,
            user_id,
            access_token: self.config.access_token.as_ref().map(|t| t.expose_secret().as_str()),
            template_params: params,
        };

        let response = self
            .client
            .post(format!("{}/api/v1.0/email/send", self.config.api_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "EmailJS accepted message");
            Ok(())
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            warn!(%status, "EmailJS rejected message");
            Err(ApiError::Delivery(format!(
                "emailjs returned {}: {}",
                status.as_u16(),
                message
            )))
        }
    }
}

#[async_trait]
impl CodeSender for EmailJsSender {
    fn name(&self) -> &'static str {
        "emailjs"
    }

    #[instrument(skip(self, code), fields(identifier = %identifier))]
    async fn send_code(&self, identifier: &Identifier, code: &str) -> Result<(), ApiError> {
        let Identifier::Email(email) = identifier else {
            return Err(ApiError::Delivery(
                "emailjs can only deliver to email addresses".into(),
            ));
        };

        let params = TemplateParams {
            to_name: RECIPIENT_NAME.into(),
            destination: format!("Your verification code is: {}", code),
            firstname: String::new(),
            lastname: String::new(),
            email: email.clone(),
            message: "Please use this code to verify your admin access.".into(),
        };

        self.send(self.config.template_id.as_deref(), params).await?;
        info!("Verification code sent");
        Ok(())
    }

    #[instrument(skip(self, contact), fields(contact_id = contact.id))]
    async fn notify_contact(&self, contact: &ContactRecord) -> Result<(), ApiError> {
        let (firstname, lastname) = split_name(&contact.name);
        let params = TemplateParams {
            to_name: RECIPIENT_NAME.into(),
            destination: "New Contact Form Submission".into(),
            firstname,
            lastname,
            email: contact.email.clone(),
            message: contact.message.clone(),
        };

        let template_id = self
            .config
            .contact_template_id
            .as_deref()
            .or(self.config.template_id.as_deref());
        self.send(template_id, params).await
    }

    fn is_ready(&self) -> bool {
        self.config.service_id.is_some()
            && self.config.template_id.is_some()
            && self.config.user_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(mock_server: &MockServer) -> EmailJsConfig {
        EmailJsConfig {
            api_url: mock_server.uri(),
            service_id: Some("service_1".into()),
            template_id: Some("template_code".into()),
            contact_template_id: Some("template_contact".into()),
            user_id: Some("public_key".into()),
            access_token: Some(SecretString::new("private_key".into())),
        }
    }

    #[tokio::test]
    async fn test_send_code() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1.0/email/send"))
            .and(body_partial_json(serde_json::json!({
                "service_id": "service_1",
                "template_id": "template_code",
                "user_id": "public_key",
                "accessToken": "private_key",
                "template_params": {
                    "email": "band@example.com",
                    "destination": "Your verification code is: 482913"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let sender = EmailJsSender::new(test_config(&mock_server), Duration::from_secs(5)).unwrap();
        let identifier = Identifier::email("band@example.com").unwrap();

        sender.send_code(&identifier, "482913").await.unwrap();
    }

    #[tokio::test]
    async fn test_notify_contact_splits_name() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1.0/email/send"))
            .and(body_partial_json(serde_json::json!({
                "template_id": "template_contact",
                "template_params": {
                    "firstname": "Mary Ann",
                    "lastname": "Smith",
                    "email": "mary@example.com",
                    "message": "Booking inquiry"
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let sender = EmailJsSender::new(test_config(&mock_server), Duration::from_secs(5)).unwrap();
        let contact = ContactRecord {
            id: 7,
            name: "Mary Ann Smith".into(),
            email: "mary@example.com".into(),
            phone: None,
            message: "Booking inquiry".into(),
            created_at: Utc::now(),
        };

        sender.notify_contact(&contact).await.unwrap();
    }

    #[tokio::test]
    async fn test_incomplete_configuration() {
        let sender = EmailJsSender::new(EmailJsConfig::default(), Duration::from_secs(5)).unwrap();
        assert!(!sender.is_ready());

        let identifier = Identifier::email("band@example.com").unwrap();
        let result = sender.send_code(&identifier, "482913").await;
        assert!(matches!(result, Err(ApiError::Delivery(msg)) if msg.contains("not complete")));
    }
}
