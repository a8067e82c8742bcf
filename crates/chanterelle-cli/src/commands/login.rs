//! Login command - requests a verification code.

use crate::commands::{CommandHandler, Site};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chanterelle_portal::{LoginVariant, RequestOutcome, VerificationRequestor};
use tracing::info;

pub struct LoginHandler {
    identifier: String,
}

impl LoginHandler {
    pub fn new(identifier: String) -> Self {
        Self { identifier }
    }
}

#[async_trait]
impl CommandHandler for LoginHandler {
    fn name(&self) -> &str {
        "login"
    }

    async fn execute(&self, site: &Site) -> AppResult<String> {
        let requestor = VerificationRequestor::new(site.client.clone(), site.session.clone());

        match requestor.submit(&self.identifier).await? {
            RequestOutcome::CodeSent(next) => {
                info!(route = %next, "Waiting for code");
                Ok(format!(
                    "Verification code requested. Continue with `chanterelle verify` ({next})."
                ))
            }
            RequestOutcome::Disabled => Err(AppError::Rejected(
                match site.session.variant() {
                    LoginVariant::Phone => "Phone number must start with +1 and be 12 characters",
                    LoginVariant::Email => "Email is required",
                }
                .into(),
            )),
            RequestOutcome::Failed(message) => Err(AppError::Rejected(message)),
            RequestOutcome::Ignored => Err(AppError::Rejected(
                "A code request is already in progress".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::site;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_unprefixed_phone_is_refused_locally() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/send-verification"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = LoginHandler::new("8025551234".into())
            .execute(&site(&mock_server, LoginVariant::Phone))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("+1"));
    }

    #[tokio::test]
    async fn test_code_requested() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/send-verification"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "If the email was valid, you'll receive a verification code"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let site = site(&mock_server, LoginVariant::Email);
        let output = LoginHandler::new("band@example.com".into())
            .execute(&site)
            .await
            .unwrap();

        assert!(output.contains("/verify"));
        assert!(site.session.pending_identifier().is_some());
    }
}
