//! Contact command - submits the public contact form.

use crate::commands::{CommandHandler, Site};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chanterelle_portal::{ContactDraft, ContactForm, FormOutcome};

pub struct ContactHandler {
    draft: ContactDraft,
}

impl ContactHandler {
    pub fn new(draft: ContactDraft) -> Self {
        Self { draft }
    }
}

#[async_trait]
impl CommandHandler for ContactHandler {
    fn name(&self) -> &str {
        "contact"
    }

    async fn execute(&self, site: &Site) -> AppResult<String> {
        let form = ContactForm::new(site.client.clone(), true);
        form.set_draft(self.draft.clone());

        match form.submit().await {
            FormOutcome::Sent(banner) => Ok(banner),
            FormOutcome::Invalid(errors) => Err(AppError::Rejected(
                errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )),
            FormOutcome::Failed(banner) => Err(AppError::Rejected(banner)),
            FormOutcome::Ignored => Err(AppError::Rejected(
                "A submission is already in progress".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::site;
    use chanterelle_portal::LoginVariant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_field_errors_are_listed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contacts"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&mock_server)
            .await;

        let handler = ContactHandler::new(ContactDraft {
            name: "A".into(),
            email: "not-an-email".into(),
            phone: "12".into(),
            message: String::new(),
        });
        let err = handler
            .execute(&site(&mock_server, LoginVariant::Phone))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "name: Name must be at least 2 characters\n\
             email: Email must be valid\n\
             phone: Phone must be between 7 and 20 characters"
        );
    }

    #[tokio::test]
    async fn test_success_banner() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contacts"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "message": "Your message has been sent successfully!"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let handler = ContactHandler::new(ContactDraft {
            name: "Al".into(),
            email: "al@example.com".into(),
            ..Default::default()
        });
        let banner = handler
            .execute(&site(&mock_server, LoginVariant::Phone))
            .await
            .unwrap();
        assert_eq!(banner, "Your message has been sent successfully!");
    }
}
