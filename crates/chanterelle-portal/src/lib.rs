//! Front-end flows for the Chanterelle site.
//!
//! Everything here talks to the API through [`chanterelle_client`]:
//!
//! - [`VerificationRequestor`] asks for a login code.
//! - [`CodeEntry`] collects the code and trades it for a session token.
//! - [`AdminViewer`] lists contacts with that token.
//! - [`ContactForm`] is the public contact form.
//!
//! Session state lives in a [`SessionContext`] shared between the flows and
//! persisted to disk so a login survives restarts.

pub mod code_entry;
pub mod contact_form;
pub mod error;
pub mod inflight;
pub mod requestor;
pub mod routes;
pub mod session;
pub mod viewer;

pub use code_entry::{
    AutoSubmit, CodeEntry, CodeEntryOptions, CodeEntrySnapshot, CodeValidation, Focus,
    InputEffect, Phase, SubmitOutcome, CODE_LENGTH,
};
pub use chanterelle_client::FieldError;
pub use contact_form::{validate, ContactDraft, ContactField, ContactForm, FormOutcome};
pub use error::PortalError;
pub use requestor::{RequestOutcome, VerificationRequestor};
pub use routes::Route;
pub use session::{LoginVariant, SessionContext, SessionKey, SessionStore};
pub use viewer::{format_local, AdminViewer, ContactRow, ViewOutcome, ViewerState};

#[cfg(test)]
mod tests {
    use super::*;
    use chanterelle_client::ChanterelleClient;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Request a code, enter it, then open the dashboard.
    #[tokio::test]
    async fn test_login_to_dashboard() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/send-verification"))
            .and(body_json(serde_json::json!({ "email": "band@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "If the email was valid, you'll receive a verification code"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/verify-code"))
            .and(body_json(serde_json::json!({
                "email": "band@example.com",
                "code": "482913"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "v1.session.sig",
                "expires_at": "2026-10-20T09:00:00Z"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/contacts"))
            .and(header("authorization", "Bearer v1.session.sig"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": 1,
                "total": 0,
                "contacts": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session_path = dir.path().join("session.json");
        let client = ChanterelleClient::new(mock_server.uri(), Duration::from_secs(5)).unwrap();
        let session = Arc::new(SessionContext::new(
            SessionStore::open(session_path.clone()).await.unwrap(),
            LoginVariant::Email,
        ));

        let requestor = VerificationRequestor::new(client.clone(), session.clone());
        assert_eq!(
            requestor.submit("band@example.com").await.unwrap(),
            RequestOutcome::CodeSent(Route::Verify)
        );

        let entry = CodeEntry::new(client.clone(), session.clone(), CodeEntryOptions::default());
        for (i, digit) in "482913".chars().enumerate() {
            entry.enter(i, &digit.to_string());
        }
        assert_eq!(entry.snapshot().focus, Focus::Submit);
        assert_eq!(
            entry.submit().await.unwrap(),
            SubmitOutcome::Authenticated(Route::Admin)
        );
        assert_eq!(session.guard(Route::Admin), Route::Admin);

        // token survives a restart
        let reopened = SessionContext::new(
            SessionStore::open(session_path).await.unwrap(),
            LoginVariant::Email,
        );
        assert_eq!(reopened.token().as_deref(), Some("v1.session.sig"));

        let viewer = AdminViewer::new(client, session);
        assert_eq!(viewer.activate().await, ViewOutcome::Loaded(0));
    }
}
