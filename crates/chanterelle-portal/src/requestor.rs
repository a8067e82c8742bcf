//! Identifier collection and the "send code" request.

use crate::error::PortalError;
use crate::inflight::InFlight;
use crate::routes::Route;
use crate::session::SessionContext;
use chanterelle_client::ChanterelleClient;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

const SEND_FAILED: &str = "Failed to send verification code";

/// Result of submitting an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Code requested; continue to code entry.
    CodeSent(Route),
    /// The request failed. The identifier stays persisted for a retry.
    Failed(String),
    /// Input does not pass the variant's shape check; nothing was sent.
    Disabled,
    /// Another request is already in flight.
    Ignored,
}

/// Collects an admin identifier and asks the server to send a code.
pub struct VerificationRequestor {
    client: ChanterelleClient,
    session: Arc<SessionContext>,
    in_flight: InFlight,
    last_error: Mutex<Option<String>>,
}

impl VerificationRequestor {
    pub fn new(client: ChanterelleClient, session: Arc<SessionContext>) -> Self {
        Self {
            client,
            session,
            in_flight: InFlight::new(),
            last_error: Mutex::new(None),
        }
    }

    /// Whether the send control is enabled for `input`.
    pub fn can_submit(&self, input: &str) -> bool {
        !self.in_flight.is_active() && self.session.variant().accepts(input)
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.is_active()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Persist the identifier, then request a code for it.
    #[instrument(skip(self, input))]
    pub async fn submit(&self, input: &str) -> Result<RequestOutcome, PortalError> {
        let variant = self.session.variant();
        if !variant.accepts(input) {
            return Ok(RequestOutcome::Disabled);
        }

        let Some(_guard) = self.in_flight.try_begin() else {
            return Ok(RequestOutcome::Ignored);
        };

        let identifier = variant.identifier(input);
        self.session.set_pending_identifier(&identifier).await?;

        match self.client.send_verification(&identifier).await {
            Ok(_) => {
                info!(identifier = %identifier, "Verification code requested");
                self.set_error(None);
                Ok(RequestOutcome::CodeSent(Route::Verify))
            }
            Err(e) => {
                warn!(identifier = %identifier, error = %e, "Verification request failed");
                let message = e.server_message().unwrap_or(SEND_FAILED).to_string();
                self.set_error(Some(message.clone()));
                Ok(RequestOutcome::Failed(message))
            }
        }
    }

    fn set_error(&self, error: Option<String>) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{LoginVariant, SessionStore};
    use chanterelle_client::Identifier;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn requestor(server: &MockServer, variant: LoginVariant) -> VerificationRequestor {
        let client = ChanterelleClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let session = Arc::new(SessionContext::new(SessionStore::memory(), variant));
        VerificationRequestor::new(client, session)
    }

    #[tokio::test]
    async fn test_sends_once_and_persists_identifier() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/send-verification"))
            .and(body_json(serde_json::json!({ "phone_number": "+18025551234" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "If the phone number is registered, you'll receive a verification code"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let requestor = requestor(&mock_server, LoginVariant::Phone);
        assert!(requestor.can_submit("+18025551234"));

        let outcome = requestor.submit("+18025551234").await.unwrap();
        assert_eq!(outcome, RequestOutcome::CodeSent(Route::Verify));
        assert_eq!(
            requestor.session.pending_identifier(),
            Some(Identifier::PhoneNumber("+18025551234".into()))
        );
    }

    #[tokio::test]
    async fn test_unprefixed_phone_is_disabled() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/send-verification"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let requestor = requestor(&mock_server, LoginVariant::Phone);
        assert!(!requestor.can_submit("8025551234"));
        assert_eq!(
            requestor.submit("8025551234").await.unwrap(),
            RequestOutcome::Disabled
        );
        assert!(requestor.session.pending_identifier().is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_identifier() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/send-verification"))
            .respond_with(ResponseTemplate::new(502).set_body_json(serde_json::json!({
                "error": "Could not deliver verification code",
                "code": "DELIVERY_FAILED"
            })))
            .mount(&mock_server)
            .await;

        let requestor = requestor(&mock_server, LoginVariant::Email);
        let outcome = requestor.submit("band@example.com").await.unwrap();

        assert_eq!(
            outcome,
            RequestOutcome::Failed("Could not deliver verification code".into())
        );
        assert_eq!(
            requestor.last_error().as_deref(),
            Some("Could not deliver verification code")
        );
        assert_eq!(
            requestor.session.pending_identifier(),
            Some(Identifier::Email("band@example.com".into()))
        );
    }

    #[tokio::test]
    async fn test_ok_without_body_moves_to_code_entry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/send-verification"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let requestor = requestor(&mock_server, LoginVariant::Phone);
        assert_eq!(
            requestor.submit("+18025551234").await.unwrap(),
            RequestOutcome::CodeSent(Route::Verify)
        );
        assert!(requestor.last_error().is_none());
    }

    #[tokio::test]
    async fn test_failure_without_body_uses_fallback() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/send-verification"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&mock_server)
            .await;

        let requestor = requestor(&mock_server, LoginVariant::Phone);
        assert_eq!(
            requestor.submit("+18025551234").await.unwrap(),
            RequestOutcome::Failed(SEND_FAILED.into())
        );
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_ignored() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/send-verification"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "message": "ok" }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let requestor = requestor(&mock_server, LoginVariant::Phone);
        let (first, second) = tokio::join!(
            requestor.submit("+18025551234"),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                requestor.submit("+18025551234").await
            }
        );

        assert_eq!(first.unwrap(), RequestOutcome::CodeSent(Route::Verify));
        assert_eq!(second.unwrap(), RequestOutcome::Ignored);
    }
}
