//! Typed client for the Chanterelle site API.

mod client;
mod error;
mod types;
pub mod validation;

pub use client::{ChanterelleClient, DEFAULT_TIMEOUT};
pub use error::ClientError;
pub use types::*;
pub use validation::{validate_contact, ContactField, FieldError};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::assert_ok;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(mock_server: &MockServer) -> ChanterelleClient {
        ChanterelleClient::new(mock_server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            ChanterelleClient::new("localhost:8080", DEFAULT_TIMEOUT),
            Err(ClientError::InvalidBaseUrl(_))
        ));

        let client = ChanterelleClient::new("http://localhost:8080/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_send_verification_body() {
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

        let client = create_test_client(&mock_server);
        let response = client
            .send_verification(&Identifier::PhoneNumber("+18025551234".into()))
            .await
            .unwrap();

        assert!(response.message.unwrap().contains("verification code"));
    }

    #[tokio::test]
    async fn test_verify_code() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/verify-code"))
            .and(body_json(serde_json::json!({ "email": "band@example.com", "code": "482913" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "v1.payload.sig",
                "expires_at": "2026-10-20T12:00:00Z"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let response = client
            .verify_code(&Identifier::Email("band@example.com".into()), "482913")
            .await
            .unwrap();

        assert_eq!(response.token, "v1.payload.sig");
        assert!(response.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_rejection_carries_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/verify-code"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "Invalid verification code",
                "code": "INVALID_CODE"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client
            .verify_code(&Identifier::PhoneNumber("+18025551234".into()), "000000")
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.server_message(), Some("Invalid verification code"));
        assert_eq!(err.to_string(), "Invalid verification code");
    }

    #[tokio::test]
    async fn test_non_json_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/contacts"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client
            .submit_contact(&ContactSubmission {
                name: "Al".into(),
                email: "al@example.com".into(),
                ..ContactSubmission::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(502));
        assert!(err.server_message().is_none());
    }

    #[tokio::test]
    async fn test_list_contacts_with_bearer() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/contacts"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": 1,
                "contacts": [{
                    "id": 3,
                    "name": "Al",
                    "email": "al@example.com",
                    "message": "",
                    "created_at": "2026-10-19T18:30:00Z"
                }],
                "total": 1
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let list = assert_ok!(client.list_contacts("test-token").await);

        assert_eq!(list.total, 1);
        assert_eq!(list.contacts[0].id, 3);
        assert!(list.contacts[0].phone.is_none());
    }

    #[tokio::test]
    async fn test_list_contacts_rejects_other_versions() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": 2,
                "contacts": [],
                "total": 0
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(matches!(
            client.list_contacts("t").await,
            Err(ClientError::UnsupportedVersion(2))
        ));
    }

    #[tokio::test]
    async fn test_list_contacts_rejects_bare_array() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(matches!(
            client.list_contacts("t").await,
            Err(ClientError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_contact() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/contacts/4"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Contact deleted successfully"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        client.delete_contact("test-token", 4).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_success_bodies_are_acknowledgements() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/send-verification"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/contacts"))
            .respond_with(ResponseTemplate::new(201).set_body_string("Created"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let sent = assert_ok!(
            client
                .send_verification(&Identifier::PhoneNumber("+18025551234".into()))
                .await
        );
        assert!(sent.message.is_none());

        let submitted = assert_ok!(
            client
                .submit_contact(&ContactSubmission {
                    name: "Al".into(),
                    email: "al@example.com".into(),
                    ..ContactSubmission::default()
                })
                .await
        );
        assert!(submitted.message.is_none());
        assert!(submitted.contact.is_none());
    }

    #[tokio::test]
    async fn test_health_check() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(client.health_check().await);
    }
}
