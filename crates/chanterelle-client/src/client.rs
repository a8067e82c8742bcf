//! Site API HTTP client.

use crate::error::ClientError;
use crate::types::*;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Chanterelle REST API.
#[derive(Clone)]
pub struct ChanterelleClient {
    client: Client,
    base_url: String,
}

impl ChanterelleClient {
    /// Create a new client for `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// Get the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the server to send a verification code.
    #[instrument(skip(self, identifier), fields(identifier = %identifier))]
    pub async fn send_verification(
        &self,
        identifier: &Identifier,
    ) -> Result<MessageResponse, ClientError> {
        let request = self
            .client
            .post(format!("{}/api/send-verification", self.base_url))
            .json(identifier);

        self.execute_ack(request).await
    }

    /// Exchange a code for a session token.
    #[instrument(skip(self, identifier, code), fields(identifier = %identifier))]
    pub async fn verify_code(
        &self,
        identifier: &Identifier,
        code: &str,
    ) -> Result<VerifyResponse, ClientError> {
        let request = self
            .client
            .post(format!("{}/api/verify-code", self.base_url))
            .json(&VerifyRequest { identifier, code });

        self.execute(request).await
    }

    /// Fetch the contact list with a session token.
    #[instrument(skip(self, token))]
    pub async fn list_contacts(&self, token: &str) -> Result<ContactList, ClientError> {
        let request = self
            .client
            .get(format!("{}/api/contacts", self.base_url))
            .bearer_auth(token);

        let list: ContactList = self.execute(request).await?;
        if list.version != SUPPORTED_LIST_VERSION {
            warn!(version = list.version, "Unsupported contact list version");
            return Err(ClientError::UnsupportedVersion(list.version));
        }

        debug!(total = list.total, "Fetched contacts");
        Ok(list)
    }

    /// Submit the public contact form.
    #[instrument(skip(self, submission))]
    pub async fn submit_contact(
        &self,
        submission: &ContactSubmission,
    ) -> Result<SubmissionResponse, ClientError> {
        let request = self
            .client
            .post(format!("{}/api/contacts", self.base_url))
            .json(submission);

        self.execute_ack(request).await
    }

    /// Delete a contact.
    #[instrument(skip(self, token))]
    pub async fn delete_contact(&self, token: &str, id: u64) -> Result<MessageResponse, ClientError> {
        let request = self
            .client
            .delete(format!("{}/api/contacts/{}", self.base_url, id))
            .bearer_auth(token);

        self.execute_ack(request).await
    }

    /// Health check - returns true if the API is reachable.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Like `execute`, for calls where the status alone means success.
    ///
    /// An empty or unreadable 2xx body yields `T::default()`.
    async fn execute_ack<T: serde::de::DeserializeOwned + Default>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.extract_error(response).await);
        }

        let body = response.text().await.unwrap_or_default();
        if body.trim().is_empty() {
            debug!(%status, "Empty acknowledgement");
            return Ok(T::default());
        }

        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            warn!(%status, error = %e, "Ignoring unreadable acknowledgement body");
            T::default()
        }))
    }

    /// Handle HTTP response, converting errors appropriately.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            debug!(%status, "Response received");
            serde_json::from_str(&body).map_err(ClientError::from)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract error information from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".into());

        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => {
                warn!(status, code = ?body.code, "Request rejected");
                ClientError::Rejected {
                    status,
                    error: body.error,
                    code: body.code,
                }
            }
            Err(_) => {
                warn!(status, "Request failed");
                ClientError::Api {
                    status,
                    message: text,
                }
            }
        }
    }
}
