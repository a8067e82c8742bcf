//! Request and response types for the site API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Contact list envelope version this client understands.
pub const SUPPORTED_LIST_VERSION: u32 = 1;

/// Admin login identifier, serialized as `{"phone_number": ..}` or `{"email": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identifier {
    PhoneNumber(String),
    Email(String),
}

impl Identifier {
    pub fn as_str(&self) -> &str {
        match self {
            Identifier::PhoneNumber(s) | Identifier::Email(s) => s,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/verify-code`.
#[derive(Debug, Serialize)]
pub(crate) struct VerifyRequest<'a> {
    #[serde(flatten)]
    pub identifier: &'a Identifier,
    pub code: &'a str,
}

/// Public contact form payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A stored contact as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Contact list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactList {
    pub version: u32,
    pub contacts: Vec<Contact>,
    pub total: usize,
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response after submitting a contact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
}

/// Issued session token.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_wire_shape() {
        let phone = Identifier::PhoneNumber("+18025551234".into());
        assert_eq!(
            serde_json::to_value(&phone).unwrap(),
            serde_json::json!({ "phone_number": "+18025551234" })
        );

        let request = VerifyRequest {
            identifier: &Identifier::Email("band@example.com".into()),
            code: "123456",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "email": "band@example.com", "code": "123456" })
        );
    }

    #[test]
    fn test_submission_omits_empty_optionals() {
        let submission = ContactSubmission {
            name: "Al".into(),
            email: "al@example.com".into(),
            phone: None,
            message: None,
        };
        assert_eq!(
            serde_json::to_value(&submission).unwrap(),
            serde_json::json!({ "name": "Al", "email": "al@example.com" })
        );
    }
}
