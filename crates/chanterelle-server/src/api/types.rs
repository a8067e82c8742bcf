//! API request and response types.

use crate::error::ApiError;
use crate::identifier::Identifier;
use crate::store::{ContactRecord, NewContact};
use chanterelle_client::validate_contact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version tag on the contact list envelope.
pub const CONTACT_LIST_VERSION: u32 = 1;

/// Request to send a verification code. Exactly one field is set.
#[derive(Debug, Deserialize)]
pub struct SendVerificationRequest {
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// Request to exchange a code for a session token.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub phone_number: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub code: String,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Issued session token.
#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Public contact form submission.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// Response after storing a contact.
#[derive(Debug, Serialize)]
pub struct CreateContactResponse {
    pub message: String,
    pub contact: ContactRecord,
}

/// Contact list envelope.
#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub version: u32,
    pub contacts: Vec<ContactRecord>,
    pub total: usize,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub contacts: usize,
    pub pending_codes: usize,
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub persistent: bool,
    pub sender: String,
    pub sender_ready: bool,
    pub admins_configured: bool,
}

/// Pick the single identifier out of a request body.
pub fn identifier_from_fields(
    phone_number: Option<&str>,
    email: Option<&str>,
) -> Result<Identifier, ApiError> {
    let phone_number = phone_number.filter(|s| !s.trim().is_empty());
    let email = email.filter(|s| !s.trim().is_empty());

    match (phone_number, email) {
        (Some(number), None) => Identifier::phone(number).map_err(|_| {
            ApiError::InvalidIdentifier(
                "Invalid phone number format. Must be in E.164 format (e.g., +18025551234)".into(),
            )
        }),
        (None, Some(email)) => Identifier::email(email).map_err(ApiError::InvalidIdentifier),
        (Some(_), Some(_)) => Err(ApiError::InvalidRequest(
            "Provide either phone_number or email, not both".into(),
        )),
        (None, None) => Err(ApiError::InvalidRequest(
            "phone_number or email is required".into(),
        )),
    }
}

/// Check a submitted code has the right shape before any lookup.
pub fn check_code_format(code: &str) -> Result<(), ApiError> {
    if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(
            "Verification code must be 6 digits".into(),
        ))
    }
}

impl ContactRequest {
    /// Validate every field, reporting the first problem per field.
    ///
    /// Stored values are trimmed.
    pub fn validate(self) -> Result<NewContact, ApiError> {
        let submission = validate_contact(
            &self.name,
            &self.email,
            self.phone.as_deref(),
            self.message.as_deref(),
        )
        .map_err(|errors| {
            let problems: Vec<&str> = errors.iter().map(|e| e.message).collect();
            ApiError::Validation(problems.join("; "))
        })?;

        Ok(NewContact {
            name: submission.name,
            email: submission.email,
            phone: submission.phone,
            message: submission.message.unwrap_or_default(),
        })
    }
}
