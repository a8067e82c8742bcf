//! Admin login identifiers (phone number or email address).

use chanterelle_client::validation::valid_email;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which identifier the login flow collects.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    #[default]
    Phone,
    Email,
}

/// A normalized login identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// E.164 phone number, e.g. `+18025551234`
    Phone(String),
    /// Lowercased email address
    Email(String),
}

impl Identifier {
    /// Parse and normalize a phone number.
    pub fn phone(raw: &str) -> Result<Self, String> {
        normalize_phone_number(raw).map(Identifier::Phone)
    }

    /// Parse and normalize an email address.
    pub fn email(raw: &str) -> Result<Self, String> {
        normalize_email(raw).map(Identifier::Email)
    }

    pub fn kind(&self) -> IdentifierKind {
        match self {
            Identifier::Phone(_) => IdentifierKind::Phone,
            Identifier::Email(_) => IdentifierKind::Email,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Identifier::Phone(s) | Identifier::Email(s) => s,
        }
    }

    /// Key under which pending codes are stored.
    pub fn storage_key(&self) -> String {
        match self {
            Identifier::Phone(s) => format!("phone:{s}"),
            Identifier::Email(s) => format!("email:{s}"),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a phone number to E.164 format.
///
/// Formatting characters (spaces, dashes, parentheses, dots) are dropped; the
/// result must carry a leading `+` and 8 to 15 digits.
pub fn normalize_phone_number(number: &str) -> Result<String, String> {
    let trimmed = number.trim();
    if !trimmed.starts_with('+') {
        return Err("Phone number must include country code (e.g. +18025551234)".into());
    }

    if trimmed[1..]
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.')))
    {
        return Err("Phone number contains invalid characters".into());
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 8 {
        return Err("Phone number too short".into());
    }

    if digits.len() > 15 {
        return Err("Phone number too long".into());
    }

    if digits.starts_with('0') {
        return Err("Phone number country code cannot start with 0".into());
    }

    Ok(format!("+{}", digits))
}

/// Validate and lowercase an email address.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() {
        return Err("Email is required".into());
    }
    if !valid_email(&normalized) {
        return Err("Email must be valid".into());
    }
    Ok(normalized)
}


#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(
            normalize_phone_number("+1 (802) 555-1234"),
            Ok("+18025551234".into())
        );
        assert_eq!(
            normalize_phone_number("+18025551234"),
            Ok("+18025551234".into())
        );
        assert_err!(normalize_phone_number("8025551234"));
        assert_err!(normalize_phone_number("+123"));
        assert_err!(normalize_phone_number("+1802555abcd"));
        assert_err!(normalize_phone_number("+0123456789"));
        assert_err!(normalize_phone_number(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email(" Band@Example.COM "),
            Ok("band@example.com".into())
        );
        assert_eq!(normalize_email(""), Err("Email is required".into()));
        assert_eq!(
            normalize_email("not-an-email"),
            Err("Email must be valid".into())
        );
    }

    #[test]
    fn test_storage_key_separates_kinds() {
        let phone = Identifier::phone("+18025551234").unwrap();
        let email = Identifier::email("band@example.com").unwrap();

        assert_eq!(phone.kind(), IdentifierKind::Phone);
        assert_eq!(email.kind(), IdentifierKind::Email);
        assert_eq!(phone.storage_key(), "phone:+18025551234");
        assert_eq!(email.storage_key(), "email:band@example.com");
        assert_eq!(phone.to_string(), "+18025551234");
    }
}
