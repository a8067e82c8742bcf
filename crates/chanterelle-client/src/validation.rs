//! Contact form rules shared by the API and its front-ends.

use crate::types::ContactSubmission;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const PHONE_MIN_CHARS: usize = 7;
pub const PHONE_MAX_CHARS: usize = 20;
pub const MESSAGE_MAX_CHARS: usize = 500;

static EMAIL_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Email,
    Phone,
    Message,
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Phone => "phone",
            ContactField::Message => "message",
        })
    }
}

/// First problem found on a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: ContactField,
    pub message: &'static str,
}

/// Loose shape check: something, `@`, something, `.`, something.
pub fn valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_ok_and(|re| re.is_match(email))
}

/// Trim and check a contact submission, reporting the first problem per field.
///
/// A blank phone or message is treated as absent.
pub fn validate_contact(
    name: &str,
    email: &str,
    phone: Option<&str>,
    message: Option<&str>,
) -> Result<ContactSubmission, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut error = |field, message| errors.push(FieldError { field, message });

    let name = name.trim();
    let name_len = name.chars().count();
    if name_len < NAME_MIN_CHARS {
        error(ContactField::Name, "Name must be at least 2 characters");
    } else if name_len > NAME_MAX_CHARS {
        error(ContactField::Name, "Name must be at most 100 characters");
    }

    let email = email.trim();
    if email.is_empty() {
        error(ContactField::Email, "Email is required");
    } else if !valid_email(email) {
        error(ContactField::Email, "Email must be valid");
    }

    let phone = phone.map(str::trim).filter(|p| !p.is_empty());
    if let Some(phone) = phone {
        let len = phone.chars().count();
        if !(PHONE_MIN_CHARS..=PHONE_MAX_CHARS).contains(&len) {
            error(ContactField::Phone, "Phone must be between 7 and 20 characters");
        } else if !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
        {
            error(
                ContactField::Phone,
                "Phone may only contain digits, spaces and + - ( )",
            );
        }
    }

    let message = message.map(str::trim).filter(|m| !m.is_empty());
    if message.is_some_and(|m| m.chars().count() > MESSAGE_MAX_CHARS) {
        error(ContactField::Message, "Message must be at most 500 characters");
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ContactSubmission {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.map(str::to_string),
        message: message.map(str::to_string),
    })
}
