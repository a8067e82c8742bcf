//! Who may log in, and the limits on issued codes.

use crate::config::AuthConfig;
use crate::identifier::{normalize_email, normalize_phone_number, Identifier, IdentifierKind};
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;

/// Admin allow-list plus code lifetime and guess budget.
#[derive(Debug, Clone)]
pub struct LoginPolicy {
    kind: IdentifierKind,
    admin_phone_numbers: HashSet<String>,
    admin_email: Option<String>,
    code_ttl: Duration,
    max_attempts: u32,
}

impl LoginPolicy {
    pub fn new(kind: IdentifierKind, code_ttl: Duration, max_attempts: u32) -> Self {
        Self {
            kind,
            admin_phone_numbers: HashSet::new(),
            admin_email: None,
            code_ttl,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Build from configuration, skipping allow-list entries that don't parse.
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut policy = Self::new(config.identifier, config.code_ttl, config.max_attempts);

        for raw in config.admin_phone_numbers() {
            match normalize_phone_number(&raw) {
                Ok(number) => {
                    policy.admin_phone_numbers.insert(number);
                }
                Err(e) => warn!(entry = %raw, error = %e, "Ignoring admin phone number"),
            }
        }

        if let Some(raw) = config.admin_email.as_deref().filter(|s| !s.trim().is_empty()) {
            match normalize_email(raw) {
                Ok(email) => policy.admin_email = Some(email),
                Err(e) => warn!(error = %e, "Ignoring admin email"),
            }
        }

        policy
    }

    pub fn with_admin_phone(mut self, number: &str) -> Self {
        if let Ok(number) = normalize_phone_number(number) {
            self.admin_phone_numbers.insert(number);
        }
        self
    }

    pub fn with_admin_email(mut self, email: &str) -> Self {
        self.admin_email = normalize_email(email).ok();
        self
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn code_ttl(&self) -> Duration {
        self.code_ttl
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether the identifier may receive a code.
    pub fn is_admin(&self, identifier: &Identifier) -> bool {
        match identifier {
            Identifier::Phone(number) => self.admin_phone_numbers.contains(number),
            Identifier::Email(email) => self.admin_email.as_deref() == Some(email.as_str()),
        }
    }

    /// Number of configured admins for the active identifier kind.
    pub fn admin_count(&self) -> usize {
        match self.kind {
            IdentifierKind::Phone => self.admin_phone_numbers.len(),
            IdentifierKind::Email => usize::from(self.admin_email.is_some()),
        }
    }

    /// The response text for a send request, identical for allowed and unknown identifiers.
    pub fn acknowledgement(&self) -> &'static str {
        match self.kind {
            IdentifierKind::Phone => {
                "If the phone number is registered, you'll receive a verification code"
            }
            IdentifierKind::Email => "If the email was valid, you'll receive a verification code",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = AuthConfig {
            admin_phone_numbers: "+1 802 555 1234, bogus".into(),
            admin_email: Some("Band@Example.com".into()),
            ..AuthConfig::default()
        };
        let policy = LoginPolicy::from_config(&config);

        assert!(policy.is_admin(&Identifier::phone("+18025551234").unwrap()));
        assert!(!policy.is_admin(&Identifier::phone("+14155550000").unwrap()));
        assert!(policy.is_admin(&Identifier::email("band@example.com").unwrap()));
        assert_eq!(policy.admin_count(), 1);
        assert_eq!(policy.max_attempts(), 5);
    }

    #[test]
    fn test_acknowledgement_per_kind() {
        let phone = LoginPolicy::new(IdentifierKind::Phone, Duration::from_secs(900), 5);
        let email = LoginPolicy::new(IdentifierKind::Email, Duration::from_secs(900), 5);

        assert!(phone.acknowledgement().contains("phone number"));
        assert_eq!(
            email.acknowledgement(),
            "If the email was valid, you'll receive a verification code"
        );
    }

    #[test]
    fn test_attempt_budget_at_least_one() {
        let policy = LoginPolicy::new(IdentifierKind::Phone, Duration::from_secs(900), 0);
        assert_eq!(policy.max_attempts(), 1);
    }
}
