//! Contact records and pending verification codes with JSON persistence.

mod memory;
mod persistent;

pub use memory::Ledger;
pub use persistent::{FileStore, MemoryStore, Store};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A message left through the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Validated contact fields awaiting an id.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

/// An outstanding verification code for one identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCode {
    /// Normalized identifier the code was sent to
    pub identifier: String,

    /// SHA-256 of identifier and code
    pub code_hash: String,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// Wrong guesses so far
    #[serde(default)]
    pub attempts: u32,
}

impl PendingCode {
    /// Create a pending code that expires after `ttl`.
    pub fn new(identifier: &str, code: &str, ttl: Duration) -> Self {
        Self::new_at(identifier, code, ttl, Utc::now())
    }

    pub fn new_at(identifier: &str, code: &str, ttl: Duration, now: DateTime<Utc>) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::minutes(15));
        Self {
            identifier: identifier.to_string(),
            code_hash: hash_code(identifier, code),
            created_at: now,
            expires_at: now + ttl,
            attempts: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check a submitted code against the stored hash.
    pub fn matches(&self, code: &str) -> bool {
        hash_code(&self.identifier, code) == self.code_hash
    }
}

/// Hash a code bound to the identifier it was issued for.
pub fn hash_code(identifier: &str, code: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a six digit verification code from the thread CSPRNG.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
