//! In-memory ledger of contacts and pending codes.

use super::{ContactRecord, NewContact, PendingCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything the server keeps: submitted contacts and outstanding codes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Next contact id to hand out
    #[serde(default)]
    next_id: u64,

    /// Contacts in submission order
    #[serde(default)]
    contacts: Vec<ContactRecord>,

    /// Pending codes indexed by identifier storage key
    #[serde(default)]
    pending: HashMap<String, PendingCode>,
}

impl Ledger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a contact, assigning its id and timestamp.
    pub fn add_contact(&mut self, contact: NewContact) -> ContactRecord {
        self.add_contact_at(contact, Utc::now())
    }

    pub fn add_contact_at(&mut self, contact: NewContact, now: DateTime<Utc>) -> ContactRecord {
        let floor = self.contacts.iter().map(|c| c.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(floor) + 1;

        let record = ContactRecord {
            id: self.next_id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            message: contact.message,
            created_at: now,
        };
        self.contacts.push(record.clone());
        record
    }

    /// Contacts, newest first.
    pub fn contacts_newest_first(&self) -> Vec<&ContactRecord> {
        let mut contacts: Vec<&ContactRecord> = self.contacts.iter().collect();
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        contacts
    }

    /// Get a contact by id.
    pub fn contact(&self, id: u64) -> Option<&ContactRecord> {
        self.contacts.iter().find(|c| c.id == id)
    }

    /// Remove a contact by id.
    pub fn remove_contact(&mut self, id: u64) -> Option<ContactRecord> {
        let index = self.contacts.iter().position(|c| c.id == id)?;
        Some(self.contacts.remove(index))
    }

    /// Put back a contact taken out with `remove_contact`.
    pub fn restore_contact(&mut self, record: ContactRecord) {
        self.contacts.push(record);
    }

    /// Get the number of stored contacts.
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Insert a pending code, replacing any earlier one for the same key.
    pub fn put_pending(&mut self, key: String, code: PendingCode) -> Option<PendingCode> {
        self.pending.insert(key, code)
    }

    pub fn pending(&self, key: &str) -> Option<&PendingCode> {
        self.pending.get(key)
    }

    pub fn pending_mut(&mut self, key: &str) -> Option<&mut PendingCode> {
        self.pending.get_mut(key)
    }

    /// Remove and return the pending code for a key.
    pub fn take_pending(&mut self, key: &str) -> Option<PendingCode> {
        self.pending.remove(key)
    }

    /// Get the number of outstanding codes.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop expired codes, returning how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, code| !code.is_expired(now));
        before - self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn new_contact(name: &str) -> NewContact {
        NewContact {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            message: String::new(),
        }
    }

    #[test]
    fn test_add_contact_assigns_ids() {
        let mut ledger = Ledger::new();
        let first = ledger.add_contact(new_contact("Alice"));
        let second = ledger.add_contact(new_contact("Bob"));

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(ledger.contact_count(), 2);
        assert_eq!(ledger.contact(2).unwrap().name, "Bob");
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let mut ledger = Ledger::new();
        ledger.add_contact(new_contact("Alice"));
        let bob = ledger.add_contact(new_contact("Bob"));

        assert!(ledger.remove_contact(bob.id).is_some());
        assert!(ledger.remove_contact(bob.id).is_none());

        let carol = ledger.add_contact(new_contact("Carol"));
        assert_eq!(carol.id, 3);
    }

    #[test]
    fn test_contacts_newest_first() {
        let mut ledger = Ledger::new();
        let now = Utc::now();
        ledger.add_contact_at(new_contact("Old"), now - chrono::Duration::days(2));
        ledger.add_contact_at(new_contact("New"), now);
        ledger.add_contact_at(new_contact("Mid"), now - chrono::Duration::days(1));

        let names: Vec<&str> = ledger
            .contacts_newest_first()
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["New", "Mid", "Old"]);
    }

    #[test]
    fn test_pending_replaced_and_purged() {
        let mut ledger = Ledger::new();
        let now = Utc::now();
        let ttl = Duration::from_secs(900);

        ledger.put_pending(
            "phone:+18025551234".into(),
            PendingCode::new_at("+18025551234", "111111", ttl, now),
        );
        let replaced = ledger.put_pending(
            "phone:+18025551234".into(),
            PendingCode::new_at("+18025551234", "222222", ttl, now),
        );
        assert!(replaced.is_some());
        assert_eq!(ledger.pending_count(), 1);
        assert!(ledger.pending("phone:+18025551234").unwrap().matches("222222"));

        ledger.put_pending(
            "email:band@example.com".into(),
            PendingCode::new_at("band@example.com", "333333", ttl, now - chrono::Duration::hours(1)),
        );

        assert_eq!(ledger.purge_expired(now), 1);
        assert_eq!(ledger.pending_count(), 1);
        assert!(ledger.pending("email:band@example.com").is_none());
    }
}
