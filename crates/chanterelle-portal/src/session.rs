//! Persisted session state: the pending login identifier and the session token.
//!
//! The store is a small string map written to a JSON file after every change
//! so it survives restarts. `SessionContext` is the only thing flows touch.

use crate::error::PortalError;
use crate::routes::Route;
use chanterelle_client::Identifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Keys held in the session file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    Token,
    AdminPhoneNumber,
    AdminEmail,
}

impl SessionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::Token => "token",
            SessionKey::AdminPhoneNumber => "admin_phone_number",
            SessionKey::AdminEmail => "admin_email",
        }
    }
}

/// Which identifier the login flow collects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginVariant {
    #[default]
    Phone,
    Email,
}

impl LoginVariant {
    /// Whether the raw input is good enough to enable the send control.
    ///
    /// Phone input must be a `+1` number of exactly 12 characters; email
    /// input only needs to be non-empty, the server checks its shape.
    pub fn accepts(&self, input: &str) -> bool {
        match self {
            LoginVariant::Phone => input.starts_with("+1") && input.chars().count() == 12,
            LoginVariant::Email => !input.trim().is_empty(),
        }
    }

    pub fn identifier(&self, input: &str) -> Identifier {
        match self {
            LoginVariant::Phone => Identifier::PhoneNumber(input.to_string()),
            LoginVariant::Email => Identifier::Email(input.trim().to_string()),
        }
    }

    /// Session key that holds the pending identifier.
    pub fn session_key(&self) -> SessionKey {
        match self {
            LoginVariant::Phone => SessionKey::AdminPhoneNumber,
            LoginVariant::Email => SessionKey::AdminEmail,
        }
    }

    /// Shown when code entry finds no pending identifier.
    pub fn missing_message(&self) -> &'static str {
        match self {
            LoginVariant::Phone => "Phone number not found",
            LoginVariant::Email => "Email not found",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoginVariant::Phone => "phone number",
            LoginVariant::Email => "email",
        }
    }
}

/// Key-value session storage, file-backed or in memory.
pub struct SessionStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl SessionStore {
    /// Open a file-backed store, loading existing entries.
    ///
    /// A missing file is an empty session.
    #[instrument(fields(path = ?path))]
    pub async fn open(path: PathBuf) -> Result<Self, PortalError> {
        let entries = if fs::try_exists(&path).await? {
            let data = fs::read(&path).await?;
            serde_json::from_slice(&data)?
        } else {
            debug!("Session file not found, starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// In-memory store that forgets everything on drop.
    pub fn memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn get(&self, key: SessionKey) -> Option<String> {
        self.lock().get(key.as_str()).cloned()
    }

    pub async fn set(&self, key: SessionKey, value: &str) -> Result<(), PortalError> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
        })
        .await
    }

    pub async fn remove(&self, keys: &[SessionKey]) -> Result<(), PortalError> {
        self.update(|entries| {
            for key in keys {
                entries.remove(key.as_str());
            }
        })
        .await
    }

    /// Apply a change and persist the result.
    async fn update<F>(&self, change: F) -> Result<(), PortalError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _write = self.write_lock.lock().await;

        let snapshot = {
            let mut entries = self.lock();
            change(&mut entries);
            entries.clone()
        };

        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using temp file + rename
        let data = serde_json::to_vec_pretty(&snapshot)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, path).await?;

        debug!(entries = snapshot.len(), "Session saved");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // entries stay consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Session state shared by the login, code entry and admin flows.
pub struct SessionContext {
    store: SessionStore,
    variant: LoginVariant,
}

impl SessionContext {
    pub fn new(store: SessionStore, variant: LoginVariant) -> Self {
        Self { store, variant }
    }

    pub fn variant(&self) -> LoginVariant {
        self.variant
    }

    /// The identifier awaiting a code, if any.
    pub fn pending_identifier(&self) -> Option<Identifier> {
        self.store
            .get(self.variant.session_key())
            .map(|value| self.variant.identifier(&value))
    }

    /// Record the identifier a code is being requested for.
    ///
    /// Only the active variant's key is ever populated.
    pub async fn set_pending_identifier(&self, identifier: &Identifier) -> Result<(), PortalError> {
        let (key, other) = match identifier {
            Identifier::PhoneNumber(_) => (SessionKey::AdminPhoneNumber, SessionKey::AdminEmail),
            Identifier::Email(_) => (SessionKey::AdminEmail, SessionKey::AdminPhoneNumber),
        };
        self.store.remove(&[other]).await?;
        self.store.set(key, identifier.as_str()).await
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(SessionKey::Token).filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub async fn store_token(&self, token: &str) -> Result<(), PortalError> {
        self.store.set(SessionKey::Token, token).await
    }

    /// Drop the token and the pending identifier.
    pub async fn logout(&self) -> Result<Route, PortalError> {
        self.store
            .remove(&[
                SessionKey::Token,
                SessionKey::AdminPhoneNumber,
                SessionKey::AdminEmail,
            ])
            .await?;
        info!("Logged out");
        Ok(Route::Landing)
    }

    /// Where navigation to `route` actually lands.
    ///
    /// Advisory only; the server checks the token on every protected call.
    pub fn guard(&self, route: Route) -> Route {
        if route.requires_session() && !self.is_authenticated() {
            Route::Landing
        } else {
            route
        }
    }
}
