//! Admin contact list.

use crate::error::PortalError;
use crate::inflight::InFlight;
use crate::routes::Route;
use crate::session::SessionContext;
use chanterelle_client::{ChanterelleClient, Contact};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC timestamp in the given zone.
pub fn format_local<Tz>(timestamp: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    timestamp
        .with_timezone(tz)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub received: String,
}

impl ContactRow {
    pub fn from_contact<Tz>(contact: Contact, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            received: format_local(&contact.created_at, tz),
            id: contact.id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            message: contact.message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewerState {
    #[default]
    Idle,
    Loading,
    Failed(String),
    Loaded(Vec<ContactRow>),
}

impl ViewerState {
    /// Rows to render. Empty unless loaded.
    pub fn rows(&self) -> &[ContactRow] {
        match self {
            ViewerState::Loaded(rows) => rows,
            _ => &[],
        }
    }
}

/// What activating the viewer led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    /// No session; go elsewhere without fetching.
    Redirect(Route),
    Loaded(usize),
    Failed(String),
    /// A fetch is already running.
    Ignored,
}

/// Contact dashboard behind the admin route.
///
/// The token check here only spares a pointless request. The server
/// authorizes every call on its own.
pub struct AdminViewer {
    client: ChanterelleClient,
    session: Arc<SessionContext>,
    state: Mutex<ViewerState>,
    in_flight: InFlight,
}

impl AdminViewer {
    pub fn new(client: ChanterelleClient, session: Arc<SessionContext>) -> Self {
        Self {
            client,
            session,
            state: Mutex::new(ViewerState::Idle),
            in_flight: InFlight::new(),
        }
    }

    pub fn state(&self) -> ViewerState {
        self.lock().clone()
    }

    /// Check for a token and fetch the contact list with it.
    #[instrument(skip(self))]
    pub async fn activate(&self) -> ViewOutcome {
        let Some(token) = self.session.token() else {
            debug!("No session token, redirecting");
            return ViewOutcome::Redirect(Route::Landing);
        };

        let Some(_guard) = self.in_flight.try_begin() else {
            return ViewOutcome::Ignored;
        };

        *self.lock() = ViewerState::Loading;

        match self.client.list_contacts(&token).await {
            Ok(list) => {
                let rows: Vec<ContactRow> = list
                    .contacts
                    .into_iter()
                    .map(|c| ContactRow::from_contact(c, &Local))
                    .collect();
                let count = rows.len();
                info!(count, "Contacts loaded");
                *self.lock() = ViewerState::Loaded(rows);
                ViewOutcome::Loaded(count)
            }
            Err(e) => {
                // expired or rejected tokens land here too
                warn!(error = %e, "Failed to load contacts");
                let message = e.to_string();
                *self.lock() = ViewerState::Failed(message.clone());
                ViewOutcome::Failed(message)
            }
        }
    }

    /// Delete a contact and drop it from the loaded rows.
    #[instrument(skip(self))]
    pub async fn remove_contact(&self, id: u64) -> Result<ViewOutcome, PortalError> {
        let Some(token) = self.session.token() else {
            return Ok(ViewOutcome::Redirect(Route::Landing));
        };

        self.client.delete_contact(&token, id).await?;

        let mut state = self.lock();
        if let ViewerState::Loaded(rows) = &mut *state {
            rows.retain(|row| row.id != id);
        }
        Ok(ViewOutcome::Loaded(state.rows().len()))
    }

    pub async fn logout(&self) -> Result<Route, PortalError> {
        *self.lock() = ViewerState::Idle;
        self.session.logout().await
    }

    fn lock(&self) -> MutexGuard<'_, ViewerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
