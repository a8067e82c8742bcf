//! CLI command handlers.

mod contact;
mod contacts;
mod login;
mod logout;
mod remove;
mod status;
mod verify;

pub use contact::ContactHandler;
pub use contacts::ContactsHandler;
pub use login::LoginHandler;
pub use logout::LogoutHandler;
pub use remove::RemoveHandler;
pub use status::StatusHandler;
pub use verify::VerifyHandler;

use crate::error::AppResult;
use async_trait::async_trait;
use chanterelle_client::ChanterelleClient;
use chanterelle_portal::{CodeValidation, Route, SessionContext};
use std::sync::Arc;

/// What every command works against.
pub struct Site {
    pub client: ChanterelleClient,
    pub session: Arc<SessionContext>,
    pub code_validation: CodeValidation,
}

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name (e.g., "login", "contacts").
    fn name(&self) -> &str;

    /// Run the command and return the text to print.
    async fn execute(&self, site: &Site) -> AppResult<String>;
}

pub(crate) fn not_signed_in(route: Route) -> String {
    format!("Not signed in (redirected to {route}). Run `chanterelle login` first.")
}
