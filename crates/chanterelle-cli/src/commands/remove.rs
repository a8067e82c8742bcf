//! Remove command - deletes one contact.

use crate::commands::{not_signed_in, CommandHandler, Site};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chanterelle_portal::{AdminViewer, PortalError, ViewOutcome};

pub struct RemoveHandler {
    id: u64,
}

impl RemoveHandler {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

#[async_trait]
impl CommandHandler for RemoveHandler {
    fn name(&self) -> &str {
        "remove"
    }

    async fn execute(&self, site: &Site) -> AppResult<String> {
        let viewer = AdminViewer::new(site.client.clone(), site.session.clone());

        match viewer.remove_contact(self.id).await {
            Ok(ViewOutcome::Redirect(route)) => Err(AppError::Rejected(not_signed_in(route))),
            Ok(_) => Ok(format!("Contact {} removed.", self.id)),
            Err(PortalError::Client(e)) => Err(AppError::Rejected(
                e.server_message().map(str::to_string).unwrap_or_else(|| e.to_string()),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
