//! Logout command - clears the local session.

use crate::commands::{CommandHandler, Site};
use crate::error::AppResult;
use async_trait::async_trait;

pub struct LogoutHandler;

#[async_trait]
impl CommandHandler for LogoutHandler {
    fn name(&self) -> &str {
        "logout"
    }

    async fn execute(&self, site: &Site) -> AppResult<String> {
        let route = site.session.logout().await?;
        Ok(format!("Signed out ({route})."))
    }
}
