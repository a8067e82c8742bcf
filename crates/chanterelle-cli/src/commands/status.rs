//! Status command - API reachability and local session state.

use crate::commands::{CommandHandler, Site};
use crate::error::AppResult;
use async_trait::async_trait;
use chanterelle_portal::Route;

pub struct StatusHandler;

#[async_trait]
impl CommandHandler for StatusHandler {
    fn name(&self) -> &str {
        "status"
    }

    async fn execute(&self, site: &Site) -> AppResult<String> {
        let reachable = site.client.health_check().await;
        let session = &site.session;

        let pending = session
            .pending_identifier()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".into());

        Ok([
            format!(
                "API:      {} ({})",
                site.client.base_url(),
                if reachable { "reachable" } else { "unreachable" }
            ),
            format!("Login:    {}", session.variant().label()),
            format!("Pending:  {pending}"),
            format!(
                "Session:  {}",
                if session.is_authenticated() {
                    "signed in"
                } else {
                    "signed out"
                }
            ),
            format!("Admin:    {}", session.guard(Route::Admin)),
        ]
        .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::site;
    use chanterelle_portal::LoginVariant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_status_after_logout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let site = site(&mock_server, LoginVariant::Email);
        site.session.store_token("v1.payload.sig").await.unwrap();

        let status = StatusHandler.execute(&site).await.unwrap();
        assert!(status.contains("(reachable)"));
        assert!(status.contains("signed in"));
        assert!(status.contains("Admin:    /admin"));

        crate::commands::LogoutHandler.execute(&site).await.unwrap();
        let status = StatusHandler.execute(&site).await.unwrap();
        assert!(status.contains("signed out"));
        assert!(status.contains("Admin:    /\n") || status.ends_with("Admin:    /"));
    }
}
