//! HTTP API for the site backend.

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::AdminSession;
pub use handlers::*;
pub use middleware::{cors_layer, logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use crate::audience::MailchimpAudience;
use crate::error::ApiError;
use crate::login::LoginPolicy;
use crate::sender::CodeSender;
use crate::store::{Ledger, Store};
use crate::token::TokenIssuer;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// How often expired codes are swept.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Contacts and pending codes
    pub ledger: Arc<RwLock<Ledger>>,
    /// Persistent storage backend
    pub store: Arc<Store>,
    /// Code and notification delivery
    pub sender: Arc<dyn CodeSender>,
    /// Session token signer
    pub tokens: Arc<TokenIssuer>,
    /// Admin allow-list and code limits
    pub policy: Arc<LoginPolicy>,
    /// Mailchimp list new contacts are added to, if configured
    pub audience: Option<Arc<MailchimpAudience>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        ledger: Ledger,
        store: Store,
        sender: Arc<dyn CodeSender>,
        tokens: TokenIssuer,
        policy: LoginPolicy,
    ) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            store: Arc::new(store),
            sender,
            tokens: Arc::new(tokens),
            policy: Arc::new(policy),
            audience: None,
        }
    }

    /// Add new contacts to a Mailchimp audience.
    pub fn with_audience(mut self, audience: MailchimpAudience) -> Self {
        self.audience = Some(Arc::new(audience));
        self
    }
}

/// Create the API router with default rate limiting.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(60))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let api = Router::new()
        .route("/api/send-verification", post(handlers::send_verification))
        .route("/api/verify-code", post(handlers::verify_code))
        .route(
            "/api/contacts",
            post(handlers::create_contact).get(handlers::list_contacts),
        )
        .route("/api/contact", post(handlers::create_contact))
        .route("/api/contacts/:id", delete(handlers::delete_contact))
        .route_layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        // Probes (no rate limiting)
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .merge(api)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Drop expired codes and persist if anything changed.
pub async fn purge_expired_codes(state: &AppState) -> Result<usize, ApiError> {
    let mut ledger = state.ledger.write().await;
    let removed = ledger.purge_expired(Utc::now());
    if removed > 0 {
        state.store.save(&ledger).await?;
        debug!("Purged {} expired verification codes", removed);
    }
    Ok(removed)
}

/// Background task that periodically removes expired codes.
pub fn spawn_purge_task(state: AppState, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            if let Err(e) = purge_expired_codes(&state).await {
                warn!(error = %e, "Failed to purge expired codes");
            }
        }
    })
}
