//! Chanterelle API server - Entry point.

use chanterelle_server::{
    api::{
        cors_layer, create_router_with_rate_limit, spawn_purge_task, AppState, RateLimitState,
        PURGE_INTERVAL,
    },
    config::Config,
    sender::{self, PROVIDER_TIMEOUT},
    store::Store,
    LoginPolicy, MailchimpAudience, TokenIssuer,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    let json = config.log.json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    info!("Starting Chanterelle API server");

    let token_secret = match config.auth.signing_secret() {
        Ok(secret) => secret,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize storage
    let store = if config.store.persist {
        info!(path = ?config.store.path, "Using file storage");
        Store::file(config.store.path.clone())
    } else {
        info!("Persistence disabled, using in-memory storage");
        Store::memory()
    };

    // Load existing data
    let ledger = match store.load().await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to load data file: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize code delivery
    let sender = match sender::from_config(&config.sender) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create sender: {}", e);
            std::process::exit(1);
        }
    };
    if !sender.is_ready() {
        warn!(sender = sender.name(), "Sender configuration is incomplete");
    }

    let policy = LoginPolicy::from_config(&config.auth);
    if policy.admin_count() == 0 {
        warn!(identifier = ?policy.kind(), "No admins configured; nobody can log in");
    }

    let tokens = TokenIssuer::new(token_secret, config.auth.token_ttl);

    // Create application state
    let mut state = AppState::new(ledger, store, sender, tokens, policy);

    match MailchimpAudience::from_config(&config.mailchimp, PROVIDER_TIMEOUT) {
        Ok(Some(audience)) => {
            info!("Mailchimp audience sync enabled");
            state = state.with_audience(audience);
        }
        Ok(None) => info!("Mailchimp not configured, skipping audience sync"),
        Err(e) => {
            error!("Failed to set up Mailchimp: {}", e);
            std::process::exit(1);
        }
    }

    let purge = spawn_purge_task(state.clone(), PURGE_INTERVAL);

    // Create router with rate limiting and CORS
    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);
    let app = create_router_with_rate_limit(state, rate_limit)
        .layer(cors_layer(&config.cors.allowed_origins()));

    // Bind to address
    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    purge.abort();
    info!("Server stopped");
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
