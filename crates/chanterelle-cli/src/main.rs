//! Chanterelle CLI - Main entry point.

mod cli;
mod commands;
mod config;
mod error;

use crate::cli::{Cli, Commands};
use crate::commands::*;
use crate::config::Config;
use crate::error::AppResult;
use anyhow::Context;
use chanterelle_client::ChanterelleClient;
use chanterelle_portal::{ContactDraft, SessionContext, SessionStore};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{stdin, BufReader};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    init_logging(&config.log.level);

    match run(cli, config).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!(error = ?e, "Command failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> AppResult<String> {
    let client = ChanterelleClient::new(&config.api.base_url, config.api.timeout)
        .context("Failed to create API client")?;

    let store = SessionStore::open(config.session.path.clone()).await?;
    let site = Site {
        client,
        session: Arc::new(SessionContext::new(store, config.login.variant)),
        code_validation: config.login.code_check.into(),
    };

    let handler: Box<dyn CommandHandler> = match cli.command {
        Commands::Contact(args) => Box::new(ContactHandler::new(ContactDraft {
            name: args.name,
            email: args.email,
            phone: args.phone.unwrap_or_default(),
            message: args.message.unwrap_or_default(),
        })),
        Commands::Login { identifier } => Box::new(LoginHandler::new(identifier)),
        Commands::Verify(args) => Box::new(VerifyHandler::new(
            args.code,
            args.auto_submit,
            Box::new(BufReader::new(stdin())),
        )),
        Commands::Contacts => Box::new(ContactsHandler),
        Commands::Remove { id } => Box::new(RemoveHandler::new(id)),
        Commands::Logout => Box::new(LogoutHandler),
        Commands::Status => Box::new(StatusHandler),
    };

    debug!(command = handler.name(), api = %config.api.base_url, "Running command");
    handler.execute(&site).await
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
