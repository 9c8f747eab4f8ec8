//! Session CLI
//!
//! Command-line front end for the authenticated request layer:
//! 1. Loads the API and session configuration
//! 2. Opens the file-backed token store
//! 3. Runs one command through `ApiClient` (refreshing and retrying as needed)
//! 4. Prints the JSON result to stdout; logs go to stderr

mod cli;
mod config;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Value, json};
use session_client::{ApiClient, LogoutHandler, TracingNotifier};
use session_store::{FileStore, TokenStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::ReqwestTransport;

use crate::cli::{Cli, Command};
use crate::config::Config;

/// Logout side effect for a terminal session: tell the user to sign in again.
struct SignInPrompt;

impl LogoutHandler for SignInPrompt {
    fn on_logout(&self) {
        warn!("session ended, store a new token with `session-cli set-token`");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr with LOG_LEVEL / RUST_LOG support; stdout carries results
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let prometheus = if cli.metrics {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    let config_path = Config::resolve_path(cli.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.api.base_url,
        refresh_path = %config.api.refresh_path,
        token_file = %config.session.token_file.display(),
        "configuration loaded"
    );

    let client = build_client(&config).await?;
    let outcome = run(cli.command.into(), &client).await;

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }

    let output = outcome?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Wire the HTTP transport, file-backed store and pipeline together.
async fn build_client(config: &Config) -> Result<ApiClient> {
    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let transport = ReqwestTransport::new(http, config.api.base_url.clone(), config.timeout());

    let file = open_store(config).await?;
    info!(token_file = %file.path().display(), "token store ready");

    Ok(ApiClient::new(
        Arc::new(transport),
        TokenStore::new(Arc::new(file)),
        Arc::new(TracingNotifier),
        Arc::new(SignInPrompt),
        &config.client_settings(),
    ))
}

async fn open_store(config: &Config) -> Result<FileStore> {
    FileStore::load(config.session.token_file.clone())
        .await
        .with_context(|| {
            format!(
                "failed to open token file {}",
                config.session.token_file.display()
            )
        })
}

/// Execute one command and produce its JSON output.
async fn run(command: Command, client: &ApiClient) -> Result<Value> {
    match command {
        Command::Call(options) => {
            let label = format!("{} {}", options.method, options.endpoint);
            client
                .call(options)
                .await
                .with_context(|| format!("{label} failed"))
        }
        Command::Refresh => {
            let record = client
                .coordinator()
                .refresh_token()
                .await
                .context("token refresh failed")?;
            Ok(json!({ "refreshed": true, "expireAt": record.expire_at }))
        }
        Command::Logout => {
            let fired = client.coordinator().logout().await;
            Ok(json!({ "loggedOut": fired }))
        }
        Command::Show => {
            let store = client.store();
            Ok(match store.read().await {
                Some(record) => json!({
                    "loggedIn": true,
                    "expireAt": record.expire_at,
                    "expired": store.is_expired(&record),
                }),
                None => json!({ "loggedIn": false }),
            })
        }
        Command::SetToken(record) => {
            client
                .store()
                .write(&record)
                .await
                .context("failed to store token record")?;
            Ok(json!({ "stored": true, "expireAt": record.expire_at }))
        }
    }
}
