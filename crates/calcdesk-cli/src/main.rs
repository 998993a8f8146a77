//! calcdesk - a command-line client for the calculator service.
//!
//! Logs in against the service, keeps the session token in the local data
//! directory and exposes the calculation, history and report endpoints as
//! subcommands.

mod commands;
mod terminal;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use calcdesk_core::{ApiClient, ApiError, Config, FileStore, Notifier, ReqwestTransport, Session};
use clap::Parser;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{App, Cli};
use terminal::{TerminalNavigator, TerminalSink};

/// Log file prefix inside the data directory's `logs/` folder
const LOG_FILE_PREFIX: &str = "calcdesk.log";

/// Initialize the tracing subscriber for logging.
///
/// Stderr gets `RUST_LOG`-filtered output (default `warn`); the daily log
/// file always records at `debug`. The returned guard flushes the file
/// writer and must be held until exit.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(stderr_filter);

    let (file_layer, guard) = match config.data_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("calcdesk_core=debug,calcdesk=debug"));
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn build_app(config: &Config) -> Result<App> {
    let data_dir = config.data_dir()?;
    let store = FileStore::open(&data_dir).context("Failed to open session store")?;
    debug!(path = %store.path().display(), "Session store ready");

    let session = Session::new(Arc::new(store), Arc::new(TerminalNavigator));
    let transport = ReqwestTransport::new().context("Failed to create HTTP client")?;
    let client = ApiClient::new(Arc::new(transport), session, config.base_url.clone());
    let notifier = Notifier::new(Arc::new(TerminalSink)).with_timeout(config.alert_timeout());

    Ok(App {
        client,
        notifier,
        config: config.clone(),
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = &cli.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    let _guard = init_tracing(&config);

    let app = match build_app(&config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(command = ?cli.command, base_url = %config.base_url, "calcdesk starting");
    match commands::run(&app, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The navigator already told the user to log in
            let needs_login = e
                .downcast_ref::<ApiError>()
                .is_some_and(ApiError::needs_login);
            if !needs_login {
                app.notifier.show_error(&format!("{:#}", e));
            }
            ExitCode::FAILURE
        }
    }
}
