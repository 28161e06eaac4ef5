use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    permissions, AlertKind, Dispatcher, HttpTransport, Services, StoreHandle, Transport,
};
use shared::domain::Role;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "backoffice", about = "Training-center back-office client")]
struct Args {
    /// Overrides `api_base_url` from `backoffice.toml` and the environment.
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    role: Option<Role>,
    #[arg(long)]
    cancel_stale_reads: bool,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings()?;
    if let Some(v) = args.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = args.token {
        settings.api_token = Some(v);
    }
    if let Some(v) = args.role {
        settings.role = v;
    }
    if args.cancel_stale_reads {
        settings.cancel_stale_reads = true;
    }

    if let Some(permission) = args.command.permission() {
        if !permissions::can(settings.role, permission) {
            bail!("role {} is not allowed to {permission}", settings.role);
        }
    }

    let transport = HttpTransport::with_timeout(&settings.api_base_url, settings.request_timeout())
        .with_context(|| format!("invalid api base url '{}'", settings.api_base_url))?;
    transport.set_token(settings.api_token.clone()).await;
    info!(
        base_url = %transport.base_url(),
        role = %settings.role,
        "cli: connected transport"
    );
    let transport: Arc<dyn Transport> = Arc::new(transport);

    let store = StoreHandle::new();
    let dispatcher = Dispatcher::new(
        Arc::clone(&store),
        Services::new(transport),
        settings.role,
        settings.client_options(),
    );

    let outcome = commands::run(&dispatcher, args.command).await;

    if let Some(alert) = store.read(|s| s.ui.alert.clone()).await {
        let label = match alert.kind {
            AlertKind::Success => "ok",
            AlertKind::Info => "info",
            AlertKind::Warning => "warning",
            AlertKind::Error => "error",
        };
        eprintln!("[{label}] {}", alert.message);
    }
    outcome
}
