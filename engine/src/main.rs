// Packdock package installer
// Main entry point for the packdock binary

use clap::Parser;
use packdock_engine::cli::{Cli, Command};
use packdock_engine::config::Config;
use packdock_engine::fetch::ContentClient;
use packdock_engine::handlers::{
    handle_install, handle_reload_self, handle_uninstall, handle_update_self, handle_verify,
    handle_view, OutputFormat,
};
use packdock_engine::host::DetachedHost;
use packdock_engine::registry::TrustRegistry;
use packdock_engine::service::PackageService;
use packdock_engine::telemetry::{init_telemetry, init_telemetry_with_level};
use packdock_engine::trust::VerificationService;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize basic telemetry first (before config is loaded)
    init_telemetry();

    tracing::info!("Packdock v{}", env!("CARGO_PKG_VERSION"));

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Re-initialize telemetry with the CLI override or config-driven level
    // (only takes effect if RUST_LOG env var is not set)
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let client = Arc::new(ContentClient::new(config.installer.api_base_url.clone()));

    // Bootstrap the verified-package registry once; a failure leaves it empty
    let registry = TrustRegistry::bootstrap(&client, &config.installer.registry).await;
    let verification = Arc::new(VerificationService::new(
        registry,
        config.installer.safe_mode,
    ));

    let host = Arc::new(DetachedHost);
    let service = PackageService::new(config, client, verification, host);

    match cli.command {
        Command::View { package } => handle_view(package.as_deref(), &service, format).await,
        Command::Install { reference } => handle_install(&reference, &service, format).await,
        Command::Uninstall { package } => handle_uninstall(&package, &service, format).await,
        Command::Verify => handle_verify(&service, format),
        Command::UpdateSelf => handle_update_self(&service, format).await,
        Command::ReloadSelf => handle_reload_self(&service, format).await,
    }
}
