//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - install: Fetch, verify, and activate a package
//! - uninstall: Remove a package's files and live module
//! - view: Show the installer or an installed package, offline
//! - verify: Confirm the next install of an unverified package
//! - update-self: Fetch and run the installer's own update script
//! - reload-self: Reload the installer's module in the host

use anyhow::Result;
use sdk::errors::{PackError, PackErrorExt};
use sdk::types::{InstallReport, PackageReference};
use serde_json::json;

use crate::service::PackageService;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Install the package a user-supplied reference points at
pub async fn handle_install(
    reference: &str,
    service: &PackageService,
    format: OutputFormat,
) -> Result<()> {
    let reference = PackageReference::parse(reference);

    match service.install(&reference).await {
        Ok(report) => {
            render_install_report(&report, format);
            Ok(())
        }
        Err(PackError::UntrustedReference(label)) => {
            render_caution(&label, format);
            Ok(())
        }
        Err(PackError::UnknownPackage(name)) => {
            match format {
                OutputFormat::Text => println!(
                    "`{}` is not a verified package name. Pass an `owner/repo` \
                     reference to install it directly.",
                    name
                ),
                OutputFormat::Json => println!(
                    "{}",
                    json!({ "status": "unknown_package", "package": name })
                ),
            }
            Ok(())
        }
        Err(e) => {
            render_error(&e, format);
            Err(e.into())
        }
    }
}

/// Remove an installed package
pub async fn handle_uninstall(
    package: &str,
    service: &PackageService,
    format: OutputFormat,
) -> Result<()> {
    match service.uninstall(package).await {
        Ok(()) => {
            match format {
                OutputFormat::Text => println!("Uninstalled `{}`.", package),
                OutputFormat::Json => println!(
                    "{}",
                    json!({ "status": "uninstalled", "package": package })
                ),
            }
            Ok(())
        }
        Err(PackError::NotFound(name)) => {
            match format {
                OutputFormat::Text => println!("Package `{}` is not installed.", name),
                OutputFormat::Json => {
                    println!("{}", json!({ "status": "not_found", "package": name }))
                }
            }
            Ok(())
        }
        Err(e) => {
            render_error(&e, format);
            Err(e.into())
        }
    }
}

/// Show the installer's identity or an installed package's manifest
///
/// Works entirely from local state; a package name that was never installed
/// reports "not found" rather than fetching anything.
pub async fn handle_view(
    package: Option<&str>,
    service: &PackageService,
    format: OutputFormat,
) -> Result<()> {
    let Some(package) = package else {
        return handle_view_self(service, format).await;
    };

    match service.view(package).await {
        Ok(manifest) => {
            match format {
                OutputFormat::Text => {
                    println!("{} v{}", manifest.name, manifest.version);
                    println!("  Author:      {}", manifest.author);
                    println!("  Description: {}", manifest.description);
                    println!("  Files:       {}", manifest.files.len());
                    println!("  Supported:   {}", manifest.supported.join(", "));
                }
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&manifest)
                        .unwrap_or_else(|_| "{}".to_string())
                ),
            }
            Ok(())
        }
        Err(PackError::NotFound(name)) => {
            match format {
                OutputFormat::Text => println!("Package `{}` is not installed.", name),
                OutputFormat::Json => {
                    println!("{}", json!({ "status": "not_found", "package": name }))
                }
            }
            Ok(())
        }
        Err(e) => {
            render_error(&e, format);
            Err(e.into())
        }
    }
}

/// Show the installer's own identity and version
async fn handle_view_self(service: &PackageService, format: OutputFormat) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let outdated = service.check_outdated().await;

    match format {
        OutputFormat::Text => {
            println!("Packdock v{}", version);
            println!("  Remote package installer for bot extension packages.");
            if let Some(latest) = &outdated {
                println!(
                    "  A newer version is available: v{}. Run `packdock update-self`.",
                    latest
                );
            }
        }
        OutputFormat::Json => println!(
            "{}",
            json!({
                "name": "packdock",
                "version": version,
                "latest": outdated,
            })
        ),
    }

    Ok(())
}

/// Grant a one-shot confirmation for the next install attempt
pub fn handle_verify(service: &PackageService, format: OutputFormat) -> Result<()> {
    let was_pending = service.verify();

    match format {
        OutputFormat::Text => {
            if was_pending {
                println!("A confirmation was already pending; the next install may proceed.");
            } else {
                println!(
                    "Confirmed. The next install will proceed even if the package is unverified."
                );
            }
        }
        OutputFormat::Json => println!(
            "{}",
            json!({ "status": "confirmed", "was_pending": was_pending })
        ),
    }

    Ok(())
}

/// Fetch and run the installer's own update script
pub async fn handle_update_self(service: &PackageService, format: OutputFormat) -> Result<()> {
    match service.update_self().await {
        Ok(()) => {
            match format {
                OutputFormat::Text => println!("Self-update script handed to the host."),
                OutputFormat::Json => println!("{}", json!({ "status": "updating" })),
            }
            Ok(())
        }
        Err(e) => {
            render_error(&e, format);
            Err(e.into())
        }
    }
}

/// Reload the installer's module in the host
pub async fn handle_reload_self(service: &PackageService, format: OutputFormat) -> Result<()> {
    match service.reload_self().await {
        Ok(()) => {
            match format {
                OutputFormat::Text => println!("Installer module reloaded."),
                OutputFormat::Json => println!("{}", json!({ "status": "reloaded" })),
            }
            Ok(())
        }
        Err(e) => {
            render_error(&e, format);
            Err(e.into())
        }
    }
}

/// Render a finished install, including the per-file failure list
fn render_install_report(report: &InstallReport, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for failure in &report.failures {
                println!(
                    "Failed to install `{}` (status {}). Report this issue to `{}`.",
                    failure.path, failure.status, report.author
                );
            }
            println!(
                "Installed `{}` v{} by {} in {} ms.",
                report.name, report.version, report.author, report.duration_ms
            );
            if !report.description.is_empty() {
                println!("  {}", report.description);
            }
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
        ),
    }
}

/// Render the trust-gate caution for a blocked install
fn render_caution(label: &str, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("CAUTION: `{}` is not a verified package.", label);
            println!(
                "Installing it will run third-party code that nobody has reviewed. \
                 If you trust the author, run `packdock verify` and install again."
            );
        }
        OutputFormat::Json => println!(
            "{}",
            json!({ "status": "blocked", "reference": label })
        ),
    }
}

/// Render a terminal error with its user hint
fn render_error(error: &PackError, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            eprintln!("Error: {}", error);
            eprintln!("  {}", error.user_hint());
        }
        OutputFormat::Json => eprintln!(
            "{}",
            json!({
                "status": "error",
                "error": error.to_string(),
                "hint": error.user_hint(),
                "recoverable": error.is_recoverable(),
            })
        ),
    }
}
