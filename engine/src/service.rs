//! Package lifecycle orchestration
//!
//! `PackageService` wires the trust gate, the content client, the file
//! installer, and the host bridge into the lifecycle operations the CLI
//! exposes. Each operation is one pass through the pipeline; the only
//! non-terminal failures are per-file download errors, which are carried in
//! the install report instead of aborting it.

use crate::config::Config;
use crate::fetch::ContentClient;
use crate::host::{ExtensionBridge, HostRuntime};
use crate::installer::FileInstaller;
use crate::trust::{GateDecision, VerificationService};
use sdk::errors::PackError;
use sdk::manifest::PackageManifest;
use sdk::types::{InstallReport, PackageReference};
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates install, uninstall, and self-maintenance
pub struct PackageService {
    config: Config,
    client: Arc<ContentClient>,
    verification: Arc<VerificationService>,
    installer: FileInstaller,
    bridge: ExtensionBridge,
}

impl PackageService {
    /// Wire the service from its components
    pub fn new(
        config: Config,
        client: Arc<ContentClient>,
        verification: Arc<VerificationService>,
        host: Arc<dyn HostRuntime>,
    ) -> Self {
        let installer = FileInstaller::new(
            Arc::clone(&client),
            config.packages_dir(),
            config.installer.platform.clone(),
        );
        let bridge = ExtensionBridge::new(host, config.installer.platform.clone());

        Self {
            config,
            client,
            verification,
            installer,
            bridge,
        }
    }

    /// The verification service backing the trust gate
    pub fn verification(&self) -> &VerificationService {
        &self.verification
    }

    /// Install (or update) the package a reference points at
    ///
    /// Steps in order: trust gate, manifest fetch and persist, file install,
    /// host activation. A blocked gate returns `UntrustedReference` before any
    /// network call. Per-file download failures do not stop the install; they
    /// are listed in the returned report.
    pub async fn install(&self, reference: &PackageReference) -> Result<InstallReport, PackError> {
        let started = Instant::now();

        let repo = match self.verification.decide(reference)? {
            GateDecision::Proceed {
                resolved,
                consumed_confirmation,
            } => {
                if consumed_confirmation {
                    tracing::info!(reference = %reference.label(), "Confirmation consumed");
                }
                resolved
            }
            GateDecision::Blocked => {
                tracing::warn!(reference = %reference.label(), "Install blocked by trust gate");
                return Err(PackError::UntrustedReference(reference.label()));
            }
        };

        tracing::info!(repo = %repo, "Installing package");

        let manifest = self
            .client
            .fetch_manifest(&repo, &self.config.manifests_dir())
            .await?;

        let failures = self.installer.install(&repo, &manifest).await?;

        self.bridge.activate(&manifest.name).await?;

        let report = InstallReport {
            name: manifest.name,
            version: manifest.version,
            description: manifest.description,
            author: manifest.author,
            duration_ms: started.elapsed().as_millis() as u64,
            failures,
        };

        tracing::info!(
            package = %report.name,
            duration_ms = report.duration_ms,
            failed_files = report.failures.len(),
            "Install finished"
        );

        Ok(report)
    }

    /// Remove a package's files, persisted manifest, and live module
    ///
    /// A package that was never installed is `NotFound` and nothing on disk is
    /// touched. An unload of a module the host no longer has is skipped.
    pub async fn uninstall(&self, package: &str) -> Result<(), PackError> {
        let package_dir = self.installer.package_dir(package);

        if !package_dir.exists() {
            return Err(PackError::NotFound(package.to_string()));
        }

        tokio::fs::remove_dir_all(&package_dir).await?;

        let manifest_path = self.config.manifest_path(package);
        if manifest_path.exists() {
            tokio::fs::remove_file(&manifest_path).await?;
        }

        self.bridge.deactivate(package).await?;

        tracing::info!(package = %package, "Package uninstalled");
        Ok(())
    }

    /// Read the persisted manifest of an installed package, offline
    pub async fn view(&self, package: &str) -> Result<PackageManifest, PackError> {
        let manifest_path = self.config.manifest_path(package);

        let raw = match tokio::fs::read(&manifest_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PackError::NotFound(package.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        PackageManifest::from_yaml(&raw).map_err(|e| PackError::ManifestParse(e.to_string()))
    }

    /// Grant a one-shot confirmation for the next install
    pub fn verify(&self) -> bool {
        self.verification.confirm()
    }

    /// Fetch the installer's own update script and hand it to the host
    ///
    /// The self repository is fixed in configuration; this path does not go
    /// through the trust gate.
    pub async fn update_self(&self) -> Result<(), PackError> {
        let self_pkg = &self.config.installer.self_package;
        let repo = self_pkg.repo_ref();

        tracing::info!(repo = %repo, script = %self_pkg.script, "Fetching self-update script");

        // A failed script fetch is the installer's problem, not a package
        // author's; re-attribute the status accordingly.
        let raw = match self.client.fetch_raw(&repo, &self_pkg.script).await {
            Ok(raw) => raw,
            Err(PackError::FetchFailed { status }) => {
                return Err(PackError::SelfUpdateFailed { status })
            }
            Err(other) => return Err(other),
        };
        let script = String::from_utf8_lossy(&raw);

        self.bridge.exec_privileged(&script).await
    }

    /// Reload the installer's own module in the host
    pub async fn reload_self(&self) -> Result<(), PackError> {
        self.bridge
            .reload_module(&self.config.installer.self_package.module)
            .await
    }

    /// Check whether a newer installer version is published, best-effort
    ///
    /// Returns the newer version string when the published version differs
    /// from the running one; `None` when up to date, disabled, or the check
    /// failed.
    pub async fn check_outdated(&self) -> Option<String> {
        if !self.config.installer.outdated_warnings {
            return None;
        }

        let repo = self.config.installer.self_package.repo_ref();
        let latest = self.client.check_latest_version(&repo).await?;

        if latest != env!("CARGO_PKG_VERSION") {
            Some(latest)
        } else {
            None
        }
    }
}
