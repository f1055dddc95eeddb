//! File installer module
//!
//! Materializes a resolved manifest on disk: one directory per package under
//! the packages root, holding every file the manifest lists at its relative
//! path. The platform and path checks run strictly before any write; the
//! per-file downloads themselves are independent and run concurrently.
//!
//! A file that fails to download is reported and skipped; one missing asset
//! does not abort the rest of the install. Files already written are not
//! rolled back when a later file fails; the failure list tells the caller
//! exactly which assets are missing.

use crate::fetch::ContentClient;
use futures::future;
use sdk::errors::PackError;
use sdk::manifest::PackageManifest;
use sdk::types::{FileFailure, RepoRef};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Downloads and persists the files a manifest lists
pub struct FileInstaller {
    client: Arc<ContentClient>,
    packages_dir: PathBuf,
    platform: String,
}

impl FileInstaller {
    /// Create an installer writing under the given packages root
    pub fn new(client: Arc<ContentClient>, packages_dir: PathBuf, platform: String) -> Self {
        Self {
            client,
            packages_dir,
            platform,
        }
    }

    /// Directory a package's files are installed into
    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.packages_dir.join(package)
    }

    /// Install every file the manifest lists
    ///
    /// Returns the list of per-file failures; an empty list means a complete
    /// install. Terminal errors (`UnsupportedPlatform`, a path escaping the
    /// package directory, local IO) abort before or during the write phase.
    pub async fn install(
        &self,
        repo: &RepoRef,
        manifest: &PackageManifest,
    ) -> Result<Vec<FileFailure>, PackError> {
        // Pre-write gates: platform support and path sanity. Nothing may be
        // written to disk unless both pass.
        if !manifest.supports(&self.platform) {
            return Err(PackError::UnsupportedPlatform {
                package: manifest.name.clone(),
                platform: self.platform.clone(),
            });
        }

        for file in &manifest.files {
            validate_relative_path(file)?;
        }

        let package_dir = self.package_dir(&manifest.name);
        // Pre-existing directory from a prior install is fine; files are
        // overwritten individually, which makes re-installation idempotent.
        tokio::fs::create_dir_all(&package_dir).await?;

        let downloads = manifest
            .files
            .iter()
            .map(|file| self.install_one(repo, &manifest.name, file, &package_dir));

        let mut failures = Vec::new();
        for result in future::join_all(downloads).await {
            match result {
                Ok(()) => {}
                Err(PackError::FileFetchFailed { path, status }) => {
                    tracing::warn!(path = %path, status, "File download failed");
                    failures.push(FileFailure { path, status });
                }
                Err(other) => return Err(other),
            }
        }

        tracing::info!(
            package = %manifest.name,
            installed = manifest.files.len() - failures.len(),
            failed = failures.len(),
            "Wrote package files"
        );

        Ok(failures)
    }

    /// Download one listed file and write it under the package directory
    async fn install_one(
        &self,
        repo: &RepoRef,
        package: &str,
        file: &str,
        package_dir: &Path,
    ) -> Result<(), PackError> {
        let remote_path = format!("{}/{}", package, file);

        let bytes = match self.client.fetch_raw(repo, &remote_path).await {
            Ok(bytes) => bytes,
            Err(PackError::FetchFailed { status }) => {
                return Err(PackError::FileFetchFailed {
                    path: file.to_string(),
                    status,
                })
            }
            Err(other) => return Err(other),
        };

        let target = package_dir.join(file);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        Ok(())
    }
}

/// Reject manifest file paths that would escape the package directory
fn validate_relative_path(path: &str) -> Result<(), PackError> {
    let candidate = Path::new(path);

    if candidate.as_os_str().is_empty() || candidate.is_absolute() {
        return Err(PackError::ManifestParse(format!(
            "Listed file path must be relative: {}",
            path
        )));
    }

    for component in candidate.components() {
        match component {
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PackError::ManifestParse(format!(
                    "Listed file path escapes the package directory: {}",
                    path
                )))
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_relative_path_accepts_nested() {
        assert!(validate_relative_path("data/widgets.json").is_ok());
        assert!(validate_relative_path("commands.py").is_ok());
    }

    #[test]
    fn test_validate_relative_path_rejects_traversal() {
        assert!(validate_relative_path("../escape.py").is_err());
        assert!(validate_relative_path("data/../../escape.py").is_err());
    }

    #[test]
    fn test_validate_relative_path_rejects_absolute() {
        assert!(validate_relative_path("/etc/passwd").is_err());
        assert!(validate_relative_path("").is_err());
    }
}
