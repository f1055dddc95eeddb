//! Remote content API client and manifest fetcher
//!
//! Packages live in repositories on a code-hosting service. Every remote read
//! goes through the contents endpoint
//! `GET {base}/repos/{owner}/{repo}/contents/{path}`, which returns a JSON
//! body carrying the file as newline-wrapped base64.
//!
//! The base URL is injected from configuration so tests can point the client
//! at a local mock server. Failures are never retried: a non-success status is
//! surfaced verbatim as `FetchFailed { status }` because most causes (missing
//! file, private repository, rate limit) are permanent.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sdk::errors::PackError;
use sdk::manifest::PackageManifest;
use sdk::types::RepoRef;
use serde::Deserialize;
use std::path::Path;

/// Fixed location of the package descriptor within a repository
pub const MANIFEST_PATH: &str = "package.yml";

/// Response body of the contents endpoint
#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: String,
}

/// HTTP client for the remote content API
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: reqwest::Client,
    base_url: String,
}

impl ContentClient {
    /// Create a client against the given API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one file from a repository and return its decoded bytes
    ///
    /// # Errors
    ///
    /// `FetchFailed { status }` for any non-success response; `Network` for
    /// transport-level failures or a malformed content payload.
    pub async fn fetch_raw(&self, repo: &RepoRef, path: &str) -> Result<Vec<u8>, PackError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url, repo.owner, repo.repo, path
        );

        tracing::debug!(%url, "Fetching remote content");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PackError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PackError::FetchFailed {
                status: status.as_u16(),
            });
        }

        let body: ContentResponse = response
            .json()
            .await
            .map_err(|e| PackError::Network(format!("Malformed content response: {}", e)))?;

        decode_content(&body.content)
    }

    /// Fetch and parse a repository's package manifest, persisting the raw
    /// document before returning
    ///
    /// The raw bytes are written to `<manifests_dir>/<name>.yml` so later
    /// `view` and `uninstall` calls work offline. Persistence happens here,
    /// before any per-file download begins, so a crash mid-install still
    /// leaves manifest metadata consistent with an attempted install.
    pub async fn fetch_manifest(
        &self,
        repo: &RepoRef,
        manifests_dir: &Path,
    ) -> Result<PackageManifest, PackError> {
        let raw = self.fetch_raw(repo, MANIFEST_PATH).await?;

        let manifest = PackageManifest::from_yaml(&raw)
            .map_err(|e| PackError::ManifestParse(e.to_string()))?;

        tokio::fs::create_dir_all(manifests_dir).await?;
        let manifest_path = manifests_dir.join(format!("{}.yml", manifest.name));
        tokio::fs::write(&manifest_path, &raw).await?;

        tracing::info!(
            package = %manifest.name,
            version = %manifest.version,
            "Fetched and persisted manifest"
        );

        Ok(manifest)
    }

    /// Look up the latest published installer version, best-effort
    ///
    /// Reads the self repository's `Cargo.toml` and extracts the first
    /// `version = "…"` assignment. Any failure yields `None`; the outdated
    /// notice is informational only.
    pub async fn check_latest_version(&self, repo: &RepoRef) -> Option<String> {
        let raw = match self.fetch_raw(repo, "Cargo.toml").await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Version check failed: {}", e);
                return None;
            }
        };

        let text = String::from_utf8_lossy(&raw);
        extract_version(&text)
    }
}

/// Decode a newline-wrapped base64 content payload
fn decode_content(encoded: &str) -> Result<Vec<u8>, PackError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    BASE64
        .decode(compact)
        .map_err(|e| PackError::Network(format!("Malformed content payload: {}", e)))
}

/// Extract the first `version = "…"` assignment from a Cargo.toml body
fn extract_version(text: &str) -> Option<String> {
    let after = text.split("version = \"").nth(1)?;
    let version = after.split('"').next()?;
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}
