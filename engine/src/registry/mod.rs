//! Trust registry built from the remote verified-package list
//!
//! The registry maps symbolic package names to canonical repository
//! references. It is built once at process start from an authoritative list
//! file (`name : owner/repo` per line, `#` for comments) and is read-only
//! afterwards. Bootstrap is best-effort: if the list cannot be fetched the
//! registry stays empty, a warning is logged, and no retry is scheduled.
//! Named installs will simply not resolve until the process restarts.

use crate::config::RegistryConfig;
use crate::fetch::ContentClient;
use sdk::types::RepoRef;
use std::collections::HashMap;

/// Read-only mapping of symbolic package name to canonical repository
#[derive(Debug, Default)]
pub struct TrustRegistry {
    entries: HashMap<String, RepoRef>,
}

impl TrustRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the registry from the remote list, best-effort
    pub async fn bootstrap(client: &ContentClient, location: &RegistryConfig) -> Self {
        match client.fetch_raw(&location.repo_ref(), &location.path).await {
            Ok(raw) => {
                let registry = Self::parse(&String::from_utf8_lossy(&raw));
                tracing::info!(
                    packages = registry.len(),
                    "Trust registry built from {}",
                    location.repo_ref()
                );
                registry
            }
            Err(e) => {
                tracing::warn!("Failed to build trust registry: {}", e);
                Self::empty()
            }
        }
    }

    /// Parse the list format: one `name : owner/repo` entry per line
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((name, target)) = line.split_once(" : ") else {
                tracing::warn!("Skipping malformed registry line: {}", line);
                continue;
            };

            let Some(repo) = RepoRef::parse(target.trim()) else {
                tracing::warn!("Skipping registry entry with bad target: {}", line);
                continue;
            };

            entries.insert(name.trim().to_string(), repo);
        }

        Self { entries }
    }

    /// Resolve a symbolic name to its canonical repository
    pub fn resolve(&self, name: &str) -> Option<&RepoRef> {
        self.entries.get(name)
    }

    /// Check whether a raw reference matches any registered repository
    pub fn contains_repo(&self, repo: &RepoRef) -> bool {
        self.entries.values().any(|entry| entry == repo)
    }

    /// Number of registered packages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
