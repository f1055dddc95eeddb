//! Package reference and report types

use serde::{Deserialize, Serialize};

/// Canonical repository reference on the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Create a new RepoRef
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse an `owner/repo` pair
    ///
    /// Returns `None` unless the input is exactly two non-empty segments
    /// separated by a single slash.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split('/');
        let owner = parts.next()?;
        let repo = parts.next()?;
        if owner.is_empty() || repo.is_empty() || parts.next().is_some() {
            return None;
        }
        Some(Self::new(owner, repo))
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// How the caller referred to a package
///
/// A symbolic name is resolved through the trust registry; a raw repository
/// reference is explicit and never goes through registry name lookup, even if
/// the repository name collides with a registered symbolic name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageReference {
    /// Symbolic name to be resolved through the trust registry
    Named(String),
    /// Explicit `(owner, repository)` pair
    Repo(RepoRef),
}

impl PackageReference {
    /// Parse user input into a package reference
    ///
    /// `https://github.com/{owner}/{repo}` and bare `owner/repo` become
    /// [`PackageReference::Repo`]; anything else is a symbolic name.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim().trim_end_matches('/');

        if let Some(rest) = trimmed.strip_prefix("https://github.com/") {
            if let Some(repo) = RepoRef::parse(rest) {
                return Self::Repo(repo);
            }
        }

        if let Some(repo) = RepoRef::parse(trimmed) {
            return Self::Repo(repo);
        }

        Self::Named(trimmed.to_string())
    }

    /// Display form used in messages
    pub fn label(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::Repo(repo) => repo.to_string(),
        }
    }
}

/// One file that could not be downloaded during an install
///
/// Per-file failures are non-terminal: the install continues with the
/// remaining files and reports each failure individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Path as listed in the manifest
    pub path: String,
    /// HTTP status returned by the content API
    pub status: u16,
}

/// Result of a completed install
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallReport {
    /// Package name from the manifest
    pub name: String,
    /// Package version from the manifest
    pub version: String,
    /// Free-text description from the manifest
    pub description: String,
    /// Manifest author, used for failure attribution
    pub author: String,
    /// Wall-clock duration of the whole operation in milliseconds
    pub duration_ms: u64,
    /// Files that failed to download (install still completed)
    pub failures: Vec<FileFailure>,
}
