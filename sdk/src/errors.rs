//! Error types and handling
//!
//! This module provides the error types used throughout the Packdock engine.
//! All errors implement the `PackErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Terminal install failures carry the remote status code when one exists so
//! the caller can report it verbatim, plus an attribution (package author or
//! installer maintainer) rendered by the command front-end.

use thiserror::Error;

/// Trait for Packdock error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait PackErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain secrets
    /// or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around (for example by
    /// running `verify` first). Non-recoverable errors end the attempt.
    fn is_recoverable(&self) -> bool;
}

/// Main installer error type
///
/// This enum represents all possible errors that can occur while installing,
/// uninstalling, viewing, or updating packages.
///
/// # Error Categories
///
/// - **Trust**: untrusted or unknown package references
/// - **Fetch**: manifest or file retrieval failures (status code included)
/// - **Install**: platform mismatch, activation failures
/// - **Local**: missing packages, configuration, IO
#[derive(Debug, Error)]
pub enum PackError {
    // Trust gate errors
    #[error("Package reference is not verified: {0}")]
    UntrustedReference(String),

    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    // Manifest retrieval errors
    #[error("Manifest fetch failed with status {status}")]
    FetchFailed { status: u16 },

    #[error("Manifest parse failed: {0}")]
    ManifestParse(String),

    // File installer errors
    #[error("File fetch failed for {path} with status {status}")]
    FileFetchFailed { path: String, status: u16 },

    #[error("Package {package} does not support platform {platform}")]
    UnsupportedPlatform { package: String, platform: String },

    // Loader bridge errors
    #[error("Activation failed for module {module}: {reason}")]
    ActivationFailed { module: String, reason: String },

    // Self-maintenance errors
    #[error("Self-update script fetch failed with status {status}")]
    SelfUpdateFailed { status: u16 },

    // Local lifecycle errors
    #[error("Package not found: {0}")]
    NotFound(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Network transport errors (no HTTP status available)
    #[error("Network error: {0}")]
    Network(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PackErrorExt for PackError {
    fn user_hint(&self) -> &str {
        match self {
            // Trust gate errors
            Self::UntrustedReference(_) => {
                "Run the `verify` command to confirm you want to install this package"
            }
            Self::UnknownPackage(_) => {
                "Package is not in the verified registry. Pass a repository reference instead"
            }

            // Manifest retrieval errors
            Self::FetchFailed { .. } => {
                "Could not retrieve the package manifest. Report this to the package author"
            }
            Self::ManifestParse(_) => {
                "The package manifest is malformed. Report this to the package author"
            }

            // File installer errors
            Self::FileFetchFailed { .. } => {
                "A package file could not be downloaded. Report this to the package author"
            }
            Self::UnsupportedPlatform { .. } => "This package does not support your host platform",

            // Loader bridge errors
            Self::ActivationFailed { .. } => {
                "Package files were written but the module could not be loaded. Check the host logs"
            }

            // Self-maintenance errors
            Self::SelfUpdateFailed { .. } => {
                "Could not retrieve the installer update script. Report this to the maintainer"
            }

            // Local lifecycle errors
            Self::NotFound(_) => "The package you entered does not exist",

            // Configuration errors
            Self::Config(_) => "Check your config.toml file for errors",

            // Network transport errors
            Self::Network(_) => "Network operation failed. Check your connection",

            // Generic IO error
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable within the current attempt
            Self::FetchFailed { .. }
            | Self::ManifestParse(_)
            | Self::UnsupportedPlatform { .. }
            | Self::ActivationFailed { .. }
            | Self::SelfUpdateFailed { .. } => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
