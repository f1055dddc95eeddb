//! Packdock SDK
//!
//! Shared library providing the package manifest model, package reference
//! types, and error taxonomy used by the Packdock engine.

/// Error types and handling
pub mod errors;

/// Package reference and report types
pub mod types;

/// Package manifest model
pub mod manifest;

// Re-export commonly used types
pub use errors::{PackError, PackErrorExt};
pub use manifest::PackageManifest;
pub use types::{FileFailure, InstallReport, PackageReference, RepoRef};
