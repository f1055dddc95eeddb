//! Package manifest model
//!
//! A package is described by a `package.yml` document at the root of its
//! repository. The manifest lists the files to install, the host platforms the
//! package supports, and display metadata. The raw document is persisted
//! locally on install so `view` and `uninstall` work without network access.

use serde::{Deserialize, Serialize};

/// Fallback display color when the manifest does not declare one
pub const DEFAULT_COLOR: &str = "03BAFC";

/// Descriptor for one installable package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Package name; also names the install directory and the host module
    pub name: String,
    /// Author, used for failure attribution
    pub author: String,
    /// Free-text description
    pub description: String,
    /// Semantic version string
    pub version: String,
    /// Relative paths of the files to install
    pub files: Vec<String>,
    /// Host platforms this package supports
    pub supported: Vec<String>,
    /// Optional display color (hex without `#`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Optional logo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl PackageManifest {
    /// Parse a manifest from YAML bytes
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(bytes)
    }

    /// Serialize the manifest to a YAML string
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Check whether the given host platform is supported
    pub fn supports(&self, platform: &str) -> bool {
        self.supported.iter().any(|entry| entry == platform)
    }

    /// Display color, falling back to the default
    pub fn display_color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_COLOR)
    }
}
