//! Configuration management
//!
//! This module handles loading, validation, and management of the Packdock
//! configuration. Configuration is stored in TOML format at
//! ~/.packdock/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Data directory, log level
//! - **installer**: Safe mode, host platform, content API endpoint, the
//!   verified-package registry location, and the installer's own repository
//!   (used by `update-self` and `reload-self`)
//!
//! # Path Expansion
//!
//! The configuration system automatically:
//! - Expands ~ to the user's home directory
//! - Creates the data directory if it doesn't exist

use sdk::errors::PackError;
use sdk::types::RepoRef;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// This structure represents the complete Packdock configuration loaded from
/// ~/.packdock/config.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// Installer settings
    #[serde(default)]
    pub installer: InstallerConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Installer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallerConfig {
    /// Block unverified packages until an explicit `verify` confirmation.
    /// Disabling this is an explicit opt-out: every install proceeds.
    #[serde(default = "default_true")]
    pub safe_mode: bool,

    /// Identity of the running host, matched against a manifest's
    /// `supported` list
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Emit a notice when a newer installer version is published
    #[serde(default = "default_true")]
    pub outdated_warnings: bool,

    /// Base URL of the content API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Where the verified-package list lives
    #[serde(default)]
    pub registry: RegistryConfig,

    /// The installer's own repository, for self-update and self-reload
    #[serde(default)]
    pub self_package: SelfPackageConfig,
}

/// Location of the remote verified-package list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Repository owner
    #[serde(default = "default_registry_owner")]
    pub owner: String,

    /// Repository name
    #[serde(default = "default_registry_repo")]
    pub repo: String,

    /// Path of the list file within the repository
    #[serde(default = "default_registry_path")]
    pub path: String,
}

/// The installer's own package identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfPackageConfig {
    /// Repository owner
    #[serde(default = "default_self_owner")]
    pub owner: String,

    /// Repository name
    #[serde(default = "default_self_repo")]
    pub repo: String,

    /// Path of the self-update script within the repository
    #[serde(default = "default_self_script")]
    pub script: String,

    /// Module name of the installer inside the host process,
    /// relative to the platform prefix
    #[serde(default = "default_self_module")]
    pub module: String,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.packdock")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_platform() -> String {
    "ballsdex".to_string()
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_registry_owner() -> String {
    "packdock".to_string()
}

fn default_registry_repo() -> String {
    "registry".to_string()
}

fn default_registry_path() -> String {
    "verified.txt".to_string()
}

fn default_self_owner() -> String {
    "packdock".to_string()
}

fn default_self_repo() -> String {
    "packdock".to_string()
}

fn default_self_script() -> String {
    "installer.py".to_string()
}

fn default_self_module() -> String {
    "core.packdock".to_string()
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            platform: default_platform(),
            outdated_warnings: true,
            api_base_url: default_api_base_url(),
            registry: RegistryConfig::default(),
            self_package: SelfPackageConfig::default(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            owner: default_registry_owner(),
            repo: default_registry_repo(),
            path: default_registry_path(),
        }
    }
}

impl Default for SelfPackageConfig {
    fn default() -> Self {
        Self {
            owner: default_self_owner(),
            repo: default_self_repo(),
            script: default_self_script(),
            module: default_self_module(),
        }
    }
}

impl RegistryConfig {
    /// Repository reference of the registry
    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(self.owner.clone(), self.repo.clone())
    }
}

impl SelfPackageConfig {
    /// Repository reference of the installer itself
    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(self.owner.clone(), self.repo.clone())
    }
}

impl Config {
    /// Load configuration from the default location (~/.packdock/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default
    /// configuration. Validates the configuration after loading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, TOML parsing fails, or
    /// validation fails.
    pub fn load_or_create() -> Result<Self, PackError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, PackError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| PackError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| PackError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, PackError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PackError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default_config();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| PackError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| PackError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.packdock/config.toml)
    fn default_config_path() -> Result<PathBuf, PackError> {
        let home = dirs::home_dir()
            .ok_or_else(|| PackError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".packdock").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig {
                data_dir: default_data_dir(),
                log_level: default_log_level(),
            },
            installer: InstallerConfig::default(),
        }
    }

    /// Directory holding one subdirectory per installed package
    pub fn packages_dir(&self) -> PathBuf {
        self.core.data_dir.join("packages")
    }

    /// Directory holding one persisted manifest per installed package
    pub fn manifests_dir(&self) -> PathBuf {
        self.core.data_dir.join("manifests")
    }

    /// Path of the persisted manifest for a package name
    pub fn manifest_path(&self, package: &str) -> PathBuf {
        self.manifests_dir().join(format!("{}.yml", package))
    }

    /// Validate and process configuration
    ///
    /// Expands ~ in the data directory, creates it if missing, and checks
    /// enumerated fields.
    fn validate_and_process(&mut self) -> Result<(), PackError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(PackError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.installer.platform.trim().is_empty() {
            return Err(PackError::Config(
                "installer.platform must not be empty".to_string(),
            ));
        }

        if self.installer.api_base_url.trim().is_empty() {
            return Err(PackError::Config(
                "installer.api_base_url must not be empty".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;

        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                PackError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, PackError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| PackError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| PackError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| PackError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
