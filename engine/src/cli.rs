//! CLI interface for Packdock
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for the package installer.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Packdock package installer
///
/// Fetches bot extension packages from remote repositories, verifies their
/// source, and hot-loads them into the running host process.
#[derive(Parser, Debug)]
#[command(name = "packdock")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the installer, or an installed package's manifest
    View {
        /// Installed package name (omit to show the installer itself)
        package: Option<String>,
    },

    /// Install a package from a verified name, owner/repo pair, or URL
    Install {
        /// Package name, `owner/repo`, or repository URL
        reference: String,
    },

    /// Remove an installed package and unload its module
    Uninstall {
        /// Installed package name
        package: String,
    },

    /// Confirm the next install of an unverified package
    Verify,

    /// Update the installer itself
    UpdateSelf,

    /// Reload the installer's module in the host process
    ReloadSelf,
}
