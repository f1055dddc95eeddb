//! Packdock Engine Library
//!
//! This library provides the core functionality of the Packdock installer.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Remote content API client and manifest fetcher
pub mod fetch;

/// Trust registry built from the remote verified-package list
pub mod registry;

/// Trust gate and confirmation flag
pub mod trust;

/// File installer module
pub mod installer;

/// Host runtime interface and extension loader bridge
pub mod host;

/// Package lifecycle orchestration
pub mod service;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
