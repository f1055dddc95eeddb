//! Host runtime interface and extension loader bridge
//!
//! The host bot process owns the extension lifecycle; the installer only asks
//! it to activate, reload, or drop a module by name. That seam is the
//! [`HostRuntime`] trait. Installed packages load as
//! `<platform>.packages.<name>`; the installer itself lives under a
//! configured module path.
//!
//! Loading a module that is already active is the expected re-install/update
//! path: the host reports it as a distinct outcome and the bridge branches to
//! a reload instead of treating it as a failure.

use async_trait::async_trait;
use sdk::errors::PackError;
use std::sync::Arc;
use thiserror::Error;

/// Result of a load request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The module was loaded fresh
    Loaded,
    /// A module of that name is already active; caller should reload
    AlreadyLoaded,
}

/// Failure reported by the host runtime
#[derive(Debug, Error)]
pub enum HostError {
    /// The named module is not currently loaded
    #[error("module not loaded: {0}")]
    NotLoaded(String),

    /// Any other activation failure, with the host's reason
    #[error("{0}")]
    Failed(String),
}

/// Interface the host bot process exposes to the installer
#[async_trait]
pub trait HostRuntime: Send + Sync {
    /// Activate a code module by name
    async fn load(&self, module: &str) -> Result<LoadOutcome, HostError>;

    /// Re-activate an already loaded module
    async fn reload(&self, module: &str) -> Result<(), HostError>;

    /// Drop a loaded module
    async fn unload(&self, module: &str) -> Result<(), HostError>;

    /// Execute a script on the host's privileged path (self-update only)
    async fn exec_privileged(&self, script: &str) -> Result<(), HostError>;
}

/// Bridges installed packages into the host process
pub struct ExtensionBridge {
    host: Arc<dyn HostRuntime>,
    platform: String,
}

impl ExtensionBridge {
    /// Create a bridge for the given host and platform prefix
    pub fn new(host: Arc<dyn HostRuntime>, platform: impl Into<String>) -> Self {
        Self {
            host,
            platform: platform.into(),
        }
    }

    /// Module name a package loads under
    pub fn package_module(&self, package: &str) -> String {
        format!("{}.packages.{}", self.platform, package)
    }

    /// Full module name for a platform-relative path
    pub fn platform_module(&self, relative: &str) -> String {
        format!("{}.{}", self.platform, relative)
    }

    /// Activate a freshly installed package
    ///
    /// Already-loaded is handled as a branch, not a failure: a prior install
    /// of the same name means this is an update and the module is reloaded.
    pub async fn activate(&self, package: &str) -> Result<(), PackError> {
        let module = self.package_module(package);

        match self.host.load(&module).await {
            Ok(LoadOutcome::Loaded) => {
                tracing::info!(module = %module, "Module loaded");
                Ok(())
            }
            Ok(LoadOutcome::AlreadyLoaded) => {
                tracing::info!(module = %module, "Module already active, reloading");
                self.host
                    .reload(&module)
                    .await
                    .map_err(|e| PackError::ActivationFailed {
                        module: module.clone(),
                        reason: e.to_string(),
                    })
            }
            Err(e) => Err(PackError::ActivationFailed {
                module,
                reason: e.to_string(),
            }),
        }
    }

    /// Drop a package's module; "not loaded" is non-fatal
    pub async fn deactivate(&self, package: &str) -> Result<(), PackError> {
        let module = self.package_module(package);

        match self.host.unload(&module).await {
            Ok(()) => Ok(()),
            Err(HostError::NotLoaded(_)) => {
                tracing::debug!(module = %module, "Module was not loaded, skipping unload");
                Ok(())
            }
            Err(e) => Err(PackError::ActivationFailed {
                module,
                reason: e.to_string(),
            }),
        }
    }

    /// Reload an installer-owned module by its platform-relative path
    pub async fn reload_module(&self, relative: &str) -> Result<(), PackError> {
        let module = self.platform_module(relative);

        self.host
            .reload(&module)
            .await
            .map_err(|e| PackError::ActivationFailed {
                module,
                reason: e.to_string(),
            })
    }

    /// Hand a script to the host's privileged execution path
    pub async fn exec_privileged(&self, script: &str) -> Result<(), PackError> {
        self.host
            .exec_privileged(script)
            .await
            .map_err(|e| PackError::ActivationFailed {
                module: self.platform_module("core"),
                reason: e.to_string(),
            })
    }
}

/// Host used when the CLI runs without a live bot process attached
///
/// Activation requests are logged and acknowledged so the filesystem side of
/// install/uninstall can be driven standalone; a real deployment wires the
/// engine to the host process implementing [`HostRuntime`].
pub struct DetachedHost;

#[async_trait]
impl HostRuntime for DetachedHost {
    async fn load(&self, module: &str) -> Result<LoadOutcome, HostError> {
        tracing::info!(module = %module, "No live host attached; load acknowledged");
        Ok(LoadOutcome::Loaded)
    }

    async fn reload(&self, module: &str) -> Result<(), HostError> {
        tracing::info!(module = %module, "No live host attached; reload acknowledged");
        Ok(())
    }

    async fn unload(&self, module: &str) -> Result<(), HostError> {
        tracing::info!(module = %module, "No live host attached; unload acknowledged");
        Ok(())
    }

    async fn exec_privileged(&self, _script: &str) -> Result<(), HostError> {
        Err(HostError::Failed(
            "privileged execution requires a live host process".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scriptable host that records every call
    struct RecordingHost {
        calls: Mutex<Vec<String>>,
        loaded: Mutex<Vec<String>>,
    }

    impl RecordingHost {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                loaded: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HostRuntime for RecordingHost {
        async fn load(&self, module: &str) -> Result<LoadOutcome, HostError> {
            self.calls.lock().unwrap().push(format!("load:{}", module));
            let mut loaded = self.loaded.lock().unwrap();
            if loaded.iter().any(|m| m == module) {
                Ok(LoadOutcome::AlreadyLoaded)
            } else {
                loaded.push(module.to_string());
                Ok(LoadOutcome::Loaded)
            }
        }

        async fn reload(&self, module: &str) -> Result<(), HostError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("reload:{}", module));
            Ok(())
        }

        async fn unload(&self, module: &str) -> Result<(), HostError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("unload:{}", module));
            let mut loaded = self.loaded.lock().unwrap();
            match loaded.iter().position(|m| m == module) {
                Some(index) => {
                    loaded.remove(index);
                    Ok(())
                }
                None => Err(HostError::NotLoaded(module.to_string())),
            }
        }

        async fn exec_privileged(&self, _script: &str) -> Result<(), HostError> {
            self.calls.lock().unwrap().push("exec".to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_activate_fresh_module_loads_once() {
        let host = Arc::new(RecordingHost::new());
        let bridge = ExtensionBridge::new(host.clone(), "ballsdex");

        bridge.activate("widgets").await.unwrap();

        assert_eq!(host.calls(), vec!["load:ballsdex.packages.widgets"]);
    }

    #[tokio::test]
    async fn test_activate_twice_branches_to_reload() {
        let host = Arc::new(RecordingHost::new());
        let bridge = ExtensionBridge::new(host.clone(), "ballsdex");

        bridge.activate("widgets").await.unwrap();
        bridge.activate("widgets").await.unwrap();

        assert_eq!(
            host.calls(),
            vec![
                "load:ballsdex.packages.widgets",
                "load:ballsdex.packages.widgets",
                "reload:ballsdex.packages.widgets",
            ]
        );
    }

    #[tokio::test]
    async fn test_deactivate_not_loaded_is_non_fatal() {
        let host = Arc::new(RecordingHost::new());
        let bridge = ExtensionBridge::new(host.clone(), "ballsdex");

        bridge.deactivate("widgets").await.unwrap();
    }

    #[tokio::test]
    async fn test_load_failure_surfaces_module_name() {
        struct FailingHost;

        #[async_trait]
        impl HostRuntime for FailingHost {
            async fn load(&self, _module: &str) -> Result<LoadOutcome, HostError> {
                Err(HostError::Failed("syntax error in extension".to_string()))
            }
            async fn reload(&self, _module: &str) -> Result<(), HostError> {
                Ok(())
            }
            async fn unload(&self, _module: &str) -> Result<(), HostError> {
                Ok(())
            }
            async fn exec_privileged(&self, _script: &str) -> Result<(), HostError> {
                Ok(())
            }
        }

        let bridge = ExtensionBridge::new(Arc::new(FailingHost), "ballsdex");
        let error = bridge.activate("widgets").await.unwrap_err();

        match error {
            PackError::ActivationFailed { module, reason } => {
                assert_eq!(module, "ballsdex.packages.widgets");
                assert!(reason.contains("syntax error"));
            }
            other => panic!("Expected ActivationFailed, got {:?}", other),
        }
    }
}
