//! Integration tests for uninstall, offline view, and self-maintenance

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use packdock_engine::config::Config;
use packdock_engine::fetch::ContentClient;
use packdock_engine::host::{HostError, HostRuntime, LoadOutcome};
use packdock_engine::registry::TrustRegistry;
use packdock_engine::service::PackageService;
use packdock_engine::trust::VerificationService;
use sdk::errors::PackError;

const MANIFEST: &str = "\
name: widgets
author: Acme
description: Widget commands
version: 1.0.0
files:
  - commands.py
supported:
  - ballsdex
";

/// Host double that records calls and captures privileged scripts
struct RecordingHost {
    calls: Mutex<Vec<String>>,
    scripts: Mutex<Vec<String>>,
    loaded: Mutex<Vec<String>>,
}

impl RecordingHost {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripts: Mutex::new(Vec::new()),
            loaded: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HostRuntime for RecordingHost {
    async fn load(&self, module: &str) -> Result<LoadOutcome, HostError> {
        self.calls.lock().unwrap().push(format!("load:{}", module));
        self.loaded.lock().unwrap().push(module.to_string());
        Ok(LoadOutcome::Loaded)
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
    async fn exec_privileged(&self, script: &str) -> Result<(), HostError> {
        self.calls.lock().unwrap().push("exec".to_string());
        self.scripts.lock().unwrap().push(script.to_string());
        Ok(())
    }
}

fn content_body(bytes: &[u8]) -> serde_json::Value {
    json!({ "content": BASE64.encode(bytes) })
}

struct Harness {
    service: PackageService,
    host: Arc<RecordingHost>,
    data_dir: tempfile::TempDir,
}

fn harness(api_base: &str) -> Harness {
    let data_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default_config();
    config.core.data_dir = data_dir.path().to_path_buf();
    config.installer.api_base_url = api_base.to_string();

    let client = Arc::new(ContentClient::new(api_base));
    let verification = Arc::new(VerificationService::new(TrustRegistry::empty(), false));
    let host = Arc::new(RecordingHost::new());
    let service = PackageService::new(config, client, verification, host.clone());

    Harness {
        service,
        host,
        data_dir,
    }
}

/// Simulate an existing install: package dir with a file, persisted manifest
fn seed_installed_package(data_dir: &std::path::Path) {
    let package_dir = data_dir.join("packages/widgets");
    std::fs::create_dir_all(&package_dir).unwrap();
    std::fs::write(package_dir.join("commands.py"), b"print('hi')").unwrap();

    let manifests_dir = data_dir.join("manifests");
    std::fs::create_dir_all(&manifests_dir).unwrap();
    std::fs::write(manifests_dir.join("widgets.yml"), MANIFEST).unwrap();
}

#[tokio::test]
async fn test_uninstall_removes_files_manifest_and_module() {
    let server = MockServer::start().await;
    let h = harness(&server.uri());
    seed_installed_package(h.data_dir.path());

    h.service.uninstall("widgets").await.unwrap();

    assert!(!h.data_dir.path().join("packages/widgets").exists());
    assert!(!h.data_dir.path().join("manifests/widgets.yml").exists());
    assert_eq!(h.host.calls(), vec!["unload:ballsdex.packages.widgets"]);
}

#[tokio::test]
async fn test_uninstall_unknown_package_touches_nothing() {
    let server = MockServer::start().await;
    let h = harness(&server.uri());
    seed_installed_package(h.data_dir.path());

    let result = h.service.uninstall("gadgets").await;

    assert!(matches!(result, Err(PackError::NotFound(_))));
    // The other package's state is untouched
    assert!(h.data_dir.path().join("packages/widgets").exists());
    assert!(h.data_dir.path().join("manifests/widgets.yml").exists());
    assert!(h.host.calls().is_empty());
}

#[tokio::test]
async fn test_uninstall_tolerates_module_not_loaded() {
    let server = MockServer::start().await;
    let h = harness(&server.uri());
    seed_installed_package(h.data_dir.path());

    // The host never loaded the module; the unload is skipped, not an error
    h.service.uninstall("widgets").await.unwrap();
    assert!(!h.data_dir.path().join("packages/widgets").exists());
}

#[tokio::test]
async fn test_view_reads_persisted_manifest_offline() {
    let server = MockServer::start().await;

    // Any fetch would violate the offline guarantee
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    seed_installed_package(h.data_dir.path());

    let manifest = h.service.view("widgets").await.unwrap();

    assert_eq!(manifest.name, "widgets");
    assert_eq!(manifest.version, "1.0.0");
    server.verify().await;
}

#[tokio::test]
async fn test_view_unknown_package_is_not_found() {
    let server = MockServer::start().await;
    let h = harness(&server.uri());

    let result = h.service.view("gadgets").await;
    assert!(matches!(result, Err(PackError::NotFound(_))));
}

#[tokio::test]
async fn test_update_self_hands_script_to_privileged_exec() {
    let server = MockServer::start().await;

    let script = "print('updating packdock')\n";
    Mock::given(method("GET"))
        .and(path("/repos/packdock/packdock/contents/installer.py"))
        .respond_with(ResponseTemplate::new(200).set_body_json(content_body(script.as_bytes())))
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.service.update_self().await.unwrap();

    assert_eq!(h.host.calls(), vec!["exec"]);
    assert_eq!(h.host.scripts(), vec![script.to_string()]);
}

#[tokio::test]
async fn test_update_self_surfaces_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    let result = h.service.update_self().await;

    // Attributed to the installer itself, not a package author
    assert!(matches!(
        result,
        Err(PackError::SelfUpdateFailed { status: 404 })
    ));
    assert!(h.host.calls().is_empty());
}

#[tokio::test]
async fn test_reload_self_targets_configured_module() {
    let server = MockServer::start().await;
    let h = harness(&server.uri());

    h.service.reload_self().await.unwrap();

    assert_eq!(h.host.calls(), vec!["reload:ballsdex.core.packdock"]);
}

#[tokio::test]
async fn test_outdated_check_reports_newer_published_version() {
    let server = MockServer::start().await;

    let cargo_toml = "[package]\nname = \"packdock\"\nversion = \"99.0.0\"\n";
    Mock::given(method("GET"))
        .and(path("/repos/packdock/packdock/contents/Cargo.toml"))
        .respond_with(ResponseTemplate::new(200).set_body_json(content_body(cargo_toml.as_bytes())))
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    assert_eq!(h.service.check_outdated().await, Some("99.0.0".to_string()));
}

#[tokio::test]
async fn test_outdated_check_disabled_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let data_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default_config();
    config.core.data_dir = data_dir.path().to_path_buf();
    config.installer.api_base_url = server.uri();
    config.installer.outdated_warnings = false;

    let client = Arc::new(ContentClient::new(server.uri()));
    let verification = Arc::new(VerificationService::new(TrustRegistry::empty(), false));
    let service = PackageService::new(config, client, verification, Arc::new(RecordingHost::new()));

    assert_eq!(service.check_outdated().await, None);
    server.verify().await;
}
