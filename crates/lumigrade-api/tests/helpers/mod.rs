//! Test helpers: build the router and a test server for integration tests.
//!
//! Run from workspace root: `cargo test -p lumigrade-api`.

pub mod fixtures;

use std::path::Path;
use std::sync::Arc;

use axum_test::TestServer;
use lumigrade_api::setup::routes;
use lumigrade_api::AppState;
use lumigrade_core::Config;
use tempfile::TempDir;

/// Test application: server plus the directory uploads are spooled to.
pub struct TestApp {
    pub server: TestServer,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Files currently left in the upload directory
    pub fn leftover_uploads(&self) -> usize {
        count_files(self.upload_dir.path())
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {})
}

/// Same as [`setup_test_app`] with a hook to adjust the configuration.
pub fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");

    let mut config = Config {
        upload_dir: Some(upload_dir.path().to_path_buf()),
        ..Config::default()
    };
    customize(&mut config);

    let state = Arc::new(AppState::new(config.clone()));
    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp { server, upload_dir }
}
