//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own databases.

use super::constants::*;
use shiftkerja_server::geo_index::{GeoIndex, HaversineGeoIndex};
use shiftkerja_server::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use shiftkerja_server::shift_store::{ShiftStore, SqliteShiftStore};
use shiftkerja_server::user::{NewUser, SqliteUserStore, TokenService, UserRole, UserStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Shift store for direct database access in tests
    pub shift_store: Arc<dyn ShiftStore>,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Creates temporary shift and user databases
    /// 2. Seeds a worker, a business and an admin user
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if any of the above fails or the server does not become
    /// ready within the timeout.
    pub async fn spawn() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let shift_store: Arc<dyn ShiftStore> = Arc::new(
            SqliteShiftStore::new(temp_dir.path().join("shifts.db"))
                .expect("Failed to open shift store"),
        );
        let shift_store_for_test = shift_store.clone();

        let user_store = Arc::new(
            SqliteUserStore::new(temp_dir.path().join("users.db"))
                .expect("Failed to open user store"),
        );
        seed_users(user_store.as_ref());

        let geo_index: Arc<dyn GeoIndex> = Arc::new(HaversineGeoIndex::new());

        let token_service = Arc::new(TokenService::new("e2e-test-secret"));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
        };

        let app = make_app(config, shift_store, user_store, geo_index, token_service)
            .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            shift_store: shift_store_for_test,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

fn seed_users(user_store: &SqliteUserStore) {
    let users = [
        (WORKER_EMAIL, WORKER_PASS, WORKER_NAME, UserRole::Worker),
        (
            BUSINESS_EMAIL,
            BUSINESS_PASS,
            BUSINESS_NAME,
            UserRole::Business,
        ),
        (ADMIN_EMAIL, ADMIN_PASS, ADMIN_NAME, UserRole::Admin),
    ];
    for (email, password, full_name, role) in users {
        user_store
            .create_user(
                NewUser {
                    email: email.to_string(),
                    full_name: full_name.to_string(),
                    role,
                },
                password,
            )
            .expect("Failed to seed user")
            .expect("Seed user email already taken");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir is cleaned up automatically
    }
}
