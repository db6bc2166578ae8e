//! Shared constants for end-to-end tests

// Seeded test users (created by TestServer::spawn)
pub const WORKER_EMAIL: &str = "worker@example.com";
pub const WORKER_PASS: &str = "worker-password";
pub const WORKER_NAME: &str = "Wayan Worker";

pub const BUSINESS_EMAIL: &str = "business@example.com";
pub const BUSINESS_PASS: &str = "business-password";
pub const BUSINESS_NAME: &str = "Bu Sari";

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASS: &str = "admin-password";
pub const ADMIN_NAME: &str = "Admin";

// Server readiness polling
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

pub const REQUEST_TIMEOUT_SECS: u64 = 10;
