//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all shiftkerja-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows.
    /// For most tests, use one of the `authenticated_*` constructors instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the seeded worker user
    pub async fn authenticated_worker(base_url: String) -> Self {
        Self::authenticated(base_url, WORKER_EMAIL, WORKER_PASS).await
    }

    /// Creates a client pre-authenticated as the seeded business user
    pub async fn authenticated_business(base_url: String) -> Self {
        Self::authenticated(base_url, BUSINESS_EMAIL, BUSINESS_PASS).await
    }

    /// Creates a client pre-authenticated as the seeded admin user
    pub async fn authenticated_admin(base_url: String) -> Self {
        Self::authenticated(base_url, ADMIN_EMAIL, ADMIN_PASS).await
    }

    /// Creates a client pre-authenticated with the given credentials
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String, email: &str, password: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(email, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/register
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: &str,
    ) -> Response {
        self.client
            .post(format!("{}/v1/auth/register", self.base_url))
            .json(&json!({
                "email": email,
                "password": password,
                "full_name": full_name,
                "role": role,
            }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// POST /v1/auth/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    // ========================================================================
    // Shift Endpoints
    // ========================================================================

    /// POST /v1/shifts
    pub async fn create_shift(
        &self,
        title: &str,
        pay_rate: f64,
        lat: f64,
        lng: f64,
    ) -> Response {
        self.create_shift_with_body(json!({
            "title": title,
            "pay_rate": pay_rate,
            "lat": lat,
            "lng": lng,
        }))
        .await
    }

    /// POST /v1/shifts with a custom body
    pub async fn create_shift_with_body(&self, body: serde_json::Value) -> Response {
        self.client
            .post(format!("{}/v1/shifts", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Create shift request failed")
    }

    /// PUT /v1/shifts/{id}
    pub async fn update_shift(&self, id: i64, body: serde_json::Value) -> Response {
        self.client
            .put(format!("{}/v1/shifts/{}", self.base_url, id))
            .json(&body)
            .send()
            .await
            .expect("Update shift request failed")
    }

    /// DELETE /v1/shifts/{id}
    pub async fn delete_shift(&self, id: i64) -> Response {
        self.client
            .delete(format!("{}/v1/shifts/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete shift request failed")
    }

    /// GET /v1/shifts/nearby
    pub async fn nearby_shifts(&self, lat: f64, lng: f64, rad: Option<f64>) -> Response {
        let mut url = format!(
            "{}/v1/shifts/nearby?lat={}&lng={}",
            self.base_url, lat, lng
        );
        if let Some(rad) = rad {
            url.push_str(&format!("&rad={}", rad));
        }
        self.client
            .get(url)
            .send()
            .await
            .expect("Nearby shifts request failed")
    }

    /// GET /v1/shifts/mine
    pub async fn my_shifts(&self) -> Response {
        self.client
            .get(format!("{}/v1/shifts/mine", self.base_url))
            .send()
            .await
            .expect("My shifts request failed")
    }

    /// GET /v1/shifts/{id}/applications
    pub async fn shift_applications(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/shifts/{}/applications", self.base_url, id))
            .send()
            .await
            .expect("Shift applications request failed")
    }

    // ========================================================================
    // Application Endpoints
    // ========================================================================

    /// POST /v1/applications
    pub async fn apply(&self, shift_id: i64) -> Response {
        self.client
            .post(format!("{}/v1/applications", self.base_url))
            .json(&json!({ "shift_id": shift_id }))
            .send()
            .await
            .expect("Apply request failed")
    }

    /// GET /v1/applications/mine
    pub async fn my_applications(&self) -> Response {
        self.client
            .get(format!("{}/v1/applications/mine", self.base_url))
            .send()
            .await
            .expect("My applications request failed")
    }

    /// PUT /v1/applications/{id}/status
    pub async fn decide_application(&self, id: i64, status: &str) -> Response {
        self.client
            .put(format!("{}/v1/applications/{}/status", self.base_url, id))
            .json(&json!({ "status": status }))
            .send()
            .await
            .expect("Decide application request failed")
    }

    /// DELETE /v1/applications/{id}
    pub async fn withdraw_application(&self, id: i64) -> Response {
        self.client
            .delete(format!("{}/v1/applications/{}", self.base_url, id))
            .send()
            .await
            .expect("Withdraw application request failed")
    }
}
