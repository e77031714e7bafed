use std::net::SocketAddr;

use loyalty::{
    app::build_app,
    config::{AppConfig, RewardMode},
    seed,
    state::AppState,
};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

pub const ADMIN_EMAIL: &str = "admin@barbershop.com";
pub const ADMIN_PASSWORD: &str = "admin123";

/// A running server backed by the in-memory store, with demo accounts seeded.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post(&self, path: &str, body: Value, token: Option<&str>) -> (Value, StatusCode) {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.expect("request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (Value, StatusCode) {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.expect("request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn patch(&self, path: &str, body: Value, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn register(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/api/register",
            json!({ "email": email, "password": password }),
            None,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/api/login",
            json!({ "email": email, "password": password }),
            None,
        )
        .await
    }

    /// Registers and logs in, returning `(session token, qr token)`.
    pub async fn client(&self, email: &str) -> (String, String) {
        let (body, status) = self.register(email, "secret123").await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let (body, status) = self.login(email, "secret123").await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["qrToken"].as_str().unwrap().to_string(),
        )
    }

    pub async fn admin_token(&self) -> String {
        let (body, status) = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn scan(&self, qr_token: &str) -> (Value, StatusCode) {
        self.post("/api/scan", json!({ "qrToken": qr_token }), None)
            .await
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_with(RewardMode::Stateless).await
}

pub async fn spawn_with(mode: RewardMode) -> TestApp {
    let mut config = AppConfig::with_secret("test-jwt-secret");
    config.seed.enabled = true;
    config.reward.mode = mode;

    let state = AppState::in_memory(config);
    seed::bootstrap(&state).await.expect("seeding failed");
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
    }
}
