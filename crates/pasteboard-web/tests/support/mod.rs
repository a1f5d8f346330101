//! Shared bootstrap for the HTTP integration tests.
#![allow(dead_code)]

use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use pasteboard_web::{AppState, AppStateInner, Config, Database, create_app};
use tempfile::TempDir;

pub const PASSWORD: &str = "correct horse";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    /// Another browser against the same database, with its own cookies.
    pub fn second_client(&self) -> TestServer {
        cookie_server(&self.state)
    }
}

fn test_config(dir: &TempDir) -> Config {
    let db_path = dir.path().join("test.db");
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: db_path.display().to_string(),
        secret_key: [7; 32],
        public_url: None,
    }
}

fn cookie_server(state: &AppState) -> TestServer {
    TestServer::builder()
        .save_cookies()
        .build(create_app(state.clone()))
        .expect("server")
}

pub fn setup() -> TestApp {
    setup_with(|_| {})
}

pub fn setup_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let dir = TempDir::new().expect("temp dir");
    let mut config = test_config(&dir);
    adjust(&mut config);
    let db = Database::open(config.db_path()).expect("open db");
    let state = AppStateInner::new(db, config);
    TestApp {
        server: cookie_server(&state),
        state,
        _dir: dir,
    }
}

pub fn location(response: &TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("ascii location")
        .to_string()
}

pub fn assert_redirect(response: &TestResponse, to: &str) {
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), to);
}

pub async fn signup(server: &TestServer, name: &str, email: &str) -> TestResponse {
    server
        .post("/signup")
        .form(&[
            ("name", name),
            ("email", email),
            ("password", PASSWORD),
            ("confirm", PASSWORD),
        ])
        .await
}

pub async fn logout(server: &TestServer) {
    let response = server.get("/logout").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
}

/// Submit a paste and return its external id.
pub async fn create_paste(server: &TestServer, fields: &[(&str, &str)]) -> String {
    let response = server.post("/").form(&fields).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER, "{}", response.text());
    location(&response).trim_start_matches('/').to_string()
}
