//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! over a temp workspace, with a mock process runner standing in for the
//! stage scripts.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use docrunner_core::{
    create_authenticator, load_config_from_str, stages_from_config, testing::MockProcessRunner,
    Authenticator, Config, EventKind, PipelineOrchestrator, ProcessRunner, RunEvent,
    WorkspaceConfig,
};
use docrunner_server::state::AppState;

/// Re-export fixtures for test convenience
pub use docrunner_core::testing::fixtures;

/// Password used when the fixture runs with session auth.
pub const PASSWORD: &str = "let-me-in";

/// Test fixture for API testing with a mock process runner.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_config_creation() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/config", json!({
///         "targetUrl": "https://example.com",
///         "startDate": "2024-01-01",
///         "endDate": "2024-01-31"
///     })).await;
///
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    /// Mock runner - script stage outcomes and output
    pub runner: Arc<MockProcessRunner>,
    /// Workspace layout inside `temp_dir`
    pub workspace: WorkspaceConfig,
    /// Temporary workspace root
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Response from a run request, with the event stream read to its end.
#[derive(Debug)]
pub struct StreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub raw: String,
    pub events: Vec<RunEvent>,
}

impl StreamResponse {
    pub fn kinds(&self) -> Vec<EventKind> {
        fixtures::kinds(&self.events)
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Require a session logged in with [`PASSWORD`]
    pub session_auth: bool,
    /// Failed logins before lockout (session auth only)
    pub max_failed_attempts: Option<u32>,
}

impl TestConfig {
    pub fn with_session_auth() -> Self {
        Self {
            session_auth: true,
            max_failed_attempts: None,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture without authentication.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let workspace = fixtures::workspace(temp_dir.path());

        let auth = if test_config.session_auth {
            format!(
                "method = \"session\"\npassword = \"{}\"\nmax_failed_attempts = {}\nlockout_secs = 60",
                PASSWORD,
                test_config.max_failed_attempts.unwrap_or(5)
            )
        } else {
            "method = \"none\"".to_string()
        };
        let mut config: Config = load_config_from_str(&format!(
            "[auth]\n{}\n\n[server]\nhost = \"127.0.0.1\"\nport = 3000\n",
            auth
        ))
        .expect("Failed to parse test config");
        config.workspace = workspace.clone();
        config.server.static_dir = temp_dir.path().join("public");

        let authenticator: Arc<dyn Authenticator> = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );

        let runner = Arc::new(MockProcessRunner::new());
        let orchestrator = Arc::new(PipelineOrchestrator::new(
            Arc::clone(&runner) as Arc<dyn ProcessRunner>,
            stages_from_config(&config.stages),
            workspace.clone(),
        ));

        let state = Arc::new(AppState::new(config, authenticator, orchestrator));
        let router = docrunner_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            runner,
            workspace,
            temp_dir,
        }
    }

    /// Path inside the workspace.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, &[]).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), &[]).await
    }

    /// Send a request carrying extra headers (e.g. a session cookie).
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.request(method, path, body, headers).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Log in and return the `Cookie` header value for the new session.
    pub async fn login(&self) -> String {
        let response = self
            .post("/api/login", serde_json::json!({ "password": PASSWORD }))
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);
        let set_cookie = response
            .headers
            .get(header::SET_COOKIE)
            .expect("login sets a cookie")
            .to_str()
            .unwrap();
        set_cookie
            .split(';')
            .next()
            .expect("cookie pair")
            .to_string()
    }

    /// Start a run and read its event stream to the end.
    pub async fn run_tasks(&self, headers: &[(&str, &str)]) -> StreamResponse {
        let response = self.start_run(headers).await;
        Self::read_stream(response).await
    }

    /// Start a run and return the response without reading the body.
    pub async fn start_run(&self, headers: &[(&str, &str)]) -> axum::response::Response {
        let mut builder = Request::builder().method("POST").uri("/api/run-tasks");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .expect("Failed to send request")
    }

    /// Read an event stream response to its end and parse the `data:` records.
    pub async fn read_stream(response: axum::response::Response) -> StreamResponse {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        let raw = String::from_utf8(bytes.to_vec()).expect("utf-8 stream");

        let events = if status == StatusCode::OK {
            raw.split("\n\n")
                .filter(|record| !record.is_empty())
                .map(|record| {
                    let data = record
                        .strip_prefix("data: ")
                        .unwrap_or_else(|| panic!("not a data record: {:?}", record));
                    serde_json::from_str(data).expect("event json")
                })
                .collect()
        } else {
            Vec::new()
        };

        StreamResponse {
            status,
            headers,
            raw,
            events,
        }
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
