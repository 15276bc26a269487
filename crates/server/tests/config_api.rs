//! Run configuration and `.env` endpoints.

#[macro_use]
mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::TestFixture;
use docrunner_core::run_config::DEFAULT_REQUIRE;

fn new_config() -> Value {
    json!({
        "targetUrl": "  https://example.com/reports ",
        "startDate": "2024-03-01",
        "endDate": "2024-03-31"
    })
}

fn read_json(fixture: &TestFixture, relative: &str) -> Value {
    let raw = std::fs::read_to_string(fixture.path(relative)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

// =============================================================================
// Run configuration
// =============================================================================

#[tokio::test]
async fn test_create_config_writes_artifact() {
    let fixture = TestFixture::new();

    let response = fixture.post("/api/config", new_config()).await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "success", json!(true));
    assert!(response.body["file"]
        .as_str()
        .unwrap()
        .ends_with("config.json"));

    let on_disk = read_json(&fixture, "config.json");
    assert_eq!(on_disk["target_url"], "https://example.com/reports");
    assert_eq!(on_disk["startDate"], "2024-03-01");
    assert_eq!(on_disk["endDate"], "2024-03-31");
    assert_eq!(on_disk["require"], DEFAULT_REQUIRE);
    assert_eq!(on_disk["titles"], json!([]));
}

#[tokio::test]
async fn test_create_config_replaces_previous() {
    let fixture = TestFixture::new();
    std::fs::write(
        fixture.path("config.json"),
        r#"{"target_url":"old","startDate":"x","endDate":"y","titles":["stale"],"companyName":"old"}"#,
    )
    .unwrap();

    let mut body = new_config();
    body["require"] = json!("List every table.");
    let response = fixture.post("/api/config", body).await;

    assert_status!(response, StatusCode::OK);
    let on_disk = read_json(&fixture, "config.json");
    assert_eq!(on_disk["require"], "List every table.");
    assert_eq!(on_disk["titles"], json!([]));
    assert!(on_disk.get("companyName").is_none());
}

#[tokio::test]
async fn test_create_config_missing_fields() {
    let fixture = TestFixture::new();

    for missing in ["targetUrl", "startDate", "endDate"] {
        let mut body = new_config();
        body.as_object_mut().unwrap().remove(missing);

        let response = fixture.post("/api/config", body).await;

        assert_status!(response, StatusCode::BAD_REQUEST);
        assert!(response.body["error"].as_str().unwrap().contains(missing));
    }
    assert!(!fixture.path("config.json").exists());
}

#[tokio::test]
async fn test_create_config_blank_field_rejected() {
    let fixture = TestFixture::new();
    let mut body = new_config();
    body["startDate"] = json!("   ");

    let response = fixture.post("/api/config", body).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_config_malformed_json() {
    let fixture = TestFixture::new();

    let response = fixture.post_raw("/api/config", "{not json").await;

    assert!(response.status.is_client_error(), "{:?}", response.status);
    assert!(!fixture.path("config.json").exists());
}

#[tokio::test]
async fn test_config_content_not_found() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/config-content").await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert_json_path!(response.body, "error", json!("Configuration file not found"));
}

#[tokio::test]
async fn test_config_content_includes_stage_fields() {
    let fixture = TestFixture::new();
    fixture.post("/api/config", new_config()).await;

    // The preprocessing stage adds titles and its own keys.
    let mut on_disk = read_json(&fixture, "config.json");
    on_disk["titles"] = json!(["Q1 report"]);
    on_disk["pageCount"] = json!(3);
    std::fs::write(fixture.path("config.json"), on_disk.to_string()).unwrap();

    let response = fixture.get("/api/config-content").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "titles", json!(["Q1 report"]));
    assert_json_path!(response.body, "pageCount", json!(3));
    assert_json_path!(response.body, "target_url", json!("https://example.com/reports"));
}

#[tokio::test]
async fn test_update_config_changes_only_require() {
    let fixture = TestFixture::new();
    fixture.post("/api/config", new_config()).await;
    let before = read_json(&fixture, "config.json");

    let response = fixture
        .post("/api/update-config", json!({ "require": "Extract revenue figures." }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "success", json!(true));
    let after = read_json(&fixture, "config.json");
    assert_eq!(after["require"], "Extract revenue figures.");
    assert_eq!(after["target_url"], before["target_url"]);
    assert_eq!(after["startDate"], before["startDate"]);
    assert_eq!(after["endDate"], before["endDate"]);
}

#[tokio::test]
async fn test_update_config_not_found() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/update-config", json!({ "require": "anything" }))
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_config_requires_instruction() {
    let fixture = TestFixture::new();
    fixture.post("/api/config", new_config()).await;

    let response = fixture.post("/api/update-config", json!({})).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(read_json(&fixture, "config.json")["require"], DEFAULT_REQUIRE);
}

#[tokio::test]
async fn test_list_saved_configs() {
    let fixture = TestFixture::new();
    fixture.post("/api/config", new_config()).await;
    std::fs::write(
        fixture.path("config_2024q1.json"),
        r#"{"target_url":"https://example.com/q1","require":"Summarize."}"#,
    )
    .unwrap();

    let response = fixture.get("/api/configs").await;

    assert_status!(response, StatusCode::OK);
    let saved = response.body.as_array().unwrap();
    assert_eq!(saved.len(), 1);
    assert_json_path!(saved[0], "filename", json!("config_2024q1.json"));
    assert_json_path!(saved[0], "target_url", json!("https://example.com/q1"));
}

#[tokio::test]
async fn test_list_saved_configs_empty() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/configs").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body, json!([]));
}

// =============================================================================
// .env
// =============================================================================

#[tokio::test]
async fn test_update_env_replaces_provider() {
    let fixture = TestFixture::new();
    std::fs::write(
        fixture.path(".env"),
        "API_KEY=abc\nLLM_PROVIDER=openai\nMODEL=large\n",
    )
    .unwrap();

    let response = fixture
        .post("/api/update-env", json!({ "llmProvider": "deepseek" }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        std::fs::read_to_string(fixture.path(".env")).unwrap(),
        "API_KEY=abc\nLLM_PROVIDER=deepseek\nMODEL=large\n"
    );
}

#[tokio::test]
async fn test_update_env_appends_provider() {
    let fixture = TestFixture::new();
    std::fs::write(fixture.path(".env"), "API_KEY=abc").unwrap();

    let response = fixture
        .post("/api/update-env", json!({ "llmProvider": "qwen" }))
        .await;

    assert_status!(response, StatusCode::OK);
    let content = std::fs::read_to_string(fixture.path(".env")).unwrap();
    assert!(content.starts_with("API_KEY=abc\n"));
    assert!(content.contains("LLM_PROVIDER=qwen"));
}

#[tokio::test]
async fn test_update_env_file_missing() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/update-env", json!({ "llmProvider": "qwen" }))
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(!fixture.path(".env").exists());
}

#[tokio::test]
async fn test_update_env_rejects_bad_values() {
    let fixture = TestFixture::new();
    std::fs::write(fixture.path(".env"), "LLM_PROVIDER=openai\n").unwrap();

    let missing = fixture.post("/api/update-env", json!({})).await;
    assert_status!(missing, StatusCode::BAD_REQUEST);

    let multiline = fixture
        .post("/api/update-env", json!({ "llmProvider": "a\nEVIL=1" }))
        .await;
    assert_status!(multiline, StatusCode::BAD_REQUEST);

    assert_eq!(
        std::fs::read_to_string(fixture.path(".env")).unwrap(),
        "LLM_PROVIDER=openai\n"
    );
}
