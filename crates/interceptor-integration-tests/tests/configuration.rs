//! Integration tests for configuration loading and server startup

mod common;

use axum::http::StatusCode;
use common::{create_test_app_with, push_payload, send, Delivery};
use interceptor_api::{load_config, start_server, ServiceConfig, ServiceError};
use interceptor_core::EventRouter;
use serial_test::serial;
use std::io::Write;

fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Verify that a configured endpoint path is the one served
#[tokio::test]
#[serial]
async fn test_endpoint_path_from_config_file() {
    std::env::remove_var("INTERCEPTOR__INTERCEPTION__ENDPOINT_PATH");
    let file = yaml_file("interception:\n  endpoint_path: /intercept\n");
    let config = load_config(file.path().to_str()).unwrap();
    config.validate().unwrap();

    let delivery = || {
        Delivery::new("push")
            .header("Push-Repo", "org/repo")
            .json(&push_payload("refs/heads/main", "org/repo"))
    };

    let (response, _) = send(
        create_test_app_with(config.clone()),
        delivery().uri("/intercept").build(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (response, _) = send(create_test_app_with(config), delivery().build()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Verify that the legacy commit selection can be switched on from the environment
#[tokio::test]
#[serial]
async fn test_commit_fallback_from_environment() {
    std::env::set_var("INTERCEPTOR__INTERCEPTION__PUSH_COMMIT_FALLBACK", "second_to_last");
    let loaded = load_config(None);
    std::env::remove_var("INTERCEPTOR__INTERCEPTION__PUSH_COMMIT_FALLBACK");
    let config = loaded.unwrap();

    let mut payload = push_payload("refs/heads/main", "org/repo");
    payload.as_object_mut().unwrap().remove("head_commit");
    let request = Delivery::new("push")
        .header("Push-Repo", "org/repo")
        .json(&payload)
        .build();

    let (response, body) = send(create_test_app_with(config), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["intercepted"]["short_sha"], "111111");
}

/// Verify that an invalid configuration is refused before binding
#[tokio::test]
async fn test_start_server_rejects_invalid_config() {
    let mut config = ServiceConfig::default();
    config.interception.endpoint_path = "no-leading-slash".to_string();

    let result = start_server(config, EventRouter::github(&Default::default())).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ServiceError::Configuration(_)), "{err:?}");
    assert_eq!(err.exit_code(), 3);
}

/// Verify that an occupied port is reported as a bind failure
#[tokio::test]
async fn test_start_server_reports_bind_failure() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = ServiceConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = occupied.local_addr().unwrap().port();

    let result = start_server(config, EventRouter::github(&Default::default())).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ServiceError::BindFailed { .. }), "{err:?}");
    assert_eq!(err.exit_code(), 1);
}
