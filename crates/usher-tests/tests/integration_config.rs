// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! Loading files in each supported format and booting the app from them.

use std::io::Write;

use axum::http::StatusCode;
use usher_config::{ConfigFormat, ConfigLoader, LogFormat, LogLevel, load_config_str};
use usher_tests::prelude::*;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_config_yaml_file_boots_the_app() {
    init_test_logging();
    let file = write_temp(".yaml", &ConfigFixtures::standard_yaml());

    let config = ConfigLoader::new().with_env_vars(false).load(file.path()).unwrap();
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(config.permissions.is_admin_email("Admin@Example.com"));

    let app = TestApp::new(config).unwrap();
    let (mut client, _) = app.signed_up(ADMIN_EMAIL, "Root").await.unwrap();
    let response = client.get("/permissions").await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
}

#[test]
fn test_config_toml_and_json_agree() {
    let toml = format!(
        r#"
[auth]
cookie_secret = "{cookie}"

[auth.access]
secret = "{a}"
duration_secs = 60
cookie_name = "at"

[auth.refresh]
secret = "{r}"
duration_secs = 3600
cookie_name = "rt"

[auth.confirmation]
secret = "{p}"
duration_secs = 30
cookie_name = "ct"
"#,
        cookie = "c".repeat(64),
        a = "a".repeat(32),
        r = "r".repeat(32),
        p = "p".repeat(32),
    );
    let json = serde_json::json!({
        "auth": {
            "cookie_secret": "c".repeat(64),
            "access": {"secret": "a".repeat(32), "duration_secs": 60, "cookie_name": "at"},
            "refresh": {"secret": "r".repeat(32), "duration_secs": 3600, "cookie_name": "rt"},
            "confirmation": {"secret": "p".repeat(32), "duration_secs": 30, "cookie_name": "ct"}
        }
    })
    .to_string();

    let from_toml = load_config_str(&toml, ConfigFormat::Toml).unwrap();
    let from_json = load_config_str(&json, ConfigFormat::Json).unwrap();

    assert_eq!(from_toml.auth.access.cookie_name, "at");
    assert_eq!(
        serde_json::to_value(&from_toml).unwrap(),
        serde_json::to_value(&from_json).unwrap()
    );
}

#[test]
fn test_config_duplicate_cookie_names_rejected() {
    let yaml = ConfigFixtures::standard_yaml().replace("cookie_name: refresh_token", "cookie_name: access_token");
    let err = ConfigLoader::new()
        .with_env_vars(false)
        .load_from_str(&yaml, ConfigFormat::Yaml)
        .unwrap_err();
    assert_eq!(err.field(), Some("auth.refresh.cookie_name"));
}

#[test]
fn test_config_missing_secret_rejected() {
    let yaml = ConfigFixtures::standard_yaml().replace(&"p".repeat(32), "short");
    let err = ConfigLoader::new()
        .with_env_vars(false)
        .load_from_str(&yaml, ConfigFormat::Yaml)
        .unwrap_err();
    assert_eq!(err.field(), Some("auth.confirmation.secret"));
}

#[test]
fn test_config_unknown_extension_rejected() {
    let file = write_temp(".ini", "port = 1");
    assert!(ConfigLoader::new().load(file.path()).is_err());
}
