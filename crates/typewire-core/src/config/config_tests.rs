#![allow(non_snake_case)]

use super::*;

#[test]
fn GeneratorConfig___default___has_expected_values() {
    let config = GeneratorConfig::default();

    assert_eq!(config.base_path, "");
    assert_eq!(config.int64, Int64Mode::Number);
    assert!(config.unified);
    assert_eq!(config.http_file, "http.ts");
    assert_eq!(config.socket_file, "socket.ts");
    assert_eq!(config.shared_file, "shared.ts");
    assert!(config.formatter.is_none());
    assert_eq!(config.formatter_timeout_ms, 30_000);
}

#[test]
fn GeneratorConfig___from_json___empty_bytes___returns_default() {
    let config = GeneratorConfig::from_json(b"").unwrap();

    assert_eq!(config, GeneratorConfig::default());
}

#[test]
fn GeneratorConfig___from_json___parses_int64_mode() {
    let json = r#"{"int64": "string", "base_path": "/api"}"#;

    let config = GeneratorConfig::from_json(json.as_bytes()).unwrap();

    assert_eq!(config.int64, Int64Mode::String);
    assert_eq!(config.base_path, "/api");
    assert!(config.unified);
}

#[test]
fn GeneratorConfig___from_json___rejects_unknown_int64_mode() {
    let json = r#"{"int64": "bigint"}"#;

    let result = GeneratorConfig::from_json(json.as_bytes());

    assert!(result.is_err());
}

#[test]
fn GeneratorConfig___validate___default_is_valid() {
    assert!(GeneratorConfig::default().validate().is_ok());
}

#[test]
fn GeneratorConfig___validate___rejects_duplicate_files() {
    let mut config = GeneratorConfig::default();
    config.socket_file = "http.ts".into();

    let err = config.validate().unwrap_err();

    assert!(err.to_string().contains("http_file and socket_file"));
}

#[test]
fn GeneratorConfig___validate___rejects_empty_file() {
    let mut config = GeneratorConfig::default();
    config.shared_file = " ".into();

    let err = config.validate().unwrap_err();

    assert!(matches!(err, GenError::Config(_)));
}

#[test]
fn GeneratorConfig___validate___rejects_empty_formatter() {
    let mut config = GeneratorConfig::default();
    config.formatter = Some(vec![]);

    assert!(config.validate().is_err());
}

#[test]
fn GeneratorConfig___validate___rejects_zero_formatter_timeout() {
    let config = GeneratorConfig {
        formatter_timeout_ms: 0,
        ..GeneratorConfig::default()
    };

    assert!(matches!(config.validate(), Err(GenError::Config(_))));
}

#[test]
fn GeneratorConfig___builders___set_fields() {
    let config = GeneratorConfig::new()
        .with_base_path("/v1")
        .with_int64(Int64Mode::String)
        .with_unified(false);

    assert_eq!(config.base_path, "/v1");
    assert_eq!(config.int64, Int64Mode::String);
    assert!(!config.unified);
}
