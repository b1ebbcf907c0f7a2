//! Tests for configuration loading and startup validation.

use std::io::Write;

use model_route::config::{load_config, ConfigError, DEFAULT_TARGET_MODEL};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_full_config_from_file() {
    let file = write_config(
        r#"
[proxy]
bind_addr = "127.0.0.1:9000"
upstream_base_url = "https://example.test"
timeout_seconds = 45

[route]
models = ["m1", "m2"]
"#,
    );
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.proxy.bind_addr, "127.0.0.1:9000");
    assert_eq!(config.proxy.upstream_base_url, "https://example.test");
    assert_eq!(config.proxy.timeout_seconds, 45);
    assert_eq!(config.route.target_models(), vec!["m1", "m2"]);
}

#[test]
fn absent_model_list_uses_builtin_default() {
    let file = write_config("[proxy]\nbind_addr = \"127.0.0.1:9001\"\n");
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.route.target_models(), vec![DEFAULT_TARGET_MODEL]);
}

#[test]
fn explicit_empty_model_list_fails_at_startup() {
    let file = write_config("[route]\nmodels = []\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyModelList));
}

#[test]
fn unknown_key_fails_at_startup() {
    let file = write_config("[proxy]\nlisten_addr = \"127.0.0.1:9000\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn missing_file_reports_io_error() {
    let err = load_config(std::path::Path::new("/nonexistent/model-route.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
