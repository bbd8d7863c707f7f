//! Loading from files on disk and the process environment.

use relay_config::{ConfigError, ConfigLoader};
use relay_core::{Credentials, Scheme, StaticCredentialsProvider};
use std::io::Write;
use std::sync::Arc;
use tempfile::{Builder, NamedTempFile};

fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file() {
    let file = config_file(
        ".toml",
        r#"
            [endpoint]
            host = "example.amazonaws.com"
            port = 443

            [signing]
            region = "eu-west-1"
            service = "ExampleSvc"
            target = "ExampleSvc_20240101.PutItem"

            [transport]
            request_timeout_ms = 5000
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert_eq!(config.endpoint.host, "example.amazonaws.com");
    assert_eq!(config.endpoint.port, Some(443));
    assert_eq!(config.signing.region, "eu-west-1");
    assert_eq!(config.transport.request_timeout_ms, Some(5000));
    assert_eq!(config.http.content_type, "application/json");
}

#[test]
fn test_json_file() {
    let file = config_file(
        ".json",
        r#"{"endpoint": {"host": "sqs.us-east-1.amazonaws.com"},
            "signing": {"service": "sqs"},
            "http": {"content_type": "application/x-www-form-urlencoded"},
            "xml": {"query_key_transform": "capitalize_first_character"}}"#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.signing.service, "sqs");
    assert_eq!(config.http.content_type, "application/x-www-form-urlencoded");
}

#[test]
fn test_unsupported_extension() {
    let file = config_file(".yaml", "endpoint: {}");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_optional_file_present() {
    let file = config_file(
        ".toml",
        "[endpoint]\nhost = \"localhost\"\n[signing]\nservice = \"ExampleSvc\"\n",
    );
    let config = ConfigLoader::new()
        .with_optional_file(file.path())
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.endpoint.host, "localhost");
}

#[test]
fn test_environment_overrides_file() {
    let file = config_file(
        ".toml",
        "[endpoint]\nhost = \"example.amazonaws.com\"\n[signing]\nservice = \"ExampleSvc\"\n",
    );
    std::env::set_var("RELAY_LAYERED_IT__ENDPOINT__HOST", "localhost");
    std::env::set_var("RELAY_LAYERED_IT__ENDPOINT__PORT", "8000");
    std::env::set_var("RELAY_LAYERED_IT__ENDPOINT__SCHEME", "http");

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .with_env_prefix("relay_layered_it")
        .load()
        .unwrap();

    assert_eq!(config.endpoint.host, "localhost");
    assert_eq!(config.endpoint.port, Some(8000));
    assert_eq!(config.endpoint.scheme, Scheme::Http);
    assert_eq!(config.signing.service, "ExampleSvc");
}

#[test]
fn test_environment_value_is_validated() {
    std::env::set_var("RELAY_INVALID_IT__ENDPOINT__HOST", "example.amazonaws.com");
    std::env::set_var("RELAY_INVALID_IT__SIGNING__SERVICE", "ExampleSvc");
    std::env::set_var("RELAY_INVALID_IT__ENDPOINT__PORT", "0");

    let err = ConfigLoader::new()
        .with_env_prefix("RELAY_INVALID_IT")
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "endpoint.port"));
}

#[test]
fn test_stack_config_from_file() {
    let file = config_file(
        ".toml",
        r#"
            [endpoint]
            host = "example.amazonaws.com"
            [signing]
            service = "ExampleSvc"
            operation = "PutItem"
        "#,
    );
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    let provider = Arc::new(StaticCredentialsProvider::new(Credentials::new("AKID", "secret")));

    let stack = config.stack_config(provider);
    assert_eq!(stack.operation.as_deref(), Some("PutItem"));
    assert_eq!(stack.port, None);
}
