//! Integration tests for layered configuration building.
//!
//! Exercises the public builder API end to end:
//! - file, environment and user-secrets sources in caller-chosen order
//! - flattened key expansion and value coercion
//! - secrets identifier discovery from the working tree

use configuration_builder::config::{
    BuilderOptions, ConfigurationBuilder, KeyCase, SecretsProvider, find_user_secrets_id,
};
use configuration_builder::{ConfigError, Result};
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

/// Secrets store returning a canned listing.
struct StaticSecrets(&'static str);

impl SecretsProvider for StaticSecrets {
    fn list(&self, _id: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Secrets store that must never be called.
struct UnreachableSecrets;

impl SecretsProvider for UnreachableSecrets {
    fn list(&self, id: &str) -> Result<String> {
        panic!("secrets store queried for {id}");
    }
}

fn write_settings(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write settings");
    path
}

#[test]
fn file_environment_and_secrets_layer_in_order() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(
        &temp,
        "appsettings.json",
        r#"{
            "Logging": {"LogLevel": {"Default": "Information", "Microsoft": "Warning"}},
            "ConnectionStrings": {"Main": "Server=local"},
            "Features": ["a", "b"]
        }"#,
    );
    let secrets = StaticSecrets(
        "//BEGIN\n{\n  \"ConnectionStrings:Main\": \"Server=prod;Password=pw\"\n}\n//END\n",
    );

    let mut builder = ConfigurationBuilder::new();
    builder
        .add_json_file(&settings, true)
        .unwrap()
        .add_environment_from([("Logging__LogLevel__Default", "Debug"), ("Workers", "8")])
        .unwrap()
        .add_user_secrets_with(&secrets, Some("app-secrets"))
        .unwrap();

    assert_eq!(
        builder.build(),
        Some(&json!({
            "Logging": {"LogLevel": {"Default": "Debug", "Microsoft": "Warning"}},
            "ConnectionStrings": {"Main": "Server=prod;Password=pw"},
            "Features": ["a", "b"],
            "Workers": "8"
        }))
    );
}

#[test]
fn environment_level_overrides_file_with_lowercase_keys() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(&temp, "appsettings.json", r#"{"level": "info"}"#);

    let mut builder = ConfigurationBuilder::with_options(BuilderOptions {
        key_case: KeyCase::Lower,
        ..Default::default()
    });
    builder
        .add_json_file(&settings, true)
        .unwrap()
        .add_environment_from([("LEVEL", "debug")])
        .unwrap();

    assert_eq!(builder.build(), Some(&json!({"level": "debug"})));
}

#[test]
fn flattened_keys_in_structured_file_are_expanded_but_not_coerced() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(
        &temp,
        "appsettings.yaml",
        "server:\n  host: localhost\n\"server:port\": \"8080\"\n\"server:tls\": true\n",
    );

    let mut builder = ConfigurationBuilder::new();
    builder.add_yaml_file(&settings, false).unwrap();

    assert_eq!(
        builder.build(),
        Some(&json!({"server": {"host": "localhost", "port": "8080", "tls": true}}))
    );
}

#[test]
fn coerced_values_keep_their_types() {
    let mut builder = ConfigurationBuilder::new();
    builder
        .add_environment_from([
            ("app:retries", "3"),
            ("app:ratio", "0.75"),
            ("app:version", "1.2.3"),
            ("app:name", "demo"),
        ])
        .unwrap();

    let tree = builder.build().unwrap();
    assert!(tree["app"]["retries"].is_u64());
    assert!(tree["app"]["ratio"].is_f64());
    assert_eq!(tree["app"]["version"], Value::String("1.2.3".to_string()));
    assert_eq!(tree["app"]["name"], Value::String("demo".to_string()));
}

#[test]
fn scalar_from_earlier_source_is_replaced_by_tree() {
    let mut builder = ConfigurationBuilder::new();
    builder
        .add_environment_from([("cache", "off")])
        .unwrap()
        .add_environment_from([("cache:size", "64")])
        .unwrap();
    assert_eq!(builder.build(), Some(&json!({"cache": {"size": 64}})));

    builder.add_environment_from([("cache", "on")]).unwrap();
    assert_eq!(builder.build(), Some(&json!({"cache": "on"})));
}

#[test]
fn malformed_json_file_is_hard_error() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(&temp, "appsettings.json", "{\"level\": ");

    let mut builder = ConfigurationBuilder::new();
    let err = builder.add_json_file(&settings, true).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidDocument { .. }));
    assert!(builder.build().is_none());
}

#[test]
fn unresolved_secrets_identifier_is_a_no_op() {
    // A repository root without an identifier file stops discovery at once.
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".git")).unwrap();

    let mut builder = ConfigurationBuilder::new();
    builder
        .add_user_secrets_from(&UnreachableSecrets, temp.path())
        .unwrap();
    assert!(builder.build().is_none());

    builder
        .add_map("base", json!({"keep": true}).as_object().cloned().unwrap())
        .unwrap()
        .add_user_secrets_from(&UnreachableSecrets, temp.path())
        .unwrap();
    assert_eq!(builder.build(), Some(&json!({"keep": true})));
}

#[test]
fn empty_secrets_identifier_is_a_no_op() {
    let mut builder = ConfigurationBuilder::new();
    builder
        .add_user_secrets_with(&UnreachableSecrets, Some(""))
        .unwrap();
    assert!(builder.build().is_none());
}

#[test]
fn secrets_identifier_is_discovered_from_ancestor() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".usersecrets"), "6f1c-user-secrets\n").unwrap();
    let project = temp.path().join("src").join("app");
    fs::create_dir_all(&project).unwrap();

    assert_eq!(
        find_user_secrets_id(&project).unwrap().as_deref(),
        Some("6f1c-user-secrets")
    );
}

#[test]
fn secrets_subprocess_failure_is_distinct_from_bad_output() {
    struct Failing;
    impl SecretsProvider for Failing {
        fn list(&self, _id: &str) -> Result<String> {
            Err(ConfigError::SubprocessTimeout {
                program: "dotnet".to_string(),
                timeout: std::time::Duration::from_secs(1),
            })
        }
    }

    let mut builder = ConfigurationBuilder::new();
    let err = builder.add_user_secrets_with(&Failing, Some("id")).unwrap_err();
    assert_eq!(err.kind(), "subprocess_timeout");

    let err = builder
        .add_user_secrets_with(&StaticSecrets("garbage"), Some("id"))
        .unwrap_err();
    assert_eq!(err.kind(), "malformed_output");
}
