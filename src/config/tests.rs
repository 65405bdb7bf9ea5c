//! Tests for the config module

use super::loader::{apply_overrides, parse_with_warnings, ConfigWarning, FileFormat};
use super::types::*;
use crate::error::ProvisionError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn parse(content: &str) -> (Config, Vec<ConfigWarning>) {
    parse_with_warnings(content, FileFormat::Toml, Path::new("drawstack.toml")).unwrap()
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.retry.base_delay_ms, 500);
    assert_eq!(config.retry.max_delay_ms, 8000);
    assert_eq!(config.engine.parallelism, 1);
    assert!(config.engine.detect_unmanaged);
    assert_eq!(config.state.path, PathBuf::from(".drawstack/state.toml"));
    assert_eq!(config.backend.path, PathBuf::from(".drawstack/cloud.json"));
}

#[test]
fn test_config_parse_toml() {
    let (config, warnings) = parse(
        r#"
[scope]
subscription_id = "sub-1"
resource_group = "rg-draw"

[retry]
max_attempts = 6

[engine]
parallelism = 3

[state]
path = "deploy/state.toml"
"#,
    );

    assert!(warnings.is_empty());
    assert_eq!(config.scope.subscription_id.as_deref(), Some("sub-1"));
    assert_eq!(config.retry.max_attempts, 6);
    assert_eq!(config.retry.base_delay_ms, 500);
    assert_eq!(config.engine.parallelism, 3);
    assert_eq!(config.state.path, PathBuf::from("deploy/state.toml"));
}

#[test]
fn test_unknown_keys_warn_with_suggestion() {
    let (_, warnings) = parse(
        r#"
[engine]
paralelism = 2
"#,
    );

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].key, "paralelism");
    assert_eq!(warnings[0].line, Some(3));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("parallelism"));
}

#[test]
fn test_invalid_toml_is_config_error() {
    let err = parse_with_warnings::<Config>("[scope", FileFormat::Toml, Path::new("bad.toml"))
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Config { .. }));
}

#[test]
fn test_load_with_warnings_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drawstack.toml");
    fs::write(&path, "[backend]\npath = \"cloud.json\"\n").unwrap();

    let (config, warnings) = Config::load_with_warnings(&path).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(config.backend.path, PathBuf::from("cloud.json"));
}

#[test]
fn test_explicit_missing_config_fails() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(Config::load_or_default(Some(&missing)).is_err());
}

#[test]
fn test_env_overrides() {
    let vars = HashMap::from([
        ("DRAWSTACK_SUBSCRIPTION_ID", "sub-env"),
        ("DRAWSTACK_RESOURCE_GROUP", "rg-env"),
        ("DRAWSTACK_PARALLELISM", "4"),
        ("DRAWSTACK_STATE_PATH", "/tmp/state.toml"),
    ]);
    let config = apply_overrides(Config::default(), |name| {
        vars.get(name).map(|v| v.to_string())
    });

    assert_eq!(config.scope.subscription_id.as_deref(), Some("sub-env"));
    assert_eq!(config.scope.resource_group.as_deref(), Some("rg-env"));
    assert_eq!(config.engine.parallelism, 4);
    assert_eq!(config.state.path, PathBuf::from("/tmp/state.toml"));
}

#[test]
fn test_invalid_parallelism_override_is_ignored() {
    let config = apply_overrides(Config::default(), |name| {
        (name == "DRAWSTACK_PARALLELISM").then(|| "zero".to_string())
    });
    assert_eq!(config.engine.parallelism, 1);
}

#[test]
fn test_missing_scope_lists_both_fields() {
    match Config::default().deployment_scope() {
        Err(ProvisionError::Validation { issues }) => {
            let subjects: Vec<&str> = issues.iter().map(|i| i.subject.as_str()).collect();
            assert_eq!(subjects, vec!["scope.subscription_id", "scope.resource_group"]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_converge_options_follow_config() {
    let (config, _) = parse(
        r#"
[scope]
subscription_id = "sub-1"
resource_group = "rg-draw"

[engine]
parallelism = 2
detect_unmanaged = false
"#,
    );
    let options = config.converge_options().unwrap();
    assert_eq!(options.scope.to_string(), "sub-1/rg-draw");
    assert_eq!(options.parallelism, 2);
    assert!(!options.detect_unmanaged);
    assert_eq!(options.retry.max_attempts, 4);
}

#[test]
fn test_format_from_extension() {
    assert_eq!(FileFormat::from_path(Path::new("p.yaml")), FileFormat::Yaml);
    assert_eq!(FileFormat::from_path(Path::new("p.YML")), FileFormat::Yaml);
    assert_eq!(FileFormat::from_path(Path::new("p.toml")), FileFormat::Toml);
    assert_eq!(FileFormat::from_path(Path::new("params")), FileFormat::Toml);
}
