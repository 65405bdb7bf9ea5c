//! Configuration loading
//!
//! Shared by `drawstack.toml` and blueprint parameter files: both are parsed
//! through `serde_ignored` so unknown keys surface as warnings with a
//! suggestion instead of being silently dropped.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{ProvisionError, ProvisionResult};

use super::types::Config;

/// Config file looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "drawstack.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

/// Syntax of a configuration or parameters file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
}

impl FileFormat {
    /// `.yaml` and `.yml` are YAML, everything else is TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                FileFormat::Yaml
            }
            _ => FileFormat::Toml,
        }
    }
}

/// Deserialize `content`, collecting unknown keys as warnings
pub fn parse_with_warnings<T: DeserializeOwned>(
    content: &str,
    format: FileFormat,
    file: &Path,
) -> ProvisionResult<(T, Vec<ConfigWarning>)> {
    let mut unknown_paths: Vec<String> = Vec::new();
    let mut record = |p: serde_ignored::Path<'_>| unknown_paths.push(p.to_string());

    let parsed: Result<T, String> = match format {
        FileFormat::Toml => {
            let deserializer = toml::de::Deserializer::new(content);
            serde_ignored::deserialize(deserializer, &mut record).map_err(|e| e.to_string())
        }
        FileFormat::Yaml => {
            let deserializer = serde_yaml_ng::Deserializer::from_str(content);
            serde_ignored::deserialize(deserializer, &mut record).map_err(|e| e.to_string())
        }
    };
    let value = parsed.map_err(|message| ProvisionError::Config {
        file: file.to_path_buf(),
        message,
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(content, &key),
                suggestion: suggest_key(&key),
                file: file.to_path_buf(),
                key,
            }
        })
        .collect();

    Ok((value, warnings))
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> ProvisionResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|e| ProvisionError::Config {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_with_warnings(&content, FileFormat::Toml, path)
}

/// Which config file applies, if any.
///
/// An explicit path always wins, even if it does not exist (loading it then
/// fails loudly). Otherwise the project file, then the user file.
pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let project = PathBuf::from(PROJECT_CONFIG_FILE);
    if project.exists() {
        return Some(project);
    }

    user_config_path().filter(|p| p.exists())
}

/// Load from an explicit file, project config, user config, or defaults
pub fn load_or_default(explicit: Option<&Path>) -> ProvisionResult<(Config, Vec<ConfigWarning>)> {
    let (config, warnings) = match discover(explicit) {
        Some(path) => {
            tracing::debug!(file = %path.display(), "loading config");
            load_with_warnings(&path)?
        }
        None => (Config::default(), Vec::new()),
    };
    Ok((with_env_overrides(config), warnings))
}

/// Apply environment variable overrides (DRAWSTACK_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_overrides(config, |name| std::env::var(name).ok())
}

/// Apply overrides from `lookup`, which maps a variable name to its value
pub fn apply_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(subscription) = lookup("DRAWSTACK_SUBSCRIPTION_ID").filter(|v| !v.is_empty()) {
        config.scope.subscription_id = Some(subscription);
    }

    if let Some(group) = lookup("DRAWSTACK_RESOURCE_GROUP").filter(|v| !v.is_empty()) {
        config.scope.resource_group = Some(group);
    }

    if let Some(parallelism) = lookup("DRAWSTACK_PARALLELISM") {
        match parallelism.trim().parse::<usize>() {
            Ok(n) if n > 0 => config.engine.parallelism = n,
            _ => tracing::warn!(value = %parallelism, "ignoring invalid DRAWSTACK_PARALLELISM"),
        }
    }

    if let Some(path) = lookup("DRAWSTACK_STATE_PATH").filter(|v| !v.is_empty()) {
        config.state.path = PathBuf::from(path);
    }

    config
}

/// `<user config dir>/drawstack/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("drawstack").join("config.toml"))
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "scope",
        "subscription_id",
        "resource_group",
        "retry",
        "max_attempts",
        "base_delay_ms",
        "max_delay_ms",
        "engine",
        "parallelism",
        "detect_unmanaged",
        "state",
        "backend",
        "path",
        "location",
        "state_storage_name",
        "compute_name",
        "artifact_storage_name",
        "artifact_container",
        "storage_sku",
        "plan_sku",
        "runtime",
        "identity_name",
        "plan_id",
        "role",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] =
                std::cmp::min(std::cmp::min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
