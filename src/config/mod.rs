//! Configuration module for drawstack
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (DRAWSTACK_*)
//! 3. Explicit `--config` file, else `./drawstack.toml`
//! 4. User config (`<config dir>/drawstack/config.toml`)
//! 5. Built-in defaults (lowest priority)

mod loader;
#[cfg(test)]
mod tests;
mod types;

pub use loader::{
    apply_overrides, discover, parse_with_warnings, user_config_path, ConfigWarning, FileFormat,
    PROJECT_CONFIG_FILE,
};
pub use types::{BackendConfig, Config, EngineConfig, RetryConfig, ScopeConfig, StateConfig};
