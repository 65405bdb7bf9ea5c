//! StateRepository port - abstraction for deployment state persistence
//!
//! Lets the engine load and save its declaration to live-identity map without
//! knowing about TOML serialization or file locking.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::ProvisionError;

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;

/// State persistence errors
#[derive(Error, Debug)]
pub enum StateError {
    #[error("cannot access state: {0}")]
    Io(String),
    #[error("invalid state format: {0}")]
    Parse(String),
    #[error("state version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("state is locked by another deployment: {0}")]
    Locked(String),
}

impl StateError {
    pub fn at(self, path: &Path) -> ProvisionError {
        ProvisionError::State {
            path: path.to_path_buf(),
            message: self.to_string(),
        }
    }
}

/// Held for the duration of a deployment; releasing it unlocks the state
pub trait StateGuard: Send {}

/// Abstract repository for deployment state
pub trait StateRepository: Send + Sync {
    /// State type (to be defined in entities)
    type State;

    /// Load state from path, or an empty state if none exists yet
    fn load(&self, path: &Path) -> StateResult<Self::State>;

    /// Save state to path
    fn save(&self, state: &Self::State, path: &Path) -> StateResult<()>;

    /// Take the exclusive deployment lock for `path`
    fn lock(&self, path: &Path) -> StateResult<Box<dyn StateGuard>>;
}

/// Lock file path used alongside a state file
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_error_display() {
        let err = StateError::Parse("bad toml".to_string());
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn lock_path_sits_next_to_state() {
        assert_eq!(
            lock_path_for(Path::new(".drawstack/state.toml")),
            PathBuf::from(".drawstack/state.toml.lock")
        );
    }

    #[test]
    fn state_error_maps_to_provision_error() {
        let err = StateError::VersionMismatch {
            found: 9,
            expected: 1,
        }
        .at(Path::new("s.toml"));
        assert_eq!(
            err.to_string(),
            "state file s.toml: state version 9 is not supported (expected 1)"
        );
    }
}
