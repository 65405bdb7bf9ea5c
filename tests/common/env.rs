//! Test environment for isolated drawstack CLI runs.
//!
//! Every run happens in a fresh temp directory with `HOME` and the config
//! directory pointed inside it, so no user config leaks into a test.

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

use super::fixtures::{CONFIG_TOML, PARAMS_FILE, PARAMS_TOML};

/// Result of running a drawstack CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// Parse stdout as NDJSON
    pub fn events(&self) -> Vec<Value> {
        self.stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                serde_json::from_str(l).unwrap_or_else(|e| panic!("not JSON ({e}): {l}"))
            })
            .collect()
    }

    /// First event with the given `event` field
    pub fn event(&self, name: &str) -> Option<Value> {
        self.events().into_iter().find(|e| e["event"] == name)
    }
}

/// Isolated project directory with a parameters file and engine config
pub struct TestEnv {
    pub project_root: TempDir,
    bin: PathBuf,
}

impl TestEnv {
    /// Empty project directory
    pub fn empty() -> Self {
        Self {
            project_root: TempDir::new().expect("Failed to create temp dir"),
            bin: PathBuf::from(env!("CARGO_BIN_EXE_drawstack")),
        }
    }

    /// Project with the standard config and parameters files
    pub fn new() -> Self {
        let env = Self::empty();
        env.write_project_file("drawstack.toml", CONFIG_TOML);
        env.write_project_file(PARAMS_FILE, PARAMS_TOML);
        env
    }

    pub fn project_path(&self, relative: &str) -> PathBuf {
        self.project_root.path().join(relative)
    }

    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let home = self.project_path(".home");
        let mut cmd = Command::new(&self.bin);
        cmd.current_dir(self.project_root.path())
            .args(args)
            .env("HOME", &home)
            .env("XDG_CONFIG_HOME", home.join(".config"))
            .env_remove("RUST_LOG")
            .env_remove("DRAWSTACK_SUBSCRIPTION_ID")
            .env_remove("DRAWSTACK_RESOURCE_GROUP")
            .env_remove("DRAWSTACK_PARALLELISM")
            .env_remove("DRAWSTACK_STATE_PATH");
        for (key, value) in env_vars {
            cmd.env(key, value);
        }
        let output = cmd.output().expect("Failed to execute drawstack");
        to_result(output)
    }

    pub fn write_project_file(&self, relative: &str, content: &str) {
        let path = self.project_path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&path, content).expect("Failed to write file");
    }

    pub fn read_project_file(&self, relative: &str) -> String {
        std::fs::read_to_string(self.project_path(relative))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative, e))
    }

    /// Deployment state written by apply
    pub fn read_state(&self) -> String {
        self.read_project_file(".drawstack/state.toml")
    }

    /// Emulated cloud written by the local backend
    pub fn read_cloud(&self) -> Value {
        serde_json::from_str(&self.read_project_file(".drawstack/cloud.json"))
            .expect("cloud.json is not JSON")
    }
}

fn to_result(output: Output) -> TestResult {
    TestResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}
