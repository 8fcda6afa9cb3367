//! Shared utilities for end-to-end bootstrap tests.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use tempfile::TempDir;

/// Variables a developer shell may carry that would leak into the
/// configuration under test.
const AMBIENT_VARS: &[&str] = &[
    "BOOTSTRAP_CONFIG",
    "BOOTSTRAP_PROFILE",
    "BOOTSTRAP_RELOAD",
    "BOOTSTRAP_HANDOFF",
    "BOOTSTRAP_MIGRATION_TIMEOUT",
    "BOOTSTRAP_LOG_FORMAT",
    "SERVICE_NAME",
    "APP_HOST",
    "APP_PORT",
    "LOG_LEVEL",
    "DATABASE_URL",
    "ALEMBIC_URL",
    "DATABASE_USER",
    "DATABASE_PASSWORD",
    "DATABASE_HOST",
    "DATABASE_PORT",
    "DATABASE_NAME",
];

/// A scratch directory holding a config file and marker files.
pub struct Sandbox {
    dir: TempDir,
}

#[allow(dead_code)]
impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `bootstrap.toml` and return its path.
    pub fn config(&self, content: &str) -> PathBuf {
        let path = self.path("bootstrap.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    /// The bootstrap binary, run from the sandbox with a clean environment.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("service-bootstrap").unwrap();
        cmd.current_dir(self.dir.path()).env("RUST_LOG", "debug");
        for var in AMBIENT_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Same as [`Sandbox::command`] but as a std command, for tests that
    /// need the child's pid.
    pub fn std_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin("service-bootstrap"));
        cmd.current_dir(self.dir.path()).env("RUST_LOG", "debug");
        for var in AMBIENT_VARS {
            cmd.env_remove(var);
        }
        cmd
    }
}

/// A TOML config whose migration and server are `/bin/sh -c` scripts.
///
/// Scripts must not contain `{` or `}`; server args are placeholder
/// templates.
pub fn shell_config(migration: &str, server: &str) -> String {
    format!(
        r#"
[migration]
program = "/bin/sh"
args = ["-c", {migration:?}]

[server]
program = "/bin/sh"
args = ["-c", {server:?}]
handoff = "spawn"
check_port = false
"#
    )
}

/// Poll until `path` exists or `timeout` passes.
pub fn wait_for_file(path: &Path, timeout: Duration) -> bool {
    let started = Instant::now();
    while started.elapsed() < timeout {
        if path.exists() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

pub fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
