//! Process runner for delegated external steps
//!
//! Dependency installation, the discovery probe, and the generated demo all
//! run as subprocesses with captured output and an explicit working
//! directory. The pipeline never depends on ambient working-directory side
//! effects.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors spawning an external process
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait for running external programs with captured output
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: &Path,
    ) -> Result<ProcessOutput, ExecError>;
}

/// Default runner using tokio::process
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for ShellRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: &Path,
    ) -> Result<ProcessOutput, ExecError> {
        debug!(program = %program, ?args, cwd = %working_dir.display(), "Running process");

        let output = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .output()
            .await
            .map_err(|e| ExecError::Spawn {
                program: program.to_string(),
                source: e,
            })?;

        Ok(ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_shell_runner_success() {
        let runner = ShellRunner::new();
        let dir = tempdir().unwrap();

        let result = runner
            .run("echo", &args(&["hello"]), dir.path())
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(result.stdout.contains("hello"));
        assert!(result.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_shell_runner_nonzero_exit() {
        let runner = ShellRunner::new();
        let dir = tempdir().unwrap();

        let result = runner
            .run("sh", &args(&["-c", "exit 3"]), dir.path())
            .await
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(result.exit_code, 3);
    }

    #[tokio::test]
    async fn test_shell_runner_missing_program() {
        let runner = ShellRunner::new();
        let dir = tempdir().unwrap();

        let result = runner
            .run("definitely-not-a-program", &[], dir.path())
            .await;

        match result.unwrap_err() {
            ExecError::Spawn { program, .. } => {
                assert_eq!(program, "definitely-not-a-program");
            }
        }
    }

    #[tokio::test]
    async fn test_shell_runner_uses_working_dir() {
        let runner = ShellRunner::new();
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

        let result = runner
            .run("ls", &[], dir.path())
            .await
            .unwrap();

        assert!(result.stdout.contains("marker.txt"));
    }
}
