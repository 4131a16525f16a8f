//! Shell-backed command runner

use crate::runner::{CommandOutput, CommandRunner, RunnerError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Runs commands through the system shell
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    /// Create a runner using the default shell ("sh")
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    /// Create a runner using a specific shell binary
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        command: &str,
        workdir: &Path,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, RunnerError> {
        debug!(command, workdir = %workdir.display(), "running command");

        let output = tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .current_dir(workdir)
            .envs(env)
            .output()
            .await?;

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
