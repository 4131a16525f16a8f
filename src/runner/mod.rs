//! Command execution seam
//!
//! External toolchains (test runners, doc generators, package builders,
//! hosting CLIs) are invoked as commands through this trait so the engine
//! can be driven by a mock in tests.

pub mod shell;

use async_trait::async_trait;
pub use shell::ShellRunner;

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Error types for command execution
///
/// A command that runs and exits non-zero is not an error at this layer;
/// it is reported through [`CommandOutput`]. Errors here mean the command
/// could not be run at all.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to spawn command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Captured result of one command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the command exited successfully
    pub success: bool,

    /// Exit code, when the process exited normally
    pub exit_code: Option<i32>,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// A successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given exit code and stderr
    pub fn err(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Trait for running commands - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command in the given working directory with the given
    /// environment
    async fn run(
        &self,
        command: &str,
        workdir: &Path,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, RunnerError>;
}
