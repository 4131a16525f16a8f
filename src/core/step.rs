//! Typed step descriptions interpreted by the stage executor

use serde::{Deserialize, Serialize};

/// One step of a stage
///
/// Step bodies are data: either a command sequence handed to the command
/// runner or a named built-in action. The executor interprets them in order
/// and stops at the first failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSpec {
    /// Run a sequence of shell commands in the stage workspace
    Run {
        /// Optional display name
        #[serde(default)]
        name: Option<String>,
        commands: Vec<String>,
    },

    /// Publish a workspace directory to the artifact store (write-once)
    UploadArtifact { name: String, path: String },

    /// Copy a stored artifact into the workspace
    DownloadArtifact {
        name: String,
        /// Destination directory relative to the workspace; defaults to the
        /// artifact name
        #[serde(default)]
        dest: Option<String>,
    },

    /// Resolve the documentation version for the triggering reference
    ///
    /// Exports `DOCS_VERSION` and `DOCS_ALIASES` to later steps, or ends the
    /// stage early (successfully) when there is nothing to publish.
    ResolveDocsVersion,
}

impl StepSpec {
    /// Display label for logs and events
    pub fn label(&self) -> String {
        match self {
            StepSpec::Run { name, commands } => name
                .clone()
                .unwrap_or_else(|| commands.first().cloned().unwrap_or_default()),
            StepSpec::UploadArtifact { name, .. } => format!("upload artifact '{}'", name),
            StepSpec::DownloadArtifact { name, .. } => format!("download artifact '{}'", name),
            StepSpec::ResolveDocsVersion => "resolve docs version".to_string(),
        }
    }
}

/// Global defaults applied to stages without their own settings
#[derive(Debug, Clone)]
pub struct StageDefaults {
    pub timeout_secs: u64,
}

impl Default for StageDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: 1800, // 30 minutes
        }
    }
}
