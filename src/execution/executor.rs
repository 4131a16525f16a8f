//! Stage executor - runs one stage run inside a disposable workspace

use crate::{
    artifacts::{copy_dir, ArtifactStore},
    core::{Stage, StepSpec, TriggerContext},
    runner::CommandRunner,
    versioning::VersionResolver,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of executing one stage run
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// The run completed successfully
    ///
    /// `notice` is set when the run ended early on purpose (e.g. nothing to
    /// publish for this reference).
    Success {
        output: String,
        notice: Option<String>,
    },
    /// The run failed
    Failed { error: String },
}

/// Outcome of a single step within a run
enum StepOutcome {
    Completed,
    EarlyExit { notice: String },
    Failed { error: String },
}

/// Executes the steps of a single stage run
pub struct StageExecutor<R> {
    runner: R,
    resolver: VersionResolver,
    artifacts: Arc<ArtifactStore>,
}

impl<R: CommandRunner> StageExecutor<R> {
    pub fn new(runner: R, resolver: VersionResolver, artifacts: Arc<ArtifactStore>) -> Self {
        Self {
            runner,
            resolver,
            artifacts,
        }
    }

    /// Execute a stage run and return the result
    ///
    /// Provisions a fresh workspace directory, interprets the stage's steps
    /// in order, and removes the workspace afterwards. The whole run is
    /// bounded by the stage's wall-clock timeout.
    pub async fn execute(
        &self,
        stage: &Stage,
        params: &[(String, String)],
        ctx: &TriggerContext,
    ) -> ExecutionResult {
        info!("Executing stage: {}", stage.id);

        let workspace = std::env::temp_dir().join(format!("shipway-run-{}", Uuid::new_v4()));
        if let Err(e) = std::fs::create_dir_all(&workspace) {
            return ExecutionResult::Failed {
                error: format!("Failed to provision workspace: {}", e),
            };
        }

        let mut env = ctx.env();
        for (key, value) in params {
            env.insert(format!("MATRIX_{}", key.to_uppercase()), value.clone());
        }

        let timeout_duration = Duration::from_secs(stage.timeout_secs);
        let result = match timeout(
            timeout_duration,
            self.run_steps(stage, &workspace, &mut env, ctx),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!("Timeout for stage {} after {}s", stage.id, stage.timeout_secs);
                ExecutionResult::Failed {
                    error: format!("Timeout after {} seconds", stage.timeout_secs),
                }
            }
        };

        if let Err(e) = std::fs::remove_dir_all(&workspace) {
            warn!("Failed to remove workspace {}: {}", workspace.display(), e);
        }

        result
    }

    async fn run_steps(
        &self,
        stage: &Stage,
        workspace: &Path,
        env: &mut HashMap<String, String>,
        ctx: &TriggerContext,
    ) -> ExecutionResult {
        let mut output = String::new();

        for step in &stage.steps {
            match self.run_step(step, workspace, env, ctx, &mut output).await {
                StepOutcome::Completed => {}
                StepOutcome::EarlyExit { notice } => {
                    info!("Stage {} ended early: {}", stage.id, notice);
                    return ExecutionResult::Success {
                        output,
                        notice: Some(notice),
                    };
                }
                StepOutcome::Failed { error } => {
                    return ExecutionResult::Failed {
                        error: format!("Step '{}' failed: {}", step.label(), error),
                    };
                }
            }
        }

        ExecutionResult::Success {
            output,
            notice: None,
        }
    }

    async fn run_step(
        &self,
        step: &StepSpec,
        workspace: &Path,
        env: &mut HashMap<String, String>,
        ctx: &TriggerContext,
        output: &mut String,
    ) -> StepOutcome {
        match step {
            StepSpec::Run { commands, .. } => {
                for command in commands {
                    debug!("Running command: {}", command);
                    let result = match self.runner.run(command, workspace, env).await {
                        Ok(result) => result,
                        Err(e) => {
                            return StepOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    };

                    output.push_str(&result.stdout);
                    if !result.success {
                        let status = result
                            .exit_code
                            .map_or("signal".to_string(), |c| c.to_string());
                        return StepOutcome::Failed {
                            error: format!(
                                "command '{}' exited with status {}: {}",
                                command,
                                status,
                                result.stderr.trim()
                            ),
                        };
                    }
                }
                StepOutcome::Completed
            }

            StepSpec::UploadArtifact { name, path } => {
                let source = workspace.join(path);
                if !source.is_dir() {
                    return StepOutcome::Failed {
                        error: format!("artifact source directory '{}' missing", path),
                    };
                }
                match self.artifacts.put(name, &source).await {
                    Ok(()) => StepOutcome::Completed,
                    Err(e) => StepOutcome::Failed {
                        error: e.to_string(),
                    },
                }
            }

            StepSpec::DownloadArtifact { name, dest } => {
                let stored = match self.artifacts.get(name).await {
                    Ok(path) => path,
                    Err(e) => {
                        return StepOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                let dest = workspace.join(dest.as_deref().unwrap_or(name));
                match copy_dir(&stored, &dest) {
                    Ok(()) => StepOutcome::Completed,
                    Err(e) => StepOutcome::Failed {
                        error: format!("failed to copy artifact '{}': {}", name, e),
                    },
                }
            }

            StepSpec::ResolveDocsVersion => {
                let decision = self.resolver.resolve(ctx);
                if !decision.publish {
                    return StepOutcome::EarlyExit {
                        notice: format!(
                            "documentation publishing skipped for '{}'",
                            ctx.ref_name
                        ),
                    };
                }
                if let Some(version) = decision.version {
                    env.insert("DOCS_VERSION".to_string(), version);
                }
                env.insert("DOCS_ALIASES".to_string(), decision.aliases.join(" "));
                StepOutcome::Completed
            }
        }
    }
}
