//! Main execution engine - orchestrates the entire pipeline run

use crate::{
    artifacts::ArtifactStore,
    core::{ExecutionStatus, Pipeline, RunState, SkipReason, TriggerContext},
    execution::{ExecutionResult, StageExecutor},
    runner::CommandRunner,
    versioning::VersionResolver,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        run_id: Uuid,
        pipeline_name: String,
    },
    StageStarted {
        stage_id: String,
        runs: usize,
    },
    StageRunCompleted {
        stage_id: String,
        label: String,
        notice: Option<String>,
    },
    StageRunFailed {
        stage_id: String,
        label: String,
        error: String,
    },
    StageCompleted {
        stage_id: String,
        notice: Option<String>,
    },
    StageFailed {
        stage_id: String,
        error: String,
    },
    StageSkipped {
        stage_id: String,
        reason: SkipReason,
    },
    PipelineCompleted {
        run_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Error types for the engine itself
///
/// Stage failures are not errors here; they are reported through stage
/// states and the final [`ExecutionStatus`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Stage '{0}' not found")]
    StageNotFound(String),

    #[error("Pipeline stuck - stages remain pending with no runnable work")]
    Stuck,
}

/// Main pipeline execution engine
///
/// Dispatches every eligible stage run onto the async runtime; runs whose
/// dependencies are satisfied execute in parallel, matrix runs of one stage
/// all at once. Completion of a run is what makes dependents eligible -
/// there is no polling.
pub struct ExecutionEngine<R> {
    executor: Arc<StageExecutor<R>>,
    event_handlers: Vec<EventHandler>,
}

impl<R: CommandRunner + 'static> ExecutionEngine<R> {
    pub fn new(runner: R, resolver: VersionResolver, artifacts: Arc<ArtifactStore>) -> Self {
        Self {
            executor: Arc::new(StageExecutor::new(runner, resolver, artifacts)),
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute the entire pipeline against one trigger context
    pub async fn execute(
        &self,
        pipeline: &mut Pipeline,
        ctx: &TriggerContext,
    ) -> Result<ExecutionStatus, EngineError> {
        let run_id = pipeline.state.run_id;
        info!(
            "Starting pipeline run: {} ({}) for {} on {}",
            pipeline.name, run_id, ctx.event, ctx.git_ref
        );
        self.emit(ExecutionEvent::PipelineStarted {
            run_id,
            pipeline_name: pipeline.name.clone(),
        });

        pipeline.state.start(pipeline.stages.len());

        for (stage_id, reason) in pipeline.apply_gates(ctx) {
            info!("Stage {} skipped: {}", stage_id, reason);
            self.emit(ExecutionEvent::StageSkipped { stage_id, reason });
        }

        let mut join_set: JoinSet<(String, usize, ExecutionResult)> = JoinSet::new();
        let mut task_index: HashMap<tokio::task::Id, (String, usize)> = HashMap::new();

        loop {
            for (stage_id, reason) in pipeline.propagate_skips() {
                info!("Stage {} skipped: {}", stage_id, reason);
                self.emit(ExecutionEvent::StageSkipped { stage_id, reason });
            }

            let ready: Vec<String> = pipeline
                .ready_stages()
                .iter()
                .map(|s| s.id.clone())
                .collect();

            for stage_id in ready {
                self.dispatch_stage(pipeline, &stage_id, ctx, &mut join_set, &mut task_index)?;
            }

            pipeline.update_state_counts();

            let (stage_id, run_index, result) = match join_set.join_next_with_id().await {
                None => break,
                Some(Ok((task_id, (stage_id, run_index, result)))) => {
                    task_index.remove(&task_id);
                    (stage_id, run_index, result)
                }
                Some(Err(join_err)) => {
                    let (stage_id, run_index) = match task_index.remove(&join_err.id()) {
                        Some(entry) => entry,
                        None => {
                            error!("Finished task not tracked: {}", join_err);
                            continue;
                        }
                    };
                    (
                        stage_id,
                        run_index,
                        ExecutionResult::Failed {
                            error: format!("stage run task aborted: {}", join_err),
                        },
                    )
                }
            };

            self.record_run_result(pipeline, &stage_id, run_index, result)?;
        }

        if !pipeline.is_complete() {
            error!("No runnable stages left but the pipeline is not complete");
            pipeline.state.finish(ExecutionStatus::Failed);
            self.emit(ExecutionEvent::PipelineCompleted {
                run_id,
                status: ExecutionStatus::Failed,
            });
            return Err(EngineError::Stuck);
        }

        let status = pipeline.overall_status();
        pipeline.state.finish(status);
        pipeline.update_state_counts();

        info!("Pipeline run finished: {} - {:?}", pipeline.name, status);
        self.emit(ExecutionEvent::PipelineCompleted { run_id, status });

        Ok(status)
    }

    /// Mark a stage running and spawn all of its runs
    fn dispatch_stage(
        &self,
        pipeline: &mut Pipeline,
        stage_id: &str,
        ctx: &TriggerContext,
        join_set: &mut JoinSet<(String, usize, ExecutionResult)>,
        task_index: &mut HashMap<tokio::task::Id, (String, usize)>,
    ) -> Result<(), EngineError> {
        let snapshot = {
            let stage = pipeline
                .stage_mut(stage_id)
                .ok_or_else(|| EngineError::StageNotFound(stage_id.to_string()))?;
            let started_at = Utc::now();
            stage.state = RunState::Running { started_at };
            for run in &mut stage.runs {
                run.state = RunState::Running { started_at };
            }
            stage.clone()
        };

        self.emit(ExecutionEvent::StageStarted {
            stage_id: stage_id.to_string(),
            runs: snapshot.runs.len(),
        });

        for (run_index, run) in snapshot.runs.iter().enumerate() {
            let executor = Arc::clone(&self.executor);
            let stage = snapshot.clone();
            let params = run.params.clone();
            let ctx = ctx.clone();
            let task_stage_id = stage_id.to_string();

            let handle = join_set.spawn(async move {
                let result = executor.execute(&stage, &params, &ctx).await;
                (task_stage_id, run_index, result)
            });
            task_index.insert(handle.id(), (stage_id.to_string(), run_index));
        }

        Ok(())
    }

    /// Record one finished run and aggregate the stage when all runs are done
    fn record_run_result(
        &self,
        pipeline: &mut Pipeline,
        stage_id: &str,
        run_index: usize,
        result: ExecutionResult,
    ) -> Result<(), EngineError> {
        let mut events = Vec::new();

        {
            let stage = pipeline
                .stage_mut(stage_id)
                .ok_or_else(|| EngineError::StageNotFound(stage_id.to_string()))?;
            let run = &mut stage.runs[run_index];
            let started_at = match run.state {
                RunState::Running { started_at } => started_at,
                _ => Utc::now(),
            };
            let label = run.label();

            match result {
                ExecutionResult::Success { notice, .. } => {
                    run.state = RunState::Succeeded {
                        started_at,
                        completed_at: Utc::now(),
                        notice: notice.clone(),
                    };
                    events.push(ExecutionEvent::StageRunCompleted {
                        stage_id: stage_id.to_string(),
                        label,
                        notice,
                    });
                }
                ExecutionResult::Failed { error } => {
                    warn!("Stage {} run failed: {}", stage_id, error);
                    run.state = RunState::Failed {
                        error: error.clone(),
                        started_at,
                        failed_at: Utc::now(),
                    };
                    events.push(ExecutionEvent::StageRunFailed {
                        stage_id: stage_id.to_string(),
                        label,
                        error,
                    });
                }
            }

            // Matrix runs never abort their siblings; the stage aggregates
            // only once every run is terminal.
            if stage.runs_terminal() {
                let stage_started = match stage.state {
                    RunState::Running { started_at } => started_at,
                    _ => Utc::now(),
                };
                let first_error = stage.runs.iter().find_map(|r| match &r.state {
                    RunState::Failed { error, .. } => Some(error.clone()),
                    _ => None,
                });

                match first_error {
                    Some(error) => {
                        stage.state = RunState::Failed {
                            error: error.clone(),
                            started_at: stage_started,
                            failed_at: Utc::now(),
                        };
                        events.push(ExecutionEvent::StageFailed {
                            stage_id: stage_id.to_string(),
                            error,
                        });
                    }
                    None => {
                        let notice = stage.runs.iter().find_map(|r| match &r.state {
                            RunState::Succeeded {
                                notice: Some(n), ..
                            } => Some(n.clone()),
                            _ => None,
                        });
                        stage.state = RunState::Succeeded {
                            started_at: stage_started,
                            completed_at: Utc::now(),
                            notice: notice.clone(),
                        };
                        events.push(ExecutionEvent::StageCompleted {
                            stage_id: stage_id.to_string(),
                            notice,
                        });
                    }
                }
            }
        }

        pipeline.update_state_counts();
        for event in events {
            self.emit(event);
        }

        Ok(())
    }
}
