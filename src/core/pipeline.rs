//! Pipeline domain model

use crate::core::{
    config::{PipelineConfig, VersioningConfig},
    context::TriggerContext,
    stage::Stage,
    state::{ExecutionStatus, PipelineState, RunState, SkipReason},
    step::StageDefaults,
};
use std::collections::{HashMap, HashSet};

/// A pipeline definition plus its runtime state
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// The repository's default branch
    pub default_branch: String,

    /// Documentation versioning rules
    pub versioning: VersioningConfig,

    /// Pipeline stages
    pub stages: HashMap<String, Stage>,

    /// Execution state
    pub state: PipelineState,

    /// Stage execution order (topological sort)
    execution_order: Vec<String>,
}

impl Pipeline {
    /// Create a pipeline from configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        let defaults = StageDefaults {
            timeout_secs: config
                .default_timeout_secs
                .unwrap_or_else(|| StageDefaults::default().timeout_secs),
        };

        let stages: HashMap<String, Stage> = config
            .stages
            .iter()
            .map(|stage_config| {
                let stage = Stage::from_config(stage_config, &defaults);
                (stage.id.clone(), stage)
            })
            .collect();

        let execution_order = Self::topological_sort(&stages);

        Pipeline {
            name: config.name.clone(),
            default_branch: config.default_branch.clone(),
            versioning: config.versioning.clone(),
            stages,
            state: PipelineState::new(),
            execution_order,
        }
    }

    /// Get a stage by ID
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.get(id)
    }

    /// Get a mutable stage by ID
    pub fn stage_mut(&mut self, id: &str) -> Option<&mut Stage> {
        self.stages.get_mut(id)
    }

    /// Get execution order (topological sort)
    pub fn execution_order(&self) -> &[String] {
        &self.execution_order
    }

    /// Mark stages whose gate does not match the trigger as skipped
    ///
    /// Returns the IDs of newly skipped stages.
    pub fn apply_gates(&mut self, ctx: &TriggerContext) -> Vec<(String, SkipReason)> {
        let mut skipped = Vec::new();
        for stage_id in self.execution_order.clone() {
            let stage = match self.stages.get_mut(&stage_id) {
                Some(s) => s,
                None => continue,
            };
            if matches!(stage.state, RunState::Pending) && !stage.gate.matches(ctx) {
                Self::mark_skipped(stage, SkipReason::GateNotMatched);
                skipped.push((stage_id, SkipReason::GateNotMatched));
            }
        }
        skipped
    }

    /// Skip pending stages whose dependencies failed or were skipped
    ///
    /// A single pass in topological order is enough: dependencies always
    /// precede their dependents, so skips cascade transitively.
    pub fn propagate_skips(&mut self) -> Vec<(String, SkipReason)> {
        let mut skipped = Vec::new();
        for stage_id in self.execution_order.clone() {
            let blocked = {
                let stage = match self.stages.get(&stage_id) {
                    Some(s) => s,
                    None => continue,
                };
                if !matches!(stage.state, RunState::Pending) {
                    continue;
                }
                stage.depends_on.iter().find_map(|dep| {
                    match self.stages.get(dep).map(|d| &d.state) {
                        Some(RunState::Failed { .. }) => {
                            Some(SkipReason::DependencyFailed(dep.clone()))
                        }
                        Some(RunState::Skipped { .. }) => {
                            Some(SkipReason::DependencySkipped(dep.clone()))
                        }
                        _ => None,
                    }
                })
            };

            if let Some(reason) = blocked {
                if let Some(stage) = self.stages.get_mut(&stage_id) {
                    Self::mark_skipped(stage, reason.clone());
                }
                skipped.push((stage_id, reason));
            }
        }
        skipped
    }

    fn mark_skipped(stage: &mut Stage, reason: SkipReason) {
        stage.state = RunState::Skipped {
            reason: reason.clone(),
        };
        for run in &mut stage.runs {
            run.state = RunState::Skipped {
                reason: reason.clone(),
            };
        }
    }

    /// Stages ready to start: pending with every dependency succeeded
    pub fn ready_stages(&self) -> Vec<&Stage> {
        let succeeded: HashSet<String> = self
            .stages
            .values()
            .filter(|s| matches!(s.state, RunState::Succeeded { .. }))
            .map(|s| s.id.clone())
            .collect();

        let mut ready: Vec<&Stage> = self
            .stages
            .values()
            .filter(|s| matches!(s.state, RunState::Pending) && s.dependencies_met(&succeeded))
            .collect();
        // Deterministic dispatch order
        ready.sort_by(|a, b| a.id.cmp(&b.id));
        ready
    }

    /// Get all currently running stages
    pub fn running_stages(&self) -> Vec<&Stage> {
        self.stages
            .values()
            .filter(|s| matches!(s.state, RunState::Running { .. }))
            .collect()
    }

    /// Check if every stage reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.stages.values().all(|s| s.state.is_terminal())
    }

    /// Aggregate result over all stages; skipped stages do not fail the run
    pub fn overall_status(&self) -> ExecutionStatus {
        if self
            .stages
            .values()
            .any(|s| matches!(s.state, RunState::Failed { .. }))
        {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Succeeded
        }
    }

    /// Refresh the stage counts on the pipeline state
    pub fn update_state_counts(&mut self) {
        let mut succeeded = 0;
        let mut failed = 0;
        let mut skipped = 0;
        let mut running = 0;

        for stage in self.stages.values() {
            match &stage.state {
                RunState::Succeeded { .. } => succeeded += 1,
                RunState::Failed { .. } => failed += 1,
                RunState::Skipped { .. } => skipped += 1,
                RunState::Running { .. } => running += 1,
                RunState::Pending => {}
            }
        }

        self.state.update_counts(succeeded, failed, skipped, running);
    }

    /// Calculate topological sort of stages based on dependencies
    fn topological_sort(stages: &HashMap<String, Stage>) -> Vec<String> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();

        // Sort for deterministic order
        let mut stage_ids: Vec<_> = stages.keys().cloned().collect();
        stage_ids.sort();

        for stage_id in stage_ids {
            if !visited.contains(&stage_id) {
                Self::visit(&stage_id, stages, &mut visited, &mut result);
            }
        }

        result
    }

    fn visit(
        stage_id: &str,
        stages: &HashMap<String, Stage>,
        visited: &mut HashSet<String>,
        result: &mut Vec<String>,
    ) {
        if visited.contains(stage_id) {
            return;
        }
        visited.insert(stage_id.to_string());

        if let Some(stage) = stages.get(stage_id) {
            for dep in &stage.depends_on {
                Self::visit(dep, stages, visited, result);
            }
        }

        result.push(stage_id.to_string());
    }
}
