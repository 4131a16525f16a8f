//! Stage domain model

use crate::core::{
    config::StageConfig,
    gate::Gate,
    state::RunState,
    step::{StageDefaults, StepSpec},
};
use std::collections::{BTreeMap, HashSet};

/// A single stage of the pipeline
#[derive(Debug, Clone)]
pub struct Stage {
    /// Unique stage identifier
    pub id: String,

    /// Stage IDs this stage depends on
    pub depends_on: Vec<String>,

    /// Gating predicate evaluated against the trigger context
    pub gate: Gate,

    /// Ordered steps interpreted by the executor
    pub steps: Vec<StepSpec>,

    /// Wall-clock timeout per run, in seconds
    pub timeout_secs: u64,

    /// Aggregate state over all runs
    pub state: RunState,

    /// One run per matrix tuple (a single run with no parameters when the
    /// stage has no matrix)
    pub runs: Vec<StageRun>,
}

/// One execution instance of a stage (one per matrix tuple)
#[derive(Debug, Clone)]
pub struct StageRun {
    /// Matrix parameters for this run, in deterministic order
    pub params: Vec<(String, String)>,

    /// Runtime state
    pub state: RunState,
}

impl StageRun {
    /// Display label, e.g. "os=ubuntu, python=3.11"
    pub fn label(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Expand a matrix into the ordered cross product of its parameters
///
/// Keys iterate in sorted order (BTreeMap), values in declaration order, so
/// the tuple sequence is deterministic across runs.
pub fn expand_matrix(matrix: &BTreeMap<String, Vec<String>>) -> Vec<Vec<(String, String)>> {
    let mut tuples: Vec<Vec<(String, String)>> = vec![vec![]];
    for (key, values) in matrix {
        let mut next = Vec::with_capacity(tuples.len() * values.len());
        for tuple in &tuples {
            for value in values {
                let mut extended = tuple.clone();
                extended.push((key.clone(), value.clone()));
                next.push(extended);
            }
        }
        tuples = next;
    }
    tuples
}

impl Stage {
    /// Create a stage from a stage config
    pub fn from_config(config: &StageConfig, defaults: &StageDefaults) -> Self {
        let runs = match &config.matrix {
            Some(matrix) => expand_matrix(matrix)
                .into_iter()
                .map(|params| StageRun {
                    params,
                    state: RunState::Pending,
                })
                .collect(),
            None => vec![StageRun {
                params: vec![],
                state: RunState::Pending,
            }],
        };

        Stage {
            id: config.id.clone(),
            depends_on: config.depends_on.clone(),
            gate: config.when.clone(),
            steps: config.steps.clone(),
            timeout_secs: config.timeout_secs.unwrap_or(defaults.timeout_secs),
            state: RunState::Pending,
            runs,
        }
    }

    /// Check if all dependencies are in the given set of succeeded stages
    pub fn dependencies_met(&self, succeeded: &HashSet<String>) -> bool {
        self.depends_on.iter().all(|dep| succeeded.contains(dep))
    }

    /// Whether all runs of this stage reached a terminal state
    pub fn runs_terminal(&self) -> bool {
        self.runs.iter().all(|r| r.state.is_terminal())
    }
}
