//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Pipeline has not started
    Pending,
    /// Pipeline is currently running
    Running,
    /// Every non-skipped stage succeeded
    Succeeded,
    /// At least one stage failed
    Failed,
}

/// Why a stage (and its runs) were skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The gate did not match the trigger context
    GateNotMatched,
    /// A dependency failed
    DependencyFailed(String),
    /// A dependency was itself skipped
    DependencySkipped(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::GateNotMatched => write!(f, "gate did not match trigger"),
            SkipReason::DependencyFailed(dep) => write!(f, "dependency '{}' failed", dep),
            SkipReason::DependencySkipped(dep) => write!(f, "dependency '{}' was skipped", dep),
        }
    }
}

/// State of a stage or of a single matrix run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunState {
    /// Waiting for dependencies
    Pending,
    /// Currently running
    Running { started_at: DateTime<Utc> },
    /// Finished successfully
    ///
    /// `notice` carries a deliberate early-exit message (e.g. docs
    /// publishing intentionally skipped for a pre-release tag).
    Succeeded {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        notice: Option<String>,
    },
    /// Finished with an error
    Failed {
        error: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Never ran (gate mismatch or dependency failure)
    Skipped { reason: SkipReason },
}

impl RunState {
    /// Check if the state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Succeeded { .. } | RunState::Failed { .. } | RunState::Skipped { .. }
        )
    }
}

/// Overall pipeline state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution completed/failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of stages
    pub total_stages: usize,

    /// Number of succeeded stages
    pub succeeded_stages: usize,

    /// Number of failed stages
    pub failed_stages: usize,

    /// Number of skipped stages
    pub skipped_stages: usize,

    /// Number of currently running stages
    pub running_stages: usize,
}

impl PipelineState {
    /// Create a new pipeline state
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            total_stages: 0,
            succeeded_stages: 0,
            failed_stages: 0,
            skipped_stages: 0,
            running_stages: 0,
        }
    }

    /// Mark pipeline as started
    pub fn start(&mut self, total_stages: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_stages = total_stages;
    }

    /// Mark the pipeline as finished with the given status
    pub fn finish(&mut self, status: ExecutionStatus) {
        self.status = status;
        self.completed_at = Some(Utc::now());
    }

    /// Update stage counts
    pub fn update_counts(
        &mut self,
        succeeded: usize,
        failed: usize,
        skipped: usize,
        running: usize,
    ) {
        self.succeeded_stages = succeeded;
        self.failed_stages = failed;
        self.skipped_stages = skipped;
        self.running_stages = running;
    }

    /// Calculate progress percentage (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_stages == 0 {
            return 0.0;
        }
        (self.succeeded_stages + self.failed_stages + self.skipped_stages) as f64
            / self.total_stages as f64
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
