//! CLI command definitions

use crate::core::EventKind;
use clap::Args;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Event kind that triggered the run
    #[arg(long, value_enum)]
    pub event: EventArg,

    /// Triggering git reference (e.g. refs/tags/v1.2.3)
    #[arg(long = "git-ref")]
    pub git_ref: String,

    /// Override the default branch from the pipeline file
    #[arg(long)]
    pub default_branch: Option<String>,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a pipeline definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Resolve the documentation version for a reference
#[derive(Debug, Args, Clone)]
pub struct ResolveCommand {
    /// Path to pipeline YAML file (for versioning rules)
    #[arg(short, long)]
    pub file: Option<String>,

    /// Git reference to resolve (e.g. refs/tags/v1.2.3)
    #[arg(long = "git-ref")]
    pub git_ref: String,

    /// Default branch to resolve against
    #[arg(long)]
    pub default_branch: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List pipelines with run history
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Show run counts
    #[arg(long)]
    pub with_counts: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Pipeline name to filter by
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show full details
    #[arg(long)]
    pub verbose: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a specific run by ID
    #[arg(long)]
    pub run_id: Option<String>,
}

/// Event kind argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EventArg {
    Push,
    #[clap(name = "pull-request")]
    PullRequest,
    #[clap(name = "merge-group")]
    MergeGroup,
    Manual,
}

impl From<EventArg> for EventKind {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::Push => EventKind::Push,
            EventArg::PullRequest => EventKind::PullRequest,
            EventArg::MergeGroup => EventKind::MergeGroup,
            EventArg::Manual => EventKind::Manual,
        }
    }
}
