//! Trigger context - the event that started a pipeline run

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of event that triggered the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A commit or tag was pushed
    Push,
    /// A review request was opened or updated
    PullRequest,
    /// A merge-queue entry is being tested
    MergeGroup,
    /// A manually dispatched run
    Manual,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::Push => "push",
            EventKind::PullRequest => "pull_request",
            EventKind::MergeGroup => "merge_group",
            EventKind::Manual => "manual",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(EventKind::Push),
            "pull_request" => Ok(EventKind::PullRequest),
            "merge_group" => Ok(EventKind::MergeGroup),
            "manual" => Ok(EventKind::Manual),
            other => Err(format!("Unknown event kind: {}", other)),
        }
    }
}

/// Immutable facts about the triggering event
///
/// Constructed once when the run starts; gates and the version resolver
/// only ever read from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerContext {
    /// Event kind
    pub event: EventKind,

    /// Full source-control reference as delivered (e.g. "refs/tags/v1.2.3")
    pub git_ref: String,

    /// Short reference name (e.g. "v1.2.3" or "main")
    pub ref_name: String,

    /// Whether the reference is a tag
    pub is_tag: bool,

    /// The repository's default branch
    pub default_branch: String,
}

impl TriggerContext {
    /// Create a context from an event kind and a git reference
    ///
    /// Recognizes the `refs/tags/` and `refs/heads/` prefixes; a bare name
    /// is treated as a branch.
    pub fn new(
        event: EventKind,
        git_ref: impl Into<String>,
        default_branch: impl Into<String>,
    ) -> Self {
        let git_ref = git_ref.into();
        let (ref_name, is_tag) = if let Some(name) = git_ref.strip_prefix("refs/tags/") {
            (name.to_string(), true)
        } else if let Some(name) = git_ref.strip_prefix("refs/heads/") {
            (name.to_string(), false)
        } else {
            (git_ref.clone(), false)
        };

        Self {
            event,
            git_ref,
            ref_name,
            is_tag,
            default_branch: default_branch.into(),
        }
    }

    /// Whether this run was started by pushing a tag
    pub fn is_tag_push(&self) -> bool {
        self.event == EventKind::Push && self.is_tag
    }

    /// Whether the reference names a pre-release (hyphen in the tag name)
    pub fn is_prerelease(&self) -> bool {
        self.is_tag && self.ref_name.contains('-')
    }

    /// Environment variables exported to every stage run
    pub fn env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("SHIPWAY_EVENT".to_string(), self.event.to_string());
        env.insert("SHIPWAY_REF".to_string(), self.git_ref.clone());
        env.insert("SHIPWAY_REF_NAME".to_string(), self.ref_name.clone());
        env.insert(
            "SHIPWAY_DEFAULT_BRANCH".to_string(),
            self.default_branch.clone(),
        );
        env.insert(
            "SHIPWAY_PRERELEASE".to_string(),
            self.is_prerelease().to_string(),
        );
        env
    }
}
