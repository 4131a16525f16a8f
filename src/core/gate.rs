//! Stage gating predicates

use crate::core::context::{EventKind, TriggerContext};
use serde::{Deserialize, Serialize};

/// Decides whether a stage runs for a given trigger
///
/// Gates are data, not code: the pipeline file declares them and the
/// orchestrator evaluates them against the trigger context. An empty gate
/// matches every trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    /// Events the stage runs for (empty = any event)
    #[serde(default)]
    pub events: Vec<EventKind>,

    /// Events the stage never runs for
    #[serde(default)]
    pub except: Vec<EventKind>,

    /// Require the triggering reference to be a tag
    #[serde(default)]
    pub require_tag: bool,
}

impl Gate {
    /// A gate that matches every trigger
    pub fn always() -> Self {
        Self::default()
    }

    /// Evaluate the gate against a trigger context
    pub fn matches(&self, ctx: &TriggerContext) -> bool {
        if self.except.contains(&ctx.event) {
            return false;
        }
        if !self.events.is_empty() && !self.events.contains(&ctx.event) {
            return false;
        }
        if self.require_tag && !ctx.is_tag {
            return false;
        }
        true
    }
}
