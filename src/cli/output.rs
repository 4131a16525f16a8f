//! CLI output formatting

use crate::{
    core::{ExecutionStatus, RunState},
    execution::ExecutionEvent,
    persistence::RunSummary,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over the pipeline's stages
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a stage state for display
pub fn format_stage_state(state: &RunState) -> String {
    match state {
        RunState::Pending => style("PENDING").dim().to_string(),
        RunState::Running { .. } => style("RUNNING").yellow().to_string(),
        RunState::Succeeded { .. } => style("SUCCEEDED").green().to_string(),
        RunState::Failed { .. } => style("FAILED").red().to_string(),
        RunState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a run summary for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        ExecutionStatus::Succeeded => CHECK,
        ExecutionStatus::Failed => CROSS,
        ExecutionStatus::Running => SPINNER,
        ExecutionStatus::Pending => INFO,
    };

    format!(
        "{} {} - {} - {} on {} - {} ({} ok, {} failed, {} skipped)",
        status_icon,
        style(&summary.run_id.to_string()[..8]).dim(),
        style(&summary.pipeline_name).bold(),
        summary.event,
        style(&summary.ref_name).cyan(),
        format_status(summary.status),
        summary.succeeded_stages,
        summary.failed_stages,
        summary.skipped_stages,
    )
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            run_id,
            pipeline_name,
        } => format!(
            "{} Starting pipeline {} ({})",
            ROCKET,
            style(pipeline_name).bold(),
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StageStarted { stage_id, runs } => {
            if *runs > 1 {
                format!(
                    "{} {} ({} matrix runs)",
                    SPINNER,
                    style(stage_id).cyan(),
                    style(runs).dim()
                )
            } else {
                format!("{} {}", SPINNER, style(stage_id).cyan())
            }
        }
        ExecutionEvent::StageRunCompleted {
            stage_id, label, ..
        } => {
            if label.is_empty() {
                format!("{} {}", CHECK, style(stage_id).green())
            } else {
                format!(
                    "{} {} [{}]",
                    CHECK,
                    style(stage_id).green(),
                    style(label).dim()
                )
            }
        }
        ExecutionEvent::StageRunFailed {
            stage_id,
            label,
            error,
        } => {
            if label.is_empty() {
                format!("{} {}: {}", CROSS, style(stage_id).red(), style(error).dim())
            } else {
                format!(
                    "{} {} [{}]: {}",
                    CROSS,
                    style(stage_id).red(),
                    style(label).dim(),
                    style(error).dim()
                )
            }
        }
        ExecutionEvent::StageCompleted { stage_id, notice } => match notice {
            Some(notice) => format!(
                "{} {} ({})",
                CHECK,
                style(stage_id).green(),
                style(notice).dim()
            ),
            None => format!("{} {} done", CHECK, style(stage_id).green()),
        },
        ExecutionEvent::StageFailed { stage_id, error } => {
            format!("{} {}: {}", CROSS, style(stage_id).red(), style(error).dim())
        }
        ExecutionEvent::StageSkipped { stage_id, reason } => format!(
            "{} {} skipped ({})",
            SKIP,
            style(stage_id).dim(),
            style(reason).dim()
        ),
        ExecutionEvent::PipelineCompleted { status, .. } => match status {
            ExecutionStatus::Succeeded => {
                format!("{} Pipeline {}", CHECK, style("succeeded").green())
            }
            _ => format!("{} Pipeline {}", CROSS, style("failed").red()),
        },
    }
}

/// Format a duration for display
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
