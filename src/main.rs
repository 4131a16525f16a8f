mod artifacts;
mod cli;
mod core;
mod execution;
mod persistence;
mod runner;
mod versioning;

use crate::cli::commands::{HistoryCommand, ListCommand, ResolveCommand, RunCommand, ValidateCommand};
use crate::cli::output::*;
use crate::cli::{Cli, Command};
use crate::core::{EventKind, ExecutionStatus, TriggerContext};
use crate::execution::{ExecutionEngine, ExecutionEvent};
use crate::persistence::{create_summary, PersistenceBackend, RunSummary};
use crate::runner::ShellRunner;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;
use crate::versioning::VersionResolver;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Resolve(cmd) => resolve_version(cmd)?,
        Command::List(cmd) => list_pipelines(cmd).await?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

/// Open the default history store
async fn history_store() -> Result<Arc<dyn PersistenceBackend>> {
    #[cfg(feature = "sqlite")]
    {
        Ok(Arc::new(crate::persistence::SqliteRunStore::with_default_path().await?))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Ok(Arc::new(crate::persistence::InMemoryPersistence::new()))
    }
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    // Load pipeline config
    let config = crate::core::config::PipelineConfig::from_file(&cmd.file)
        .context("Failed to load pipeline config")?;

    println!("{} Loaded pipeline: {}", INFO, style(&config.name).bold());

    let default_branch = cmd
        .default_branch
        .clone()
        .unwrap_or_else(|| config.default_branch.clone());
    let ctx = TriggerContext::new(cmd.event.into(), cmd.git_ref.clone(), default_branch);

    println!(
        "{} Trigger: {} on {}",
        INFO,
        style(ctx.event).cyan(),
        style(&ctx.git_ref).dim()
    );

    let mut pipeline = config.to_pipeline();

    // Set up persistence
    let store: Option<Arc<dyn PersistenceBackend>> = if cmd.no_history {
        None
    } else {
        Some(history_store().await?)
    };

    let resolver = VersionResolver::new(&config.versioning)
        .context("Invalid versioning configuration")?;
    let artifacts = Arc::new(crate::artifacts::ArtifactStore::new()?);

    let mut engine = ExecutionEngine::new(ShellRunner::new(), resolver, Arc::clone(&artifacts));

    // Console output for execution events, threaded through the progress bar
    let progress = create_progress_bar(pipeline.stages.len());
    let pb = progress.clone();
    engine.add_event_handler(move |event| {
        pb.println(format_execution_event(&event));
        if matches!(
            event,
            ExecutionEvent::StageCompleted { .. }
                | ExecutionEvent::StageFailed { .. }
                | ExecutionEvent::StageSkipped { .. }
        ) {
            pb.inc(1);
        }
    });

    // Execute pipeline
    println!();
    let status = engine.execute(&mut pipeline, &ctx).await?;
    progress.finish_and_clear();

    if let Err(e) = artifacts.cleanup() {
        warn!("Failed to clean up artifact store: {}", e);
    }

    // Save to history
    if let Some(store) = store {
        let summary = create_summary(&pipeline, &ctx);
        store.save_run(&summary).await?;
        println!(
            "\n{} Run saved to history (ID: {})",
            INFO,
            style(&summary.run_id.to_string()[..8]).dim()
        );
    }

    // Print final status
    if status == ExecutionStatus::Succeeded {
        println!(
            "\n{} {} completed {}",
            CHECK,
            style(&pipeline.name).bold(),
            style("successfully").green()
        );
    } else {
        println!(
            "\n{} {} {}",
            CROSS,
            style(&pipeline.name).bold(),
            style("failed").red()
        );
        std::process::exit(1);
    }

    Ok(())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    let result = crate::core::config::PipelineConfig::from_file(&cmd.file);

    match result {
        Ok(config) => {
            println!("{} Pipeline definition is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Stages: {}", style(config.stages.len()).cyan());
            println!(
                "  Default branch: {}",
                style(&config.default_branch).cyan()
            );

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn resolve_version(cmd: &ResolveCommand) -> Result<()> {
    let config = match &cmd.file {
        Some(file) => crate::core::config::PipelineConfig::from_file(file)
            .context("Failed to load pipeline config")?,
        None => crate::core::config::PipelineConfig::from_yaml("name: adhoc\nstages: []")?,
    };

    let default_branch = cmd
        .default_branch
        .clone()
        .unwrap_or_else(|| config.default_branch.clone());
    let ctx = TriggerContext::new(EventKind::Push, cmd.git_ref.clone(), default_branch);

    let resolver = VersionResolver::new(&config.versioning)
        .context("Invalid versioning configuration")?;
    let decision = resolver.resolve(&ctx);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    if decision.publish {
        println!(
            "{} {} publishes documentation as {}",
            CHECK,
            style(&ctx.ref_name).cyan(),
            style(decision.version.as_deref().unwrap_or("?")).bold()
        );
        if !decision.aliases.is_empty() {
            println!("  Aliases: {}", style(decision.aliases.join(", ")).cyan());
        }
    } else {
        println!(
            "{} {} does not publish documentation",
            WARN,
            style(&ctx.ref_name).cyan()
        );
    }

    Ok(())
}

async fn list_pipelines(cmd: &ListCommand) -> Result<()> {
    let store = history_store().await?;
    let pipelines = store.list_pipelines().await?;

    if pipelines.is_empty() {
        println!("{} No pipelines found in history", INFO);
        return Ok(());
    }

    println!("{} Pipelines in history:", INFO);

    for pipeline_name in &pipelines {
        let runs = store.list_runs(pipeline_name).await?;

        if cmd.with_counts {
            let succeeded = runs
                .iter()
                .filter(|r| r.status == ExecutionStatus::Succeeded)
                .count();
            let failed = runs
                .iter()
                .filter(|r| r.status == ExecutionStatus::Failed)
                .count();
            println!(
                "  {} ({} runs: {} succeeded, {} failed)",
                style(pipeline_name).bold(),
                style(runs.len()).cyan(),
                style(succeeded).green(),
                style(failed).red()
            );
        } else {
            println!("  {}", style(pipeline_name).bold());
        }
    }

    if cmd.json {
        let mut json_data = Vec::new();
        for pipeline in &pipelines {
            let runs = store.list_runs(pipeline).await.ok();
            json_data.push(serde_json::json!({
                "name": pipeline,
                "run_count": runs.as_ref().map(|r| r.len()).unwrap_or(0)
            }));
        }
        let data = serde_json::json!({ "pipelines": json_data });
        println!("\n{}", serde_json::to_string_pretty(&data)?);
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = history_store().await?;

    // If a specific run ID is requested
    if let Some(run_id_str) = &cmd.run_id {
        let run_id = uuid::Uuid::parse_str(run_id_str).context("Invalid run ID format")?;
        let summary = store.load_run(run_id).await?;

        match summary {
            Some(summary) => {
                print_run_details(&summary, cmd.verbose)?;
            }
            None => {
                println!("{} Run not found", WARN);
            }
        }
        return Ok(());
    }

    // List runs for pipeline or all
    let runs = if let Some(pipeline_name) = &cmd.pipeline {
        store.list_runs(pipeline_name).await?
    } else {
        let pipelines = store.list_pipelines().await?;
        let mut all_runs = Vec::new();
        for pipeline in &pipelines {
            all_runs.extend(store.list_runs(pipeline).await?);
        }
        // Sort by started_at descending
        all_runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all_runs.into_iter().take(cmd.limit).collect()
    };

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, cmd.limit);

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        for summary in &runs {
            println!("  {}", format_run_summary(summary));
        }
    }

    Ok(())
}

fn print_run_details(summary: &RunSummary, verbose: bool) -> Result<()> {
    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.run_id).cyan());
    println!("  Pipeline: {}", style(&summary.pipeline_name).bold());
    println!(
        "  Trigger: {} on {}",
        style(summary.event).cyan(),
        style(&summary.ref_name).dim()
    );
    println!("  Status: {}", format_status(summary.status));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }
    println!(
        "  Stages: {} ok, {} failed, {} skipped ({} total)",
        style(summary.succeeded_stages).green(),
        style(summary.failed_stages).red(),
        style(summary.skipped_stages).dim(),
        summary.total_stages
    );

    if verbose {
        println!("\n  {}", style("Full details:").bold());
        let json = serde_json::to_string_pretty(summary)?;
        for line in json.lines() {
            println!("    {}", line);
        }
    }

    Ok(())
}
