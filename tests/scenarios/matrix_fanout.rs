//! Test: Matrix fan-out - one run per tuple, no fail-fast

use crate::helpers::*;
use shipway::core::{ExecutionStatus, RunState};

fn matrix_yaml() -> &'static str {
    r#"
name: "Test: Matrix"

stages:
  - id: "test"
    matrix:
      os: [ubuntu, macos]
      python: ["3.11", "3.12"]
    steps:
      - run: { commands: ["nox"] }

  - id: "build-dist"
    depends_on: ["test"]
    steps:
      - run: { commands: ["python -m build"] }
"#
}

/// Each matrix tuple runs once with its parameters in the environment
#[tokio::test]
async fn test_every_tuple_runs_with_its_parameters() {
    let mut pipeline = pipeline_from_yaml(matrix_yaml());
    let runner = MockRunner::new();
    let log = runner.log();

    let status = run_pipeline(&mut pipeline, runner, &push_to("refs/heads/main", "main")).await;

    assert_eq!(status, ExecutionStatus::Succeeded);

    let executed = log.lock().unwrap();
    let tuples: Vec<(String, String)> = executed
        .iter()
        .filter(|e| e.command == "nox")
        .map(|e| {
            (
                e.env.get("MATRIX_OS").cloned().unwrap_or_default(),
                e.env.get("MATRIX_PYTHON").cloned().unwrap_or_default(),
            )
        })
        .collect();

    assert_eq!(tuples.len(), 4);
    for os in ["ubuntu", "macos"] {
        for python in ["3.11", "3.12"] {
            assert!(
                tuples.contains(&(os.to_string(), python.to_string())),
                "missing tuple ({}, {})",
                os,
                python
            );
        }
    }
}

/// One failing tuple fails the stage, but all tuples still run to completion
#[tokio::test]
async fn test_no_fail_fast_across_tuples() {
    let mut pipeline = pipeline_from_yaml(matrix_yaml());
    // Only the macos/3.12 tuple fails
    let runner = MockRunner::new()
        .fail_when_env("MATRIX_OS", "macos")
        .fail_when_env("MATRIX_PYTHON", "3.12");
    let log = runner.log();

    let status = run_pipeline(&mut pipeline, runner, &push_to("refs/heads/main", "main")).await;

    assert_eq!(status, ExecutionStatus::Failed);
    assert_stage_failed(&pipeline, "test");
    assert_stage_skipped(&pipeline, "build-dist", None);

    // All four tuples executed despite the failure
    let executed = log.lock().unwrap();
    assert_eq!(executed.iter().filter(|e| e.command == "nox").count(), 4);

    // Per-run states reflect the single failing tuple
    let stage = pipeline.stage("test").unwrap();
    let failed_runs = stage
        .runs
        .iter()
        .filter(|r| matches!(r.state, RunState::Failed { .. }))
        .count();
    let succeeded_runs = stage
        .runs
        .iter()
        .filter(|r| matches!(r.state, RunState::Succeeded { .. }))
        .count();
    assert_eq!(failed_runs, 1);
    assert_eq!(succeeded_runs, 3);
}
