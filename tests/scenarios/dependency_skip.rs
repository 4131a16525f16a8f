//! Test: Dependency propagation - failures skip dependents, skips cascade

use crate::helpers::*;
use shipway::core::{ExecutionStatus, SkipReason};

fn chain_yaml() -> &'static str {
    r#"
name: "Test: Dependency Skip"

stages:
  - id: "test"
    steps:
      - run: { commands: ["nox"] }

  - id: "build-dist"
    steps:
      - run: { commands: ["python -m build"] }

  - id: "publish-docs"
    depends_on: ["test", "build-dist"]
    steps:
      - run: { commands: ["mike deploy"] }

  - id: "create-github-release"
    depends_on: ["publish-docs"]
    steps:
      - run: { commands: ["gh release create"] }

  - id: "publish-to-pypi"
    depends_on: ["create-github-release"]
    steps:
      - run: { commands: ["twine upload"] }
"#
}

/// A failed stage skips its transitive dependents and fails the pipeline
#[tokio::test]
async fn test_failed_dependency_skips_the_rest_of_the_chain() {
    let mut pipeline = pipeline_from_yaml(chain_yaml());
    let runner = MockRunner::new().fail_on("nox");
    let log = runner.log();

    let status = run_pipeline(&mut pipeline, runner, &push_to("refs/heads/main", "main")).await;

    assert_eq!(status, ExecutionStatus::Failed);
    assert_stage_failed(&pipeline, "test");
    assert_stage_skipped(
        &pipeline,
        "publish-docs",
        Some(&SkipReason::DependencyFailed("test".to_string())),
    );
    assert_stage_skipped(
        &pipeline,
        "create-github-release",
        Some(&SkipReason::DependencySkipped("publish-docs".to_string())),
    );
    assert_stage_skipped(
        &pipeline,
        "publish-to-pypi",
        Some(&SkipReason::DependencySkipped(
            "create-github-release".to_string(),
        )),
    );

    // Skipped stages never executed anything
    let commands = executed_commands(&log);
    assert!(!commands.contains(&"mike deploy".to_string()));
    assert!(!commands.contains(&"twine upload".to_string()));
}

/// A failing stage does not abort unrelated stages
#[tokio::test]
async fn test_failure_is_local_to_the_dependency_graph() {
    let mut pipeline = pipeline_from_yaml(chain_yaml());
    let runner = MockRunner::new().fail_on("mike deploy");
    let log = runner.log();

    let status = run_pipeline(&mut pipeline, runner, &push_to("refs/heads/main", "main")).await;

    assert_eq!(status, ExecutionStatus::Failed);
    // The roots are unaffected by the downstream failure
    assert_stage_succeeded(&pipeline, "test");
    assert_stage_succeeded(&pipeline, "build-dist");
    assert_stage_failed(&pipeline, "publish-docs");
    assert_stage_skipped(&pipeline, "create-github-release", None);

    let commands = executed_commands(&log);
    assert!(commands.contains(&"nox".to_string()));
    assert!(commands.contains(&"python -m build".to_string()));
}

/// A gate-skipped stage cascades skips through stages without gates
#[tokio::test]
async fn test_gate_skip_inherited_through_dependencies() {
    let yaml = r#"
name: "Test: Inherited Gate"

stages:
  - id: "create-github-release"
    when:
      events: [push]
      require_tag: true
    steps:
      - run: { commands: ["gh release create"] }

  - id: "publish-to-pypi"
    depends_on: ["create-github-release"]
    steps:
      - run: { commands: ["twine upload"] }
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let status = run_pipeline(
        &mut pipeline,
        MockRunner::new(),
        &push_to("refs/heads/main", "main"),
    )
    .await;

    // Skips do not fail the pipeline
    assert_eq!(status, ExecutionStatus::Succeeded);
    assert_stage_skipped(
        &pipeline,
        "create-github-release",
        Some(&SkipReason::GateNotMatched),
    );
    assert_stage_skipped(
        &pipeline,
        "publish-to-pypi",
        Some(&SkipReason::DependencySkipped(
            "create-github-release".to_string(),
        )),
    );
}
