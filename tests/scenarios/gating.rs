//! Test: Gating - stages run or skip depending on the triggering event

use crate::helpers::*;
use shipway::core::{ExecutionStatus, SkipReason};

fn gated_yaml() -> &'static str {
    r#"
name: "Test: Gating"

stages:
  - id: "test"
    steps:
      - run: { commands: ["nox"] }

  - id: "build-dist"
    steps:
      - run: { commands: ["python -m build"] }

  - id: "test-generate-docs"
    when:
      except: [push]
    steps:
      - run: { commands: ["mkdocs build"] }

  - id: "publish-docs"
    depends_on: ["test", "build-dist"]
    when:
      events: [push]
    steps:
      - run: { commands: ["mike deploy"] }
"#
}

/// On a pull request, the docs check runs and publishing is skipped
#[tokio::test]
async fn test_pull_request_checks_docs_but_does_not_publish() {
    let mut pipeline = pipeline_from_yaml(gated_yaml());
    let runner = MockRunner::new();
    let log = runner.log();

    let status = run_pipeline(&mut pipeline, runner, &pull_request("main")).await;

    assert_eq!(status, ExecutionStatus::Succeeded);
    assert_stage_succeeded(&pipeline, "test");
    assert_stage_succeeded(&pipeline, "test-generate-docs");
    assert_stage_skipped(&pipeline, "publish-docs", Some(&SkipReason::GateNotMatched));

    let commands = executed_commands(&log);
    assert!(commands.contains(&"mkdocs build".to_string()));
    assert!(!commands.contains(&"mike deploy".to_string()));
}

/// On a push, publishing runs and the docs check is skipped
#[tokio::test]
async fn test_push_publishes_docs_and_skips_the_check() {
    let mut pipeline = pipeline_from_yaml(gated_yaml());
    let runner = MockRunner::new();
    let log = runner.log();

    let status = run_pipeline(&mut pipeline, runner, &push_to("refs/heads/main", "main")).await;

    assert_eq!(status, ExecutionStatus::Succeeded);
    assert_stage_succeeded(&pipeline, "publish-docs");
    assert_stage_skipped(
        &pipeline,
        "test-generate-docs",
        Some(&SkipReason::GateNotMatched),
    );

    let commands = executed_commands(&log);
    assert!(commands.contains(&"mike deploy".to_string()));
    assert!(!commands.contains(&"mkdocs build".to_string()));
}

/// A merge-group trigger behaves like a pull request for gating purposes
#[tokio::test]
async fn test_merge_group_does_not_publish() {
    let mut pipeline = pipeline_from_yaml(gated_yaml());
    let ctx = shipway::core::TriggerContext::new(
        shipway::core::EventKind::MergeGroup,
        "refs/heads/main",
        "main",
    );

    let status = run_pipeline(&mut pipeline, MockRunner::new(), &ctx).await;

    assert_eq!(status, ExecutionStatus::Succeeded);
    assert_stage_succeeded(&pipeline, "test-generate-docs");
    assert_stage_skipped(&pipeline, "publish-docs", Some(&SkipReason::GateNotMatched));
}

/// A tag-gated stage only runs for tag pushes
#[tokio::test]
async fn test_tag_gate_requires_a_tag_reference() {
    let yaml = r#"
name: "Test: Tag Gate"

stages:
  - id: "create-github-release"
    when:
      events: [push]
      require_tag: true
    steps:
      - run: { commands: ["gh release create"] }
"#;

    // Branch push: skipped
    let mut pipeline = pipeline_from_yaml(yaml);
    run_pipeline(
        &mut pipeline,
        MockRunner::new(),
        &push_to("refs/heads/main", "main"),
    )
    .await;
    assert_stage_skipped(
        &pipeline,
        "create-github-release",
        Some(&SkipReason::GateNotMatched),
    );

    // Tag push: runs
    let mut pipeline = pipeline_from_yaml(yaml);
    run_pipeline(
        &mut pipeline,
        MockRunner::new(),
        &push_to("refs/tags/v1.2.3", "main"),
    )
    .await;
    assert_stage_succeeded(&pipeline, "create-github-release");
}
