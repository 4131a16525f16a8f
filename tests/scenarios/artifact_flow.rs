//! Test: Artifact flow - write-once handoff between stages

use crate::helpers::*;
use shipway::core::{ExecutionStatus, RunState};
use shipway::runner::ShellRunner;

/// A produced artifact is consumable by every dependent stage
#[tokio::test]
async fn test_artifact_travels_from_producer_to_consumers() {
    let yaml = r#"
name: "Test: Artifact Handoff"

stages:
  - id: "build-dist"
    steps:
      - run:
          commands:
            - "mkdir -p dist && echo wheel > dist/pkg-1.0.whl"
      - upload_artifact: { name: dist, path: dist }

  - id: "create-github-release"
    depends_on: ["build-dist"]
    steps:
      - download_artifact: { name: dist }
      - run: { commands: ["test -f dist/pkg-1.0.whl"] }

  - id: "publish-to-pypi"
    depends_on: ["build-dist"]
    steps:
      - download_artifact: { name: dist, dest: incoming }
      - run: { commands: ["test -f incoming/pkg-1.0.whl"] }
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let status = run_pipeline(
        &mut pipeline,
        ShellRunner::new(),
        &push_to("refs/heads/main", "main"),
    )
    .await;

    assert_eq!(status, ExecutionStatus::Succeeded);
    assert_stage_succeeded(&pipeline, "build-dist");
    assert_stage_succeeded(&pipeline, "create-github-release");
    assert_stage_succeeded(&pipeline, "publish-to-pypi");
}

/// Publishing the same artifact name twice fails the second producer
#[tokio::test]
async fn test_second_put_of_same_name_fails() {
    let yaml = r#"
name: "Test: Duplicate Artifact"

stages:
  - id: "build-dist"
    steps:
      - run: { commands: ["mkdir -p dist && touch dist/a"] }
      - upload_artifact: { name: dist, path: dist }

  - id: "rebuild-dist"
    depends_on: ["build-dist"]
    steps:
      - run: { commands: ["mkdir -p dist && touch dist/b"] }
      - upload_artifact: { name: dist, path: dist }
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let status = run_pipeline(
        &mut pipeline,
        ShellRunner::new(),
        &push_to("refs/heads/main", "main"),
    )
    .await;

    assert_eq!(status, ExecutionStatus::Failed);
    assert_stage_succeeded(&pipeline, "build-dist");
    assert_stage_failed(&pipeline, "rebuild-dist");

    match &pipeline.stage("rebuild-dist").unwrap().state {
        RunState::Failed { error, .. } => {
            assert!(error.contains("already exists"), "error was: {}", error);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

/// Requesting an artifact nobody produced fails immediately
#[tokio::test]
async fn test_download_of_unproduced_artifact_fails() {
    let yaml = r#"
name: "Test: Missing Artifact"

stages:
  - id: "publish-to-pypi"
    steps:
      - download_artifact: { name: dist }
      - run: { commands: ["twine upload dist/*"] }
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let status = run_pipeline(
        &mut pipeline,
        ShellRunner::new(),
        &push_to("refs/heads/main", "main"),
    )
    .await;

    assert_eq!(status, ExecutionStatus::Failed);
    match &pipeline.stage("publish-to-pypi").unwrap().state {
        RunState::Failed { error, .. } => {
            assert!(error.contains("not found"), "error was: {}", error);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}
