//! Test: End-to-end release flows over the full stage graph

use crate::helpers::*;
use shipway::core::{ExecutionStatus, RunState, SkipReason};
use shipway::runner::ShellRunner;

/// The full release pipeline, with commands that assert the contract each
/// stage sees (resolved docs version, pre-release flag, artifact presence)
fn release_yaml() -> &'static str {
    r#"
name: "Test: Release Flow"
default_branch: "v1.x"

stages:
  - id: "test"
    matrix:
      python: ["3.11", "3.12"]
    steps:
      - run: { commands: ["true"] }

  - id: "build-dist"
    steps:
      - run: { commands: ["mkdir -p dist && echo wheel > dist/pkg.whl"] }
      - upload_artifact: { name: dist, path: dist }

  - id: "test-generate-docs"
    when:
      except: [push]
    steps:
      - run: { commands: ["true"] }

  - id: "publish-docs"
    depends_on: ["test", "build-dist"]
    when:
      events: [push]
    steps:
      - resolve_docs_version
      - run:
          commands:
            - "echo \"$DOCS_VERSION\" > resolved && echo \"$DOCS_ALIASES\" >> resolved"
            - "test -n \"$DOCS_VERSION\""

  - id: "create-github-release"
    depends_on: ["publish-docs"]
    when:
      events: [push]
      require_tag: true
    steps:
      - download_artifact: { name: dist }
      - run: { commands: ["test -f dist/pkg.whl"] }

  - id: "publish-to-pypi"
    depends_on: ["create-github-release"]
    steps:
      - download_artifact: { name: dist }
      - run: { commands: ["test -f dist/pkg.whl"] }
"#
}

/// A release tag push runs the whole graph
#[tokio::test]
async fn test_release_tag_push_runs_everything() {
    let mut pipeline = pipeline_from_yaml(release_yaml());
    let status = run_pipeline(
        &mut pipeline,
        ShellRunner::new(),
        &push_to("refs/tags/v1.2.3", "v1.x"),
    )
    .await;

    assert_eq!(status, ExecutionStatus::Succeeded);
    assert_stage_succeeded(&pipeline, "test");
    assert_stage_succeeded(&pipeline, "build-dist");
    assert_stage_succeeded(&pipeline, "publish-docs");
    assert_stage_succeeded(&pipeline, "create-github-release");
    assert_stage_succeeded(&pipeline, "publish-to-pypi");
    assert_stage_skipped(
        &pipeline,
        "test-generate-docs",
        Some(&SkipReason::GateNotMatched),
    );
}

/// The publish-docs stage sees the resolved version for the default branch
#[tokio::test]
async fn test_default_branch_push_publishes_next() {
    let yaml = r#"
name: "Test: Next Version"
default_branch: "v1.x"

stages:
  - id: "publish-docs"
    when:
      events: [push]
    steps:
      - resolve_docs_version
      - run:
          commands:
            - "test \"$DOCS_VERSION\" = \"next\""
            - "test -z \"$DOCS_ALIASES\""
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let status = run_pipeline(
        &mut pipeline,
        ShellRunner::new(),
        &push_to("refs/heads/v1.x", "v1.x"),
    )
    .await;

    assert_eq!(status, ExecutionStatus::Succeeded);
}

/// A release tag exports version and aliases to the publish commands
#[tokio::test]
async fn test_release_tag_exports_version_and_aliases() {
    let yaml = r#"
name: "Test: Tag Version"
default_branch: "v1.x"

stages:
  - id: "publish-docs"
    when:
      events: [push]
    steps:
      - resolve_docs_version
      - run:
          commands:
            - "test \"$DOCS_VERSION\" = \"v1.2\""
            - "test \"$DOCS_ALIASES\" = \"v1 latest\""
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let status = run_pipeline(
        &mut pipeline,
        ShellRunner::new(),
        &push_to("refs/tags/v1.2.3", "v1.x"),
    )
    .await;

    assert_eq!(status, ExecutionStatus::Succeeded);
}

/// A pre-release tag still cuts a (pre-)release but publishes no docs
#[tokio::test]
async fn test_prerelease_tag_skips_docs_but_releases() {
    let mut pipeline = pipeline_from_yaml(release_yaml());
    let status = run_pipeline(
        &mut pipeline,
        ShellRunner::new(),
        &push_to("refs/tags/v1.3.0-rc.1", "v1.x"),
    )
    .await;

    assert_eq!(status, ExecutionStatus::Succeeded);

    // publish-docs ended early, successfully, with a notice
    match &pipeline.stage("publish-docs").unwrap().state {
        RunState::Succeeded { notice, .. } => {
            let notice = notice.as_deref().expect("early exit should leave a notice");
            assert!(notice.contains("v1.3.0-rc.1"), "notice was: {}", notice);
        }
        other => panic!("expected success with notice, got {:?}", other),
    }

    // The dependent release stages still ran
    assert_stage_succeeded(&pipeline, "create-github-release");
    assert_stage_succeeded(&pipeline, "publish-to-pypi");
}

/// The pre-release flag is visible to the release stage
#[tokio::test]
async fn test_prerelease_flag_reaches_the_release_stage() {
    let yaml = r#"
name: "Test: Prerelease Flag"
default_branch: "v1.x"

stages:
  - id: "create-github-release"
    when:
      events: [push]
      require_tag: true
    steps:
      - run: { commands: ["test \"$SHIPWAY_PRERELEASE\" = \"true\""] }
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let status = run_pipeline(
        &mut pipeline,
        ShellRunner::new(),
        &push_to("refs/tags/v2.0.0-beta.1", "v1.x"),
    )
    .await;

    assert_eq!(status, ExecutionStatus::Succeeded);
}

/// A pull request only runs the check stages
#[tokio::test]
async fn test_pull_request_runs_checks_only() {
    let mut pipeline = pipeline_from_yaml(release_yaml());
    let status = run_pipeline(&mut pipeline, ShellRunner::new(), &pull_request("v1.x")).await;

    assert_eq!(status, ExecutionStatus::Succeeded);
    assert_stage_succeeded(&pipeline, "test");
    assert_stage_succeeded(&pipeline, "build-dist");
    assert_stage_succeeded(&pipeline, "test-generate-docs");
    assert_stage_skipped(&pipeline, "publish-docs", Some(&SkipReason::GateNotMatched));
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

/// A branch push to a non-default branch publishes nothing but still succeeds
#[tokio::test]
async fn test_unrecognized_branch_push_is_not_a_failure() {
    let mut pipeline = pipeline_from_yaml(release_yaml());
    let status = run_pipeline(
        &mut pipeline,
        ShellRunner::new(),
        &push_to("refs/heads/experiment", "v1.x"),
    )
    .await;

    // publish-docs ends early with "nothing to publish"; that is a notice,
    // not an error
    assert_eq!(status, ExecutionStatus::Succeeded);
    match &pipeline.stage("publish-docs").unwrap().state {
        RunState::Succeeded { notice: Some(_), .. } => {}
        other => panic!("expected early-exit success, got {:?}", other),
    }
    assert_stage_skipped(&pipeline, "create-github-release", None);
}
