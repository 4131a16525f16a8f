//! Pipeline configuration from YAML

use crate::core::gate::Gate;
use crate::core::step::StepSpec;
use crate::core::Pipeline;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Pipeline version (optional)
    #[serde(default)]
    pub version: Option<String>,

    /// The repository's default branch
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Documentation versioning rules
    #[serde(default)]
    pub versioning: VersioningConfig,

    /// Pipeline stages
    pub stages: Vec<StageConfig>,

    /// Default wall-clock timeout per stage run (in seconds)
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,
}

/// Stage configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Unique stage identifier
    pub id: String,

    /// Optional stage description
    #[serde(default)]
    pub description: Option<String>,

    /// Stage IDs this stage depends on
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Gating condition; absent means the stage always runs
    #[serde(default)]
    pub when: Gate,

    /// Matrix parameters; the stage fans out into one run per combination
    #[serde(default)]
    pub matrix: Option<BTreeMap<String, Vec<String>>>,

    /// Ordered steps
    #[serde(default)]
    pub steps: Vec<StepSpec>,

    /// Timeout for this stage (overrides the pipeline default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Rules for deriving documentation versions from git references
///
/// Branch and tag naming conventions are configuration, not hard-coded
/// strings: the resolver takes everything it needs from here and from the
/// trigger context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Pattern a qualifying release tag must match at the start of its name.
    /// Capture groups: 1 = optional "v" prefix, 2 = major, 3 = minor.
    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,

    /// Version label for builds of the default branch
    #[serde(default = "default_dev_version")]
    pub dev_version: String,

    /// Alias added when a tag belongs to the default branch's major line
    #[serde(default = "default_latest_alias")]
    pub latest_alias: String,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            tag_pattern: default_tag_pattern(),
            dev_version: default_dev_version(),
            latest_alias: default_latest_alias(),
        }
    }
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_tag_pattern() -> String {
    r"^(v?)(\d+)\.(\d+)\.".to_string()
}

fn default_dev_version() -> String {
    "next".to_string()
}

fn default_latest_alias() -> String {
    "latest".to_string()
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        // Check that all stage IDs are unique
        let mut seen_ids = std::collections::HashSet::new();
        for stage in &self.stages {
            if !seen_ids.insert(&stage.id) {
                anyhow::bail!("Duplicate stage ID: {}", stage.id);
            }
        }

        // Check that all dependencies reference existing stages
        let stage_ids: std::collections::HashSet<_> = self.stages.iter().map(|s| &s.id).collect();
        for stage in &self.stages {
            for dep in &stage.depends_on {
                if !stage_ids.contains(dep) {
                    anyhow::bail!("Stage '{}' depends on non-existent stage '{}'", stage.id, dep);
                }
                if dep == &stage.id {
                    anyhow::bail!("Stage '{}' depends on itself", stage.id);
                }
            }

            // Matrix axes must have at least one value
            if let Some(matrix) = &stage.matrix {
                for (key, values) in matrix {
                    if values.is_empty() {
                        anyhow::bail!(
                            "Stage '{}' matrix axis '{}' has no values",
                            stage.id,
                            key
                        );
                    }
                }
            }

            // Artifact step names must be non-empty
            for step in &stage.steps {
                match step {
                    StepSpec::UploadArtifact { name, .. }
                    | StepSpec::DownloadArtifact { name, .. }
                        if name.is_empty() =>
                    {
                        anyhow::bail!("Stage '{}' has an artifact step with an empty name", stage.id);
                    }
                    _ => {}
                }
            }
        }

        // The tag pattern must compile and carry the expected capture groups
        let pattern = regex::Regex::new(&self.versioning.tag_pattern)
            .map_err(|e| anyhow::anyhow!("Invalid versioning tag_pattern: {}", e))?;
        if pattern.captures_len() < 4 {
            anyhow::bail!(
                "versioning tag_pattern needs capture groups for prefix, major and minor"
            );
        }

        // Check for cycles in the dependency graph
        self.check_cycles()?;

        Ok(())
    }

    /// Check for cycles in the stage dependency graph
    fn check_cycles(&self) -> Result<()> {
        let mut visited = std::collections::HashSet::new();
        let mut recursion_stack = std::collections::HashSet::new();

        for stage in &self.stages {
            if !visited.contains(&stage.id) {
                self.dfs_check(&stage.id, &mut visited, &mut recursion_stack)?;
            }
        }

        Ok(())
    }

    fn dfs_check(
        &self,
        stage_id: &str,
        visited: &mut std::collections::HashSet<String>,
        recursion_stack: &mut std::collections::HashSet<String>,
    ) -> Result<()> {
        visited.insert(stage_id.to_string());
        recursion_stack.insert(stage_id.to_string());

        if let Some(stage) = self.stages.iter().find(|s| s.id == stage_id) {
            for dep in &stage.depends_on {
                if recursion_stack.contains(dep) {
                    anyhow::bail!("Cycle detected in dependency graph involving stage '{}'", dep);
                }
                if !visited.contains(dep) {
                    self.dfs_check(dep, visited, recursion_stack)?;
                }
            }
        }

        recursion_stack.remove(stage_id);
        Ok(())
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline::from_config(self)
    }
}
