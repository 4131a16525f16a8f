//! Documentation version resolution
//!
//! Maps the triggering git reference to the version label and aliases the
//! documentation site publisher should deploy under. Pure derivation: the
//! same trigger context always yields the same decision.

use crate::core::config::VersioningConfig;
use crate::core::context::TriggerContext;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// The outcome of resolving a reference against the versioning rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDecision {
    /// Version label to publish under, when publishing applies
    pub version: Option<String>,

    /// Additional labels the version is also made available under
    pub aliases: Vec<String>,

    /// Whether documentation should be published at all
    pub publish: bool,
}

impl VersionDecision {
    fn skip() -> Self {
        Self {
            version: None,
            aliases: vec![],
            publish: false,
        }
    }
}

/// Resolves git references to documentation versions
#[derive(Debug, Clone)]
pub struct VersionResolver {
    tag_pattern: Regex,
    major_pattern: Regex,
    dev_version: String,
    latest_alias: String,
}

impl VersionResolver {
    /// Build a resolver from the pipeline's versioning rules
    ///
    /// Fails if the configured tag pattern is not a valid regex.
    pub fn new(config: &VersioningConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            tag_pattern: Regex::new(&config.tag_pattern)?,
            major_pattern: Regex::new(r"^(v?)(\d+)")?,
            dev_version: config.dev_version.clone(),
            latest_alias: config.latest_alias.clone(),
        })
    }

    /// Derive the version decision for a trigger context
    ///
    /// - The default branch publishes under the dev version label.
    /// - A release tag publishes under "MAJOR.MINOR" (keeping the tag's own
    ///   "v" prefix, if any) aliased with its major line, plus the latest
    ///   alias when that major line is the default branch's.
    /// - A pre-release tag (hyphen in the name) publishes nothing; that is a
    ///   notice, not an error.
    /// - Anything else publishes nothing, with a warning. Unrecognized refs
    ///   must not block pushes, so this is never a failure.
    pub fn resolve(&self, ctx: &TriggerContext) -> VersionDecision {
        if ctx.ref_name == ctx.default_branch {
            return VersionDecision {
                version: Some(self.dev_version.clone()),
                aliases: vec![],
                publish: true,
            };
        }

        if ctx.is_tag {
            if let Some(caps) = self.tag_pattern.captures(&ctx.ref_name) {
                if ctx.ref_name.contains('-') {
                    info!(
                        tag = %ctx.ref_name,
                        "pre-release tag, documentation will not be published"
                    );
                    return VersionDecision::skip();
                }

                let prefix = caps.get(1).map_or("", |m| m.as_str());
                let major = caps.get(2).map_or("", |m| m.as_str());
                let minor = caps.get(3).map_or("", |m| m.as_str());

                let version = format!("{}{}.{}", prefix, major, minor);
                let major_label = format!("{}{}", prefix, major);

                let mut aliases = vec![major_label.clone()];
                if self.extract_major(&ctx.default_branch).as_deref() == Some(&major_label) {
                    aliases.push(self.latest_alias.clone());
                }

                return VersionDecision {
                    version: Some(version),
                    aliases,
                    publish: true,
                };
            }
        }

        warn!(
            git_ref = %ctx.ref_name,
            "reference matches no documentation publishing rule"
        );
        VersionDecision::skip()
    }

    /// Major line of a branch or tag name, e.g. "v1.x" -> "v1", "2.0.0" -> "2"
    fn extract_major(&self, name: &str) -> Option<String> {
        self.major_pattern.captures(name).map(|caps| {
            format!(
                "{}{}",
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str())
            )
        })
    }
}
