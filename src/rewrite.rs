//! Resource rewrite rules
//!
//! A rule is a regex over the `/`-separated archive path plus a destination
//! template that may reference capture groups (`$1`, `$2`, ...). A
//! [`RuleSet`] is an ordered list of rules evaluated against a snapshot of the
//! resource inventory: for every path the first matching rule decides the
//! destination, and paths that a rule maps onto themselves are left alone.
//! That last property is what makes applying a rule set twice a no-op.

use crate::error::Result;
use crate::filesystem::MemoryFS;
use crate::flags::FeatureSet;
use crate::path::{regex_rename, to_archive_path};
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

/// Any file whose name ends in `_at.cfg`, in any directory, any case.
pub const ACCESS_TRANSFORMER_PATTERN: &str = r"(?i)^(?:.*/)?([^/]*_at\.cfg)$";
/// Access transformers live directly under `META-INF/`.
pub const ACCESS_TRANSFORMER_DESTINATION: &str = "META-INF/$1";

/// A single regex-driven relocation
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub name: String,
    pattern: Regex,
    destination: String,
}

impl RewriteRule {
    pub fn new(name: impl Into<String>, pattern: &str, destination: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            destination: destination.into(),
        })
    }

    /// The rule relocating access transformer files into `META-INF/`.
    pub fn access_transformers() -> Result<Self> {
        Self::new(
            "access-transformers",
            ACCESS_TRANSFORMER_PATTERN,
            ACCESS_TRANSFORMER_DESTINATION,
        )
    }

    pub fn matches(&self, archive_path: &str) -> bool {
        self.pattern.is_match(archive_path)
    }

    /// Destination for `archive_path`, or `None` if the rule does not match.
    pub fn target(&self, archive_path: &str) -> Option<String> {
        regex_rename(&self.pattern, &self.destination, archive_path)
    }
}

/// One planned relocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
    pub rule: String,
}

/// Ordered list of rewrite rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rules a build with `features` applies to its resources. The
    /// access transformer rule is only present when that feature is on.
    pub fn for_features(features: &FeatureSet) -> Result<Self> {
        let mut rules = Self::new();
        if features.access_transformer {
            rules.push(RewriteRule::access_transformers()?);
        }
        Ok(rules)
    }

    pub fn push(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Compute the renames for an inventory snapshot without touching it.
    pub fn plan(&self, inventory: &[PathBuf]) -> Vec<Rename> {
        let mut renames = Vec::new();
        for path in inventory {
            let archive_path = to_archive_path(path);
            let Some(rule) = self.rules.iter().find(|r| r.matches(&archive_path)) else {
                continue;
            };
            let Some(target) = rule.target(&archive_path) else {
                continue;
            };
            if target == archive_path {
                continue;
            }
            renames.push(Rename {
                from: path.clone(),
                to: PathBuf::from(target),
                rule: rule.name.clone(),
            });
        }
        renames
    }

    /// Plan against the current contents of `fs` and perform the renames.
    /// When two sources land on the same destination the later one (in path
    /// order) wins.
    pub fn apply(&self, fs: &mut MemoryFS) -> Result<Vec<Rename>> {
        if self.rules.is_empty() {
            return Ok(Vec::new());
        }
        let renames = self.plan(&fs.list_files());
        for rename in &renames {
            if fs.exists(&rename.to) {
                log::warn!(
                    "Rewrite of {} replaces existing {}",
                    rename.from.display(),
                    rename.to.display()
                );
            }
            log::debug!(
                "Rewriting {} -> {} ({})",
                rename.from.display(),
                rename.to.display(),
                rename.rule
            );
            fs.rename_file(&rename.from, &rename.to)?;
        }
        Ok(renames)
    }
}
