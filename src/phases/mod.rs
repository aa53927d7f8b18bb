//! The build pipeline.
//!
//! ## Overview
//!
//! A build is an explicit directed acyclic pipeline:
//!
//! 1. **Flags** - the `FlagSet` is resolved into a `FeatureSet`.
//! 2. **Leaf computations** - dependency planning, tags generation and
//!    manifest composition run in parallel. They read only the `FeatureSet`
//!    and the project descriptor, and they all join before anything else
//!    happens.
//! 3. **Resolution** - every planned declaration is matched to a file.
//! 4. **Assembly** - resources are expanded and rewritten, access
//!    transformers registered, and the archive tree staged.
//! 5. **Writing** - archives, generated sources and reports are written to
//!    disk on a single thread.
//!
//! See [`orchestrator`] for the entry points and [`write`] for the disk
//! writers.

use std::path::{Path, PathBuf};

use crate::config::Layout;

pub mod orchestrator;
pub mod write;

/// Absolute locations of a build's inputs and outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    pub project_dir: PathBuf,
    pub classes: PathBuf,
    pub resources: PathBuf,
    pub sources: PathBuf,
    pub build_dir: PathBuf,
    /// Where archives are written
    pub libs: PathBuf,
    /// Root of the generated tags source tree
    pub generated_sources: PathBuf,
    /// Where JSON reports for the external toolchain are written
    pub reports: PathBuf,
}

impl BuildPaths {
    pub fn new(project_dir: &Path, layout: &Layout) -> Self {
        let build_dir = project_dir.join(&layout.build_dir);
        Self {
            project_dir: project_dir.to_path_buf(),
            classes: project_dir.join(&layout.classes),
            resources: project_dir.join(&layout.resources),
            sources: project_dir.join(&layout.sources),
            libs: build_dir.join("libs"),
            generated_sources: build_dir
                .join("generated")
                .join("sources")
                .join("injectTags"),
            reports: build_dir.join("mod-composer"),
            build_dir,
        }
    }

    pub fn access_transformer_report(&self) -> PathBuf {
        self.reports.join("access-transformers.json")
    }

    pub fn dependency_report(&self) -> PathBuf {
        self.reports.join("dependencies.json")
    }
}
