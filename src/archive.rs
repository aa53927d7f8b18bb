//! # Archive Assembly
//!
//! Everything that decides what goes into the output jar, short of writing
//! it (see [`crate::phases::write`]):
//!
//! - access transformer discovery, and the registry handing every discovered
//!   file to both binary-transform stages of the external toolchain
//! - the archive file names
//! - merging classes, processed resources, embedded artifacts and the
//!   manifest into one staged tree
//!
//! ## Merge order
//!
//! Layers are merged in a fixed order and the last writer wins:
//!
//! 1. compiled classes
//! 2. processed resources
//! 3. each `Embed` artifact, in declaration order (directories as trees,
//!    jar/zip files expanded)
//! 4. the generated manifest
//!
//! Any path written by more than one layer with different content is logged
//! at `warn` level, except `META-INF/MANIFEST.MF` which the generated
//! manifest always replaces.

use crate::dependencies::Scope;
use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;
use crate::flags::FeatureSet;
use crate::manifest::{Manifest, MANIFEST_PATH};
use crate::path::to_archive_path;
use crate::repository::ResolvedArtifact;
use crate::rewrite::RewriteRule;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Downstream stages that consume access transformers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Stage {
    #[serde(rename = "deobfuscateMergedJarToSrg")]
    DeobfuscateMergedJarToSrg,
    #[serde(rename = "srgifyBinpatchedJar")]
    SrgifyBinpatchedJar,
}

impl Stage {
    pub const ALL: [Stage; 2] = [Stage::DeobfuscateMergedJarToSrg, Stage::SrgifyBinpatchedJar];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::DeobfuscateMergedJarToSrg => "deobfuscateMergedJarToSrg",
            Stage::SrgifyBinpatchedJar => "srgifyBinpatchedJar",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Access transformer inputs per stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessTransformerRegistry {
    stages: BTreeMap<Stage, Vec<PathBuf>>,
}

impl Default for AccessTransformerRegistry {
    fn default() -> Self {
        Self {
            stages: Stage::ALL.iter().map(|s| (*s, Vec::new())).collect(),
        }
    }
}

impl AccessTransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file` with every stage.
    pub fn register(&mut self, file: PathBuf) {
        for files in self.stages.values_mut() {
            if !files.contains(&file) {
                files.push(file.clone());
            }
        }
    }

    pub fn files(&self, stage: Stage) -> &[PathBuf] {
        self.stages.get(&stage).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.values().all(Vec::is_empty)
    }

    /// Fail unless every stage sees exactly the same files.
    pub fn verify(&self) -> Result<()> {
        let reference = self.files(Stage::DeobfuscateMergedJarToSrg);
        for stage in Stage::ALL {
            let files = self.files(stage);
            if files != reference {
                let missing = reference
                    .iter()
                    .chain(files)
                    .find(|f| !(reference.contains(f) && files.contains(f)))
                    .cloned()
                    .unwrap_or_default();
                return Err(Error::ArchiveAssembly {
                    path: missing,
                    message: format!(
                        "access transformer registered with {} but not every stage",
                        stage
                    ),
                });
            }
        }
        Ok(())
    }

    #[cfg(test)]
    fn register_single(&mut self, stage: Stage, file: PathBuf) {
        self.stages.entry(stage).or_default().push(file);
    }
}

/// Find every access transformer under `resources_dir` and register it with
/// both stages. Returns an empty registry when the feature is off.
pub fn discover_access_transformers(
    features: &FeatureSet,
    resources_dir: &Path,
) -> Result<AccessTransformerRegistry> {
    let mut registry = AccessTransformerRegistry::new();
    if !features.access_transformer || !resources_dir.is_dir() {
        return Ok(registry);
    }

    let rule = RewriteRule::access_transformers()?;
    for entry in WalkDir::new(resources_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(resources_dir)
            .unwrap_or(entry.path());
        if rule.matches(&to_archive_path(relative)) {
            log::debug!("Found access transformer {}", entry.path().display());
            registry.register(entry.path().to_path_buf());
        }
    }

    registry.verify()?;
    Ok(registry)
}

/// `<archives_base_name>-<mc_version>-<mod_version>.jar`
pub fn archive_name(features: &FeatureSet) -> String {
    format!(
        "{}-{}-{}.jar",
        features.archives_base_name, features.mc_version, features.mod_version
    )
}

/// Name of the companion sources jar.
pub fn sources_archive_name(features: &FeatureSet) -> String {
    format!(
        "{}-{}-{}-sources.jar",
        features.archives_base_name, features.mc_version, features.mod_version
    )
}

fn merge_layer(target: &mut MemoryFS, layer: &MemoryFS, label: &str) {
    for path in target.merge(layer) {
        log::warn!("{} overwrites {}", label, path.display());
    }
}

/// Load the contents of one embedded artifact.
pub fn load_embedded(artifact: &ResolvedArtifact) -> Result<MemoryFS> {
    let path = &artifact.path;
    let contents = if path.is_dir() {
        MemoryFS::from_dir(path)
    } else {
        MemoryFS::from_archive(path)
    };
    contents.map_err(|e| Error::ArchiveAssembly {
        path: path.clone(),
        message: format!("cannot merge embedded artifact: {}", e),
    })
}

/// Stage the full archive tree. `resolved` is the whole resolution result;
/// only `Embed` declarations contribute content.
pub fn assemble(
    classes: &MemoryFS,
    resources: &MemoryFS,
    resolved: &[ResolvedArtifact],
    manifest: &Manifest,
) -> Result<MemoryFS> {
    let mut staged = MemoryFS::new();
    merge_layer(&mut staged, classes, "classes");
    merge_layer(&mut staged, resources, "resources");

    for artifact in resolved
        .iter()
        .filter(|a| a.declaration.scope == Scope::Embed)
    {
        let mut layer = load_embedded(artifact)?;
        if layer.exists(MANIFEST_PATH) {
            log::debug!(
                "Dropping manifest embedded in {}",
                artifact.declaration.artifact
            );
            layer.remove_file(MANIFEST_PATH);
        }
        log::info!(
            "Embedding {} ({} files)",
            artifact.declaration.artifact,
            layer.len()
        );
        merge_layer(
            &mut staged,
            &layer,
            &format!("embedded {}", artifact.declaration.artifact),
        );
    }

    staged.add_file_string(MANIFEST_PATH, &manifest.render())?;
    Ok(staged)
}

/// Stage the sources jar: Java sources plus processed resources, with the
/// same manifest. Returns `None` when there is no source tree.
pub fn assemble_sources(
    sources_dir: &Path,
    resources: &MemoryFS,
    manifest: &Manifest,
) -> Result<Option<MemoryFS>> {
    if !sources_dir.is_dir() {
        log::debug!("No source tree at {}", sources_dir.display());
        return Ok(None);
    }
    let mut staged = MemoryFS::from_dir(sources_dir)?;
    merge_layer(&mut staged, resources, "resources");
    staged.add_file_string(MANIFEST_PATH, &manifest.render())?;
    Ok(Some(staged))
}
