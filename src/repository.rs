//! # Dependency Resolution
//!
//! This module provides the `RepositoryManager`, which turns planned
//! [`DependencyDeclaration`]s into artifact files on disk. Transport is not
//! its concern: a remote host is represented by a local maven-layout mirror
//! directory that an external fetcher keeps populated, and `file://`
//! repositories are read in place.
//!
//! ## Design
//!
//! Sources are hidden behind the **`ArtifactSource`** trait so tests can
//! substitute sources that record every attempt. For each declaration the
//! manager walks the declaration's own `sources` list, which the planner
//! computed in priority order, and stops at the first hit. The project
//! [`ArtifactCache`] is the last entry of every list; a hit on any host is
//! written through to it. Running out of sources is a
//! `DependencyResolutionFailure` and nothing is retried.

use crate::cache::ArtifactCache;
use crate::config::RepositoryConfig;
use crate::dependencies::{repository_id, Artifact, Coordinate, DependencyDeclaration};
use crate::error::{Error, Result};
use crate::path::encode_url_path;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A place artifacts can be found
pub trait ArtifactSource: Send + Sync {
    /// Identifier matching the entries of `DependencyDeclaration::sources`.
    fn id(&self) -> &str;

    /// Return the artifact's path if this source has it.
    fn locate(&self, coordinate: &Coordinate) -> Result<Option<PathBuf>>;
}

/// A maven-layout directory standing in for one configured repository
#[derive(Debug, Clone)]
pub struct MavenRepository {
    id: String,
    root: PathBuf,
}

impl MavenRepository {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
        }
    }

    /// Map a configured repository onto a directory. `file:` URLs and plain
    /// paths are used directly (relative paths against `project_dir`);
    /// http(s) hosts are read from their mirror under `mirror_root`.
    pub fn from_config(
        config: &RepositoryConfig,
        project_dir: &Path,
        mirror_root: &Path,
    ) -> Result<Self> {
        let id = repository_id(config);
        let root = match url::Url::parse(&config.url) {
            Ok(url) if url.scheme() == "file" => {
                url.to_file_path().map_err(|_| Error::ConfigParse {
                    message: format!("Repository '{}' has an invalid file URL", id),
                    hint: Some("Use an absolute file:/// URL or a plain path".to_string()),
                })?
            }
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
                mirror_root.join(encode_url_path(url.as_str().trim_end_matches('/')))
            }
            Ok(url) => {
                return Err(Error::ConfigParse {
                    message: format!(
                        "Repository '{}' uses unsupported scheme '{}'",
                        id,
                        url.scheme()
                    ),
                    hint: None,
                })
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => project_dir.join(&config.url),
            Err(e) => return Err(Error::UrlParse(e)),
        };
        Ok(Self { id, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSource for MavenRepository {
    fn id(&self) -> &str {
        &self.id
    }

    fn locate(&self, coordinate: &Coordinate) -> Result<Option<PathBuf>> {
        let candidate = self.root.join(coordinate.repository_path());
        Ok(candidate.is_file().then_some(candidate))
    }
}

impl ArtifactSource for ArtifactCache {
    fn id(&self) -> &str {
        ArtifactCache::ID
    }

    fn locate(&self, coordinate: &Coordinate) -> Result<Option<PathBuf>> {
        self.lookup(coordinate)
    }
}

/// A declaration paired with the file that satisfies it
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedArtifact {
    pub declaration: DependencyDeclaration,
    pub path: PathBuf,
    /// Source that provided the artifact
    pub source: String,
    /// Sources attempted, in order, including the successful one
    pub attempts: Vec<String>,
}

/// Resolves declarations against an ordered set of sources
pub struct RepositoryManager {
    sources: Vec<Box<dyn ArtifactSource>>,
    cache: ArtifactCache,
    project_dir: PathBuf,
}

impl RepositoryManager {
    /// Build a manager for the configured repositories.
    pub fn new(
        repositories: &[RepositoryConfig],
        project_dir: &Path,
        mirror_root: &Path,
        cache: ArtifactCache,
    ) -> Result<Self> {
        let sources = repositories
            .iter()
            .map(|config| {
                MavenRepository::from_config(config, project_dir, mirror_root)
                    .map(|repo| Box::new(repo) as Box<dyn ArtifactSource>)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_sources(sources, cache, project_dir))
    }

    /// Build a manager from explicit sources (useful for testing).
    pub fn with_sources(
        sources: Vec<Box<dyn ArtifactSource>>,
        cache: ArtifactCache,
        project_dir: &Path,
    ) -> Self {
        Self {
            sources,
            cache,
            project_dir: project_dir.to_path_buf(),
        }
    }

    fn source(&self, id: &str) -> Option<&dyn ArtifactSource> {
        if id == ArtifactCache::ID {
            return Some(&self.cache);
        }
        self.sources
            .iter()
            .find(|s| s.id() == id)
            .map(|s| s.as_ref())
    }

    /// Resolve one declaration, trying its sources in order.
    pub fn resolve(&self, declaration: &DependencyDeclaration) -> Result<ResolvedArtifact> {
        let coordinate = match &declaration.artifact {
            Artifact::Path(path) => return self.resolve_local(declaration, path),
            Artifact::Coordinate(coordinate) => coordinate,
        };

        let mut attempts = Vec::new();
        for id in &declaration.sources {
            let Some(source) = self.source(id) else {
                log::warn!("Dependency {} names unknown source '{}'", coordinate, id);
                continue;
            };
            attempts.push(id.clone());
            if let Some(found) = source.locate(coordinate)? {
                log::debug!("Resolved {} from {}", coordinate, id);
                if id != ArtifactCache::ID {
                    self.cache.store(coordinate, &found)?;
                }
                return Ok(ResolvedArtifact {
                    declaration: declaration.clone(),
                    path: found,
                    source: id.clone(),
                    attempts,
                });
            }
        }

        Err(Error::DependencyResolutionFailure {
            coordinate: coordinate.to_string(),
            tried: attempts,
        })
    }

    fn resolve_local(
        &self,
        declaration: &DependencyDeclaration,
        path: &Path,
    ) -> Result<ResolvedArtifact> {
        let full = self.project_dir.join(path);
        if !full.exists() {
            return Err(Error::DependencyResolutionFailure {
                coordinate: path.display().to_string(),
                tried: vec!["local".to_string()],
            });
        }
        Ok(ResolvedArtifact {
            declaration: declaration.clone(),
            path: full,
            source: "local".to_string(),
            attempts: vec!["local".to_string()],
        })
    }

    /// Resolve every declaration. Lookups run in parallel; results keep plan
    /// order and the first failure aborts.
    pub fn resolve_all(&self, plan: &[DependencyDeclaration]) -> Result<Vec<ResolvedArtifact>> {
        plan.par_iter().map(|d| self.resolve(d)).collect()
    }
}
