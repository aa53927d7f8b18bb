//! # Dependency Planning
//!
//! Turns a [`FeatureSet`] and the project descriptor into the ordered list of
//! [`DependencyDeclaration`]s for one build. The plan is a pure function of
//! its inputs: nothing is fetched here, the resolver in
//! [`crate::repository`] works from the plan afterwards.
//!
//! Ordering is project declarations first (in file order, gated entries
//! dropped when their flag is false), then the built-in feature libraries.
//! Every coordinate carries the repository identifiers to try, in priority
//! order, with the project artifact cache always last.

use crate::cache::ArtifactCache;
use crate::config::{ProjectConfig, RepositoryConfig};
use crate::error::{Error, Result};
use crate::flags::FeatureSet;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Asset mover library, pulled in by `use_assetmover`.
pub const ASSETMOVER: &str = "com.cleanroommc:assetmover:2.5";
/// Mixin loader, pulled in by `use_mixins`.
pub const MIXINBOOTER: &str = "zone.rong:mixinbooter:8.1";
/// Bytecode library the mixin annotation processor runs against.
pub const ASM_DEBUG_ALL: &str = "org.ow2.asm:asm-debug-all:5.2";
/// Processor-side support libraries that always travel with weaving.
pub const WEAVING_COMPANIONS: [&str; 2] = [
    "com.google.code.gson:gson:2.8.6",
    "com.google.guava:guava:24.1.1-jre",
];

/// How a dependency participates in the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// On the compile classpath only
    CompileOnly,
    /// Compile and runtime classpath, not exposed to consumers
    Implementation,
    /// Compile and runtime classpath, exposed to consumers
    Api,
    /// Contents merged into the output archive
    Embed,
    /// On the annotation processor path
    AnnotationProcessor,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::CompileOnly => "compile-only",
            Scope::Implementation => "implementation",
            Scope::Api => "api",
            Scope::Embed => "embed",
            Scope::AnnotationProcessor => "annotation-processor",
        };
        f.write_str(name)
    }
}

/// Built-in optional features that contribute dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    AssetMover,
    Weaving,
}

/// Why a declaration is part of the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "feature")]
pub enum Origin {
    /// Declared in the project descriptor
    Project,
    /// Added because a feature flag is on
    Feature(Feature),
    /// Paired with a feature; has no flag of its own
    Companion(Feature),
}

/// A maven coordinate, `group:name:version[:classifier][@extension]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    pub group: String,
    pub name: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl Coordinate {
    pub fn parse(notation: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidCoordinate {
            coordinate: notation.to_string(),
            message: message.to_string(),
        };

        let (body, extension) = match notation.split_once('@') {
            Some((body, ext)) if !ext.is_empty() => (body, ext.to_string()),
            Some(_) => return Err(invalid("empty extension after '@'")),
            None => (notation, "jar".to_string()),
        };

        let parts: Vec<&str> = body.split(':').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid("empty coordinate segment"));
        }
        let (group, name, version, classifier) = match parts.as_slice() {
            [g, n, v] => (*g, *n, *v, None),
            [g, n, v, c] => (*g, *n, *v, Some(c.to_string())),
            _ => return Err(invalid("expected group:name:version[:classifier]")),
        };

        Ok(Self {
            group: group.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            classifier,
            extension,
        })
    }

    /// Path of the artifact inside a maven-layout repository.
    pub fn repository_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in self.group.split('.') {
            path.push(segment);
        }
        path.push(&self.name);
        path.push(&self.version);
        path.push(self.file_name());
        path
    }

    /// Artifact file name, e.g. `mixin-0.8.3.jar`.
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.name, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.name, self.version, self.extension),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

/// What a declaration points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Artifact {
    Coordinate(Coordinate),
    /// A local jar or directory, relative to the project directory
    Path(PathBuf),
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Coordinate(coordinate) => fmt::Display::fmt(coordinate, f),
            Artifact::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One planned dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyDeclaration {
    pub artifact: Artifact,
    pub scope: Scope,
    pub transitive: bool,
    pub origin: Origin,
    /// Repository identifiers to try, highest priority first
    pub sources: Vec<String>,
}

impl DependencyDeclaration {
    /// The coordinate string used in reports and errors.
    pub fn coordinate(&self) -> String {
        self.artifact.to_string()
    }
}

/// Stable identifier for a configured repository: its name, or its host and
/// path without the scheme or a trailing slash.
pub fn repository_id(repository: &RepositoryConfig) -> String {
    if let Some(name) = &repository.name {
        return name.clone();
    }
    url::Url::parse(&repository.url)
        .ok()
        .and_then(|u| {
            let host = u.host_str()?;
            Some(format!("{}{}", host, u.path().trim_end_matches('/')))
        })
        .unwrap_or_else(|| repository.url.clone())
}

/// Repository identifiers that may serve `coordinate`, in priority order,
/// followed by the project cache.
pub fn source_priority(repositories: &[RepositoryConfig], coordinate: &Coordinate) -> Vec<String> {
    let mut sources: Vec<String> = repositories
        .iter()
        .filter(|repo| repo.groups.is_empty() || repo.groups.contains(&coordinate.group))
        .map(repository_id)
        .collect();
    sources.push(ArtifactCache::ID.to_string());
    sources
}

/// Accumulates declarations in plan order.
struct Planner<'a> {
    repositories: &'a [RepositoryConfig],
    declarations: Vec<DependencyDeclaration>,
}

impl<'a> Planner<'a> {
    fn add(&mut self, scope: Scope, notation: &str, transitive: bool, origin: Origin) -> Result<()> {
        let artifact = if scope == Scope::Embed && !looks_like_coordinate(notation) {
            Artifact::Path(PathBuf::from(notation))
        } else {
            Artifact::Coordinate(Coordinate::parse(notation)?)
        };
        let sources = match &artifact {
            Artifact::Coordinate(coordinate) => source_priority(self.repositories, coordinate),
            Artifact::Path(_) => Vec::new(),
        };
        self.declarations.push(DependencyDeclaration {
            artifact,
            scope,
            transitive,
            origin,
            sources,
        });
        Ok(())
    }
}

/// A notation is a coordinate if it has at least two colons and no path
/// separators; anything else under `embed` is a file path.
fn looks_like_coordinate(notation: &str) -> bool {
    notation.matches(':').count() >= 2 && !notation.contains('/') && !notation.contains('\\')
}

/// Build the ordered dependency plan.
pub fn plan(features: &FeatureSet, project: &ProjectConfig) -> Result<Vec<DependencyDeclaration>> {
    let mut planner = Planner {
        repositories: &project.repositories,
        declarations: Vec::new(),
    };

    for dependency in &project.dependencies {
        if let Some(gate) = dependency.when.as_deref() {
            if !features.gate(gate) {
                log::debug!("Skipping dependency gated by '{}'", gate);
                continue;
            }
        }
        let (scope, notation) = dependency.scoped()?;
        planner.add(
            scope,
            notation,
            dependency.transitive.unwrap_or(true),
            Origin::Project,
        )?;
    }

    if features.assetmover {
        planner.add(
            Scope::Implementation,
            ASSETMOVER,
            true,
            Origin::Feature(Feature::AssetMover),
        )?;
    }

    if features.mixins {
        let weaving = Origin::Feature(Feature::Weaving);
        let mixin = project.mixins.spec.as_str();
        planner.add(Scope::Implementation, MIXINBOOTER, true, weaving)?;
        planner.add(Scope::Api, mixin, true, weaving)?;
        planner.add(Scope::AnnotationProcessor, mixin, false, weaving)?;
        planner.add(Scope::AnnotationProcessor, ASM_DEBUG_ALL, true, weaving)?;
        for companion in WEAVING_COMPANIONS {
            planner.add(
                Scope::AnnotationProcessor,
                companion,
                true,
                Origin::Companion(Feature::Weaving),
            )?;
        }
    }

    Ok(planner.declarations)
}
