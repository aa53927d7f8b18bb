//! Orchestrator for the complete build
//!
//! [`prepare`] runs the pure part of the pipeline (flags and the three leaf
//! computations) and is shared by `build` and `plan`. [`execute_build`] runs
//! everything.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{write, BuildPaths};
use crate::archive::{self, AccessTransformerRegistry};
use crate::cache::ArtifactCache;
use crate::config::ProjectConfig;
use crate::dependencies::{self, DependencyDeclaration};
use crate::error::Result;
use crate::filesystem::MemoryFS;
use crate::flags::{FeatureSet, FlagSet, Invocation};
use crate::manifest::{self, Manifest};
use crate::metadata::{self, GeneratedSource};
use crate::repository::{RepositoryManager, ResolvedArtifact};
use crate::rewrite::{Rename, RuleSet};

/// Inputs of one build invocation
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub project_dir: PathBuf,
    pub flags: FlagSet,
    pub project: ProjectConfig,
    pub invocation: Invocation,
    pub mirror_root: PathBuf,
    pub cache_root: PathBuf,
    /// Stop after preparation; nothing is resolved or written.
    pub dry_run: bool,
}

/// Everything derived from the flags before any file is read or written
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub features: FeatureSet,
    pub dependencies: Vec<DependencyDeclaration>,
    #[serde(skip)]
    pub tags: GeneratedSource,
    pub tags_class: String,
    pub manifest: Manifest,
    pub archive: PathBuf,
}

/// What a build produced
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub plan: BuildPlan,
    pub resolved: Vec<ResolvedArtifact>,
    pub access_transformers: AccessTransformerRegistry,
    pub renames: Vec<Rename>,
    pub expanded: Vec<PathBuf>,
    /// Number of entries in the main archive
    pub entries: usize,
    pub sources_archive: Option<PathBuf>,
    /// False for dry runs
    pub written: bool,
}

/// Resolve flags and run the leaf computations. Planning, tags generation
/// and manifest composition run concurrently and all complete before this
/// returns.
pub fn prepare(
    flags: &FlagSet,
    project: &ProjectConfig,
    invocation: &Invocation,
    paths: &BuildPaths,
) -> Result<BuildPlan> {
    project.validate()?;
    let features = FeatureSet::resolve(flags, project)?;

    let (dependencies, (tags, manifest)) = rayon::join(
        || dependencies::plan(&features, project),
        || {
            rayon::join(
                || metadata::generate_tags(&features, &project.tags),
                || manifest::compose(&features, invocation, project),
            )
        },
    );
    let dependencies = dependencies?;
    let tags = tags?;
    let manifest = manifest?;

    let archive = paths.libs.join(archive::archive_name(&features));
    Ok(BuildPlan {
        tags_class: tags.class_name.clone(),
        features,
        dependencies,
        tags,
        manifest,
        archive,
    })
}

/// Run the full build for `request`.
///
/// The previous archive is removed before anything else, so a failure at any
/// later step leaves no archive behind.
pub fn execute_build(request: &BuildRequest) -> Result<BuildOutcome> {
    let paths = BuildPaths::new(&request.project_dir, &request.project.layout);

    let plan = prepare(
        &request.flags,
        &request.project,
        &request.invocation,
        &paths,
    )?;
    log::info!(
        "Prepared {} ({} dependencies)",
        plan.archive.display(),
        plan.dependencies.len()
    );

    if request.dry_run {
        return Ok(BuildOutcome {
            plan,
            resolved: Vec::new(),
            access_transformers: AccessTransformerRegistry::new(),
            renames: Vec::new(),
            expanded: Vec::new(),
            entries: 0,
            sources_archive: None,
            written: false,
        });
    }

    write::remove_stale(&plan.archive)?;
    let sources_archive = paths
        .libs
        .join(archive::sources_archive_name(&plan.features));
    write::remove_stale(&sources_archive)?;

    metadata::write_generated(&plan.tags, &paths.generated_sources)?;

    let cache = ArtifactCache::new(&request.cache_root);
    let manager = RepositoryManager::new(
        &request.project.repositories,
        &request.project_dir,
        &request.mirror_root,
        cache,
    )?;
    let resolved = manager.resolve_all(&plan.dependencies)?;
    log::info!("Resolved {} dependencies", resolved.len());

    let access_transformers =
        archive::discover_access_transformers(&plan.features, &paths.resources)?;

    let classes = MemoryFS::from_dir(&paths.classes)?;
    let mut resources = MemoryFS::from_dir(&paths.resources)?;
    let substitutions = metadata::substitutions(&plan.features);
    let expanded =
        metadata::expand_resources(&mut resources, &request.project.resources.expand, &substitutions)?;
    let renames = RuleSet::for_features(&plan.features)?.apply(&mut resources)?;

    let staged = archive::assemble(&classes, &resources, &resolved, &plan.manifest)?;
    let sources = archive::assemble_sources(&paths.sources, &resources, &plan.manifest)?;

    // The main archive is renamed into place last; every earlier failure
    // leaves it absent.
    let sources_archive = write_companions(
        sources.as_ref(),
        &sources_archive,
        &access_transformers,
        &resolved,
        &paths,
    )?;
    if let Err(e) = write::write_archive(&staged, &plan.archive) {
        if let Some(path) = &sources_archive {
            write::remove_stale(path)?;
        }
        return Err(e);
    }

    Ok(BuildOutcome {
        plan,
        resolved,
        access_transformers,
        renames,
        expanded,
        entries: staged.len(),
        sources_archive,
        written: true,
    })
}

/// Write the sources jar and the JSON reports. Returns the sources jar path
/// when one was written.
fn write_companions(
    sources: Option<&MemoryFS>,
    sources_archive: &Path,
    access_transformers: &AccessTransformerRegistry,
    resolved: &[ResolvedArtifact],
    paths: &BuildPaths,
) -> Result<Option<PathBuf>> {
    let written = match sources {
        Some(sources) => {
            write::write_archive(sources, sources_archive)?;
            Some(sources_archive.to_path_buf())
        }
        None => None,
    };

    let reports = write::write_report(access_transformers, &paths.access_transformer_report())
        .and_then(|()| write::write_report(&resolved, &paths.dependency_report()));
    if let Err(e) = reports {
        if let Some(path) = &written {
            write::remove_stale(path)?;
        }
        return Err(e);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Stage;
    use crate::config::{DependencyConfig, RepositoryConfig};
    use crate::flags::fixtures::base_flags;
    use std::fs;
    use std::io::{Read, Write};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_jar(path: &Path, entries: &[(&str, &str)]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, zip::write::FileOptions::default())
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn read_entry(jar: &Path, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(fs::File::open(jar).unwrap()).unwrap();
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    /// A project with classes, resources, a local repository and an
    /// embedded library.
    fn project(temp: &TempDir) -> ProjectConfig {
        let root = temp.path();
        fs::create_dir_all(root.join("build/classes/java/main/org/example/mymod")).unwrap();
        fs::write(
            root.join("build/classes/java/main/org/example/mymod/ExampleMod.class"),
            "class",
        )
        .unwrap();
        fs::create_dir_all(root.join("src/main/resources")).unwrap();
        fs::write(
            root.join("src/main/resources/mcmod.info"),
            r#"[{"version": "${version}", "mcversion": "${mcversion}"}]"#,
        )
        .unwrap();
        fs::write(root.join("src/main/resources/examplemod_at.cfg"), "public a").unwrap();

        write_jar(
            &root.join("repo/org/example/lib/1.0/lib-1.0.jar"),
            &[("org/example/lib/Lib.class", "lib")],
        );

        let mut project = ProjectConfig::default();
        project.repositories = vec![RepositoryConfig {
            name: Some("local".to_string()),
            url: "repo".to_string(),
            groups: Vec::new(),
        }];
        project.dependencies = vec![DependencyConfig {
            embed: Some("org.example:lib:1.0".to_string()),
            ..DependencyConfig::default()
        }];
        project
    }

    fn request(temp: &TempDir, flags: FlagSet, project: ProjectConfig) -> BuildRequest {
        BuildRequest {
            project_dir: temp.path().to_path_buf(),
            flags,
            project,
            invocation: Invocation::new(["build"]),
            mirror_root: temp.path().join("mirrors"),
            cache_root: temp.path().join(".mod-composer/cache"),
            dry_run: false,
        }
    }

    #[test]
    fn test_prepare_runs_leaf_computations() {
        let temp = TempDir::new().unwrap();
        let paths = BuildPaths::new(temp.path(), &ProjectConfig::default().layout);
        let plan = prepare(
            &base_flags(),
            &ProjectConfig::default(),
            &Invocation::new(["build"]),
            &paths,
        )
        .unwrap();

        assert_eq!(plan.tags_class, "org.example.mymod.Tags");
        assert!(plan.dependencies.is_empty());
        assert!(plan.manifest.is_empty());
        assert_eq!(
            plan.archive,
            temp.path().join("build/libs/ExampleMod-1.12.2-1.0.0.jar")
        );
    }

    #[test]
    fn test_prepare_missing_flag() {
        let temp = TempDir::new().unwrap();
        let paths = BuildPaths::new(temp.path(), &ProjectConfig::default().layout);
        let flags = base_flags().with("use_coremod", "true");
        let err = prepare(
            &flags,
            &ProjectConfig::default(),
            &Invocation::new(["build"]),
            &paths,
        )
        .unwrap_err();
        assert!(err.to_string().contains("coremod_plugin_class_name"));
    }

    #[test]
    fn test_execute_build() {
        let temp = TempDir::new().unwrap();
        let flags = base_flags().with("use_access_transformer", "true");
        let outcome = execute_build(&request(&temp, flags, project(&temp))).unwrap();

        assert!(outcome.written);
        let jar = &outcome.plan.archive;
        assert!(jar.is_file());
        assert_eq!(read_entry(jar, "org/example/lib/Lib.class"), "lib");
        assert_eq!(
            read_entry(jar, "mcmod.info"),
            r#"[{"version": "1.0.0", "mcversion": "1.12.2"}]"#
        );
        assert_eq!(read_entry(jar, "META-INF/examplemod_at.cfg"), "public a");
        assert!(read_entry(jar, "META-INF/MANIFEST.MF").contains("FMLAT: examplemod_at.cfg"));

        for stage in Stage::ALL {
            assert_eq!(outcome.access_transformers.files(stage).len(), 1);
        }
        assert!(temp
            .path()
            .join("build/generated/sources/injectTags/org/example/mymod/Tags.java")
            .is_file());
        assert!(temp
            .path()
            .join("build/mod-composer/access-transformers.json")
            .is_file());
        assert!(temp.path().join("build/mod-composer/dependencies.json").is_file());
        assert!(outcome.sources_archive.is_none());
        assert_eq!(outcome.resolved[0].source, "local");
    }

    #[test]
    fn test_failed_build_removes_previous_archive() {
        let temp = TempDir::new().unwrap();
        let mut project = project(&temp);
        let request_ok = request(&temp, base_flags(), project.clone());
        let first = execute_build(&request_ok).unwrap();
        assert!(first.plan.archive.is_file());

        project.dependencies.push(DependencyConfig {
            implementation: Some("org.example:absent:9.9".to_string()),
            ..DependencyConfig::default()
        });
        let err = execute_build(&request(&temp, base_flags(), project)).unwrap_err();
        assert!(err.to_string().contains("org.example:absent:9.9"));
        assert!(!first.plan.archive.exists());
    }

    #[test]
    fn test_report_failure_leaves_no_archive() {
        let temp = TempDir::new().unwrap();
        let project = project(&temp);
        fs::create_dir_all(temp.path().join("src/main/java/org/example")).unwrap();
        fs::write(temp.path().join("src/main/java/org/example/Mod.java"), "class Mod {}").unwrap();
        // A plain file where the reports directory should go
        fs::create_dir_all(temp.path().join("build")).unwrap();
        fs::write(temp.path().join("build/mod-composer"), "blocked").unwrap();

        let err = execute_build(&request(&temp, base_flags(), project)).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));

        let libs = temp.path().join("build/libs");
        assert!(!libs.join("ExampleMod-1.12.2-1.0.0.jar").exists());
        assert!(!libs.join("ExampleMod-1.12.2-1.0.0-sources.jar").exists());
        assert!(!libs.join("ExampleMod-1.12.2-1.0.0.jar.tmp").exists());
    }

    #[test]
    fn test_sources_jar_written_next_to_archive() {
        let temp = TempDir::new().unwrap();
        let project = project(&temp);
        fs::create_dir_all(temp.path().join("src/main/java/org/example")).unwrap();
        fs::write(temp.path().join("src/main/java/org/example/Mod.java"), "class Mod {}").unwrap();

        let outcome = execute_build(&request(&temp, base_flags(), project)).unwrap();
        let sources = outcome.sources_archive.unwrap();
        assert_eq!(read_entry(&sources, "org/example/Mod.java"), "class Mod {}");
        assert!(outcome.plan.archive.is_file());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let mut request = request(&temp, base_flags(), project(&temp));
        request.dry_run = true;

        let outcome = execute_build(&request).unwrap();
        assert!(!outcome.written);
        assert!(!temp.path().join("build/libs").exists());
        assert!(!temp.path().join("build/generated").exists());
    }
}
