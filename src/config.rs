//! # Project Descriptor Schema and Parsing
//!
//! This module defines the data structures behind the optional
//! `mod-composer.yaml` project descriptor and the logic for loading it. The
//! descriptor holds everything about a build that is not a flag: the target
//! platform version, the source layout, the repositories to resolve from, and
//! the project's own dependency declarations.
//!
//! ## Example
//!
//! ```yaml
//! minecraft:
//!   version: "1.12.2"
//! tags:
//!   class: org.example.mymod.Tags
//! repositories:
//!   - name: CleanroomMC Maven
//!     url: https://maven.cleanroommc.com
//!   - name: CurseMaven
//!     url: https://cursemaven.com
//!     groups: [curse.maven]
//! dependencies:
//!   - implementation: curse.maven:OreLib-307806:2820815
//!   - compile-only: mezz.jei:jei_1.12.2:4.16.1.301
//!   - embed: libs/shaded-lib.jar
//!   - compile-only: curse.maven:TheOneProbe-245211:2667280
//!     when: use_top
//! ```
//!
//! Every field has a default that mirrors a stock Forge 1.12.2 project, so a
//! missing descriptor is equivalent to an empty one.

use crate::dependencies::{repository_id, Scope};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the project descriptor, looked up in the project directory.
pub const PROJECT_FILE: &str = "mod-composer.yaml";

/// Target platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinecraftConfig {
    /// The platform version the bundle is built against.
    #[serde(default = "default_mc_version")]
    pub version: String,
}

impl Default for MinecraftConfig {
    fn default() -> Self {
        Self {
            version: default_mc_version(),
        }
    }
}

fn default_mc_version() -> String {
    "1.12.2".to_string()
}

/// Generated `Tags` class settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagsConfig {
    /// Fully-qualified class name. Defaults to `<maven_group>.Tags`.
    #[serde(default)]
    pub class: Option<String>,
    /// Extra constants injected next to `VERSION`.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// Directory layout, relative to the project directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Layout {
    /// Compiled class output produced by the external compiler
    #[serde(default = "default_classes_dir")]
    pub classes: PathBuf,
    /// Main resource source set
    #[serde(default = "default_resources_dir")]
    pub resources: PathBuf,
    /// Main Java source set, packaged into the sources jar
    #[serde(default = "default_sources_dir")]
    pub sources: PathBuf,
    /// Root for everything the build writes
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            classes: default_classes_dir(),
            resources: default_resources_dir(),
            sources: default_sources_dir(),
            build_dir: default_build_dir(),
        }
    }
}

fn default_classes_dir() -> PathBuf {
    PathBuf::from("build/classes/java/main")
}

fn default_resources_dir() -> PathBuf {
    PathBuf::from("src/main/resources")
}

fn default_sources_dir() -> PathBuf {
    PathBuf::from("src/main/java")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

/// Resource processing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcesConfig {
    /// File-name globs whose contents get `${version}`/`${mcversion}` expanded.
    #[serde(default = "default_expand")]
    pub expand: Vec<String>,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            expand: default_expand(),
        }
    }
}

fn default_expand() -> Vec<String> {
    vec!["mcmod.info".to_string(), "pack.mcmeta".to_string()]
}

/// Bytecode weaving (mixin) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixinConfig {
    /// Coordinate of the mixin library used for both the API and the processor.
    #[serde(default = "default_mixin_spec")]
    pub spec: String,
}

impl Default for MixinConfig {
    fn default() -> Self {
        Self {
            spec: default_mixin_spec(),
        }
    }
}

fn default_mixin_spec() -> String {
    "org.spongepowered:mixin:0.8.3".to_string()
}

/// A maven-style repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Display name; defaults to the URL's host and path.
    #[serde(default)]
    pub name: Option<String>,
    /// `https://`, `file://` or a plain local path.
    pub url: String,
    /// If non-empty, the repository only serves these groups.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl RepositoryConfig {
    fn named(name: &str, url: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            url: url.to_string(),
            groups: Vec::new(),
        }
    }

    fn unnamed(url: &str) -> Self {
        Self {
            name: None,
            url: url.to_string(),
            groups: Vec::new(),
        }
    }
}

/// The repositories a stock project resolves from, first-party host first.
pub fn default_repositories() -> Vec<RepositoryConfig> {
    vec![
        RepositoryConfig::named("CleanroomMC Maven", "https://maven.cleanroommc.com"),
        RepositoryConfig::named("SpongePowered Maven", "https://repo.spongepowered.org/maven"),
        RepositoryConfig {
            groups: vec!["curse.maven".to_string()],
            ..RepositoryConfig::named("CurseMaven", "https://cursemaven.com")
        },
        RepositoryConfig::named("JitPack", "https://jitpack.io"),
        RepositoryConfig::unnamed("https://dvs1.progwml6.com/files/maven"),
        RepositoryConfig::unnamed("https://maven.tterrag.com"),
        RepositoryConfig::unnamed("https://repo.elytradev.com/"),
        RepositoryConfig::unnamed("https://maven.mcmoddev.com"),
        RepositoryConfig::unnamed("https://maven.blamejared.com/"),
        RepositoryConfig::unnamed("https://maven.covers1624.net/"),
    ]
}

/// One entry of the `dependencies:` list.
///
/// Exactly one scope key must be set; its value is a coordinate, or for
/// `embed` also a path to a jar or directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DependencyConfig {
    #[serde(default)]
    pub compile_only: Option<String>,
    #[serde(default)]
    pub implementation: Option<String>,
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub embed: Option<String>,
    #[serde(default)]
    pub annotation_processor: Option<String>,
    /// Boolean flag that gates this declaration.
    #[serde(default)]
    pub when: Option<String>,
    /// Whether transitive dependencies are pulled in. Defaults to `true`.
    #[serde(default)]
    pub transitive: Option<bool>,
}

impl DependencyConfig {
    /// The single scope this entry declares, with its artifact notation.
    pub fn scoped(&self) -> Result<(Scope, &str)> {
        let set: Vec<(Scope, &str)> = [
            (Scope::CompileOnly, self.compile_only.as_deref()),
            (Scope::Implementation, self.implementation.as_deref()),
            (Scope::Api, self.api.as_deref()),
            (Scope::Embed, self.embed.as_deref()),
            (Scope::AnnotationProcessor, self.annotation_processor.as_deref()),
        ]
        .into_iter()
        .filter_map(|(scope, value)| value.map(|v| (scope, v)))
        .collect();

        match set.as_slice() {
            [found] => Ok(*found),
            [] => Err(Error::ConfigParse {
                message: "Dependency entry declares no scope".to_string(),
                hint: Some(
                    "Use one of: compile-only, implementation, api, embed, annotation-processor"
                        .to_string(),
                ),
            }),
            [(first, _), (second, _), ..] => Err(Error::ConfigParse {
                message: format!(
                    "Dependency entry declares more than one scope ({} and {})",
                    first, second
                ),
                hint: Some("Split it into one entry per scope".to_string()),
            }),
        }
    }
}

/// The complete project descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub minecraft: MinecraftConfig,
    #[serde(default)]
    pub tags: TagsConfig,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub mixins: MixinConfig,
    #[serde(default = "default_repositories")]
    pub repositories: Vec<RepositoryConfig>,
    #[serde(default)]
    pub dependencies: Vec<DependencyConfig>,
    /// Static manifest attributes added after the derived ones.
    #[serde(default)]
    pub manifest: BTreeMap<String, String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            minecraft: MinecraftConfig::default(),
            tags: TagsConfig::default(),
            layout: Layout::default(),
            resources: ResourcesConfig::default(),
            mixins: MixinConfig::default(),
            repositories: default_repositories(),
            dependencies: Vec::new(),
            manifest: BTreeMap::new(),
        }
    }
}

impl ProjectConfig {
    /// Names of every flag used as a `when:` gate, in declaration order.
    pub fn gate_flags(&self) -> Vec<&str> {
        let mut gates: Vec<&str> = Vec::new();
        for dependency in &self.dependencies {
            if let Some(gate) = dependency.when.as_deref() {
                if !gates.contains(&gate) {
                    gates.push(gate);
                }
            }
        }
        gates
    }

    /// Check structural rules serde cannot express.
    pub fn validate(&self) -> Result<()> {
        for dependency in &self.dependencies {
            let (scope, notation) = dependency.scoped()?;
            if notation.trim().is_empty() {
                return Err(Error::ConfigParse {
                    message: format!("Empty artifact for {} dependency", scope),
                    hint: None,
                });
            }
        }
        let mut ids: Vec<String> = Vec::new();
        for repository in &self.repositories {
            if repository.url.trim().is_empty() {
                return Err(Error::ConfigParse {
                    message: "Repository entry has an empty url".to_string(),
                    hint: None,
                });
            }
            let id = repository_id(repository);
            if ids.contains(&id) {
                return Err(Error::ConfigParse {
                    message: format!("Two repositories share the identifier '{}'", id),
                    hint: Some("Give one of them a distinct `name`".to_string()),
                });
            }
            ids.push(id);
        }
        for (key, value) in &self.manifest {
            validate_manifest_attribute(key, value)?;
        }
        Ok(())
    }
}

/// Jar manifest header names are 1 to 70 bytes of `[A-Za-z0-9_-]`, and
/// `Manifest-Version` is always written by the composer.
fn validate_manifest_attribute(key: &str, value: &str) -> Result<()> {
    let invalid = |message: String| Error::ConfigParse {
        message,
        hint: Some("Manifest keys may use letters, digits, '-' and '_'".to_string()),
    };
    if key.is_empty()
        || key.len() > 70
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid(format!("Invalid manifest attribute name '{}'", key)));
    }
    if key.eq_ignore_ascii_case("Manifest-Version") {
        return Err(invalid(format!("Manifest attribute '{}' is reserved", key)));
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(invalid(format!(
            "Manifest attribute '{}' has a line break in its value",
            key
        )));
    }
    Ok(())
}

/// Parses a YAML string into a validated `ProjectConfig`.
pub fn parse(yaml_content: &str) -> Result<ProjectConfig> {
    // An empty or comment-only file is a valid, all-defaults descriptor
    if yaml_content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    }) {
        return Ok(ProjectConfig::default());
    }

    let config: ProjectConfig = serde_yaml::from_str(yaml_content).map_err(|e| {
        Error::ConfigParse {
            message: e.to_string(),
            hint: Some(format!("Check {} against the documented schema", PROJECT_FILE)),
        }
    })?;
    config.validate()?;
    Ok(config)
}

/// Parse a `ProjectConfig` from a YAML file path
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Load the descriptor from a project directory, falling back to defaults
/// when the project has none.
pub fn load(project_dir: &Path) -> Result<ProjectConfig> {
    let path = project_dir.join(PROJECT_FILE);
    if path.is_file() {
        log::debug!("Loading project descriptor {}", path.display());
        from_file(&path)
    } else {
        log::debug!("No {} in {}, using defaults", PROJECT_FILE, project_dir.display());
        Ok(ProjectConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = parse("# nothing here\n").unwrap();
        assert_eq!(config.minecraft.version, "1.12.2");
        assert_eq!(config.repositories, default_repositories());
        assert_eq!(config.resources.expand, vec!["mcmod.info", "pack.mcmeta"]);
        assert!(config.dependencies.is_empty());
    }

    #[test]
    fn test_parse_full_descriptor() {
        let yaml = r#"
minecraft:
  version: "1.12.2"
tags:
  class: org.example.mymod.BuildTags
  values:
    MOD_ID: mymod
layout:
  build-dir: out
repositories:
  - name: Local
    url: file:///tmp/repo
dependencies:
  - implementation: curse.maven:OreLib-307806:2820815
  - embed: libs/shaded.jar
  - compile-only: mezz.jei:jei_1.12.2:4.16.1.301
    when: use_jei
manifest:
  Implementation-Title: mymod
"#;
        let config = parse(yaml).unwrap();
        assert_eq!(config.tags.class.as_deref(), Some("org.example.mymod.BuildTags"));
        assert_eq!(config.tags.values["MOD_ID"], "mymod");
        assert_eq!(config.layout.build_dir, PathBuf::from("out"));
        assert_eq!(config.layout.classes, default_classes_dir());
        assert_eq!(config.repositories.len(), 1);
        assert_eq!(config.dependencies.len(), 3);
        assert_eq!(config.gate_flags(), vec!["use_jei"]);
        assert_eq!(config.manifest["Implementation-Title"], "mymod");

        let (scope, notation) = config.dependencies[1].scoped().unwrap();
        assert_eq!(scope, Scope::Embed);
        assert_eq!(notation, "libs/shaded.jar");
    }

    #[test]
    fn test_dependency_without_scope_is_rejected() {
        let yaml = r#"
dependencies:
  - when: use_jei
"#;
        let err = parse(yaml).unwrap_err();
        assert!(err.to_string().contains("declares no scope"));
        assert!(err.to_string().contains("hint:"));
    }

    #[test]
    fn test_dependency_with_two_scopes_is_rejected() {
        let yaml = r#"
dependencies:
  - api: a:b:1
    embed: a:b:1
"#;
        let err = parse(yaml).unwrap_err();
        assert!(err.to_string().contains("more than one scope"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = parse("minecraft:\n  versoin: 1.7.10\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_load_missing_descriptor_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = load(temp.path()).unwrap();
        assert_eq!(config.layout.build_dir, PathBuf::from("build"));
    }

    #[test]
    fn test_same_host_repositories_are_distinct() {
        let yaml = r#"
repositories:
  - url: https://maven.example.com/releases
  - url: https://maven.example.com/snapshots
"#;
        assert!(parse(yaml).is_ok());
        assert!(ProjectConfig::default().validate().is_ok());
    }

    #[test]
    fn test_duplicate_repository_id_is_rejected() {
        let yaml = r#"
repositories:
  - name: mirror
    url: https://a.example.com
  - name: mirror
    url: https://b.example.com
"#;
        let err = parse(yaml).unwrap_err();
        assert!(err.to_string().contains("share the identifier 'mirror'"));
    }

    #[test]
    fn test_manifest_attribute_names_are_checked() {
        assert!(parse("manifest:\n  Implementation-Title: mymod\n").is_ok());

        for yaml in [
            "manifest:\n  Manifest-Version: \"2.0\"\n",
            "manifest:\n  \"Bad:Key\": x\n",
            "manifest:\n  \"Two Words\": x\n",
            "manifest:\n  Title: \"line\\nbreak\"\n",
        ] {
            let err = parse(yaml).unwrap_err();
            assert!(matches!(err, Error::ConfigParse { .. }), "{}", yaml);
        }
    }

    #[test]
    fn test_default_repositories_order() {
        let repos = default_repositories();
        assert_eq!(repos[0].name.as_deref(), Some("CleanroomMC Maven"));
        assert_eq!(repos[2].groups, vec!["curse.maven"]);
        assert_eq!(repos.len(), 10);
    }
}
