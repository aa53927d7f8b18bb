//! # Mod Composer Library
//!
//! Build orchestration for a packaged mod bundle. A flat set of build flags
//! decides the bundle's dependency graph, its manifest attributes, its
//! resource rewrite plan and its generated metadata, all derived
//! deterministically. The library is used by the `mod-composer` command-line
//! tool but every step is callable on its own.
//!
//! ## Quick Example
//!
//! ```
//! use mod_composer::config::ProjectConfig;
//! use mod_composer::flags::{FeatureSet, FlagSet, Invocation};
//! use mod_composer::manifest;
//!
//! let flags = FlagSet::from_properties(
//!     "mod_version=1.0.0\n\
//!      maven_group=org.example.mymod\n\
//!      archives_base_name=ExampleMod\n\
//!      use_coremod=false\n\
//!      use_access_transformer=true\n\
//!      use_mixins=false\n\
//!      use_assetmover=false\n",
//! )
//! .unwrap();
//! let project = ProjectConfig::default();
//! let features = FeatureSet::resolve(&flags, &project).unwrap();
//!
//! let manifest = manifest::compose(&features, &Invocation::new(["build"]), &project).unwrap();
//! assert_eq!(manifest.get("FMLAT"), Some("examplemod_at.cfg"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Flags (`flags`)**: the `FlagSet` read from a properties file and the
//!   typed `FeatureSet` every other component consumes.
//! - **Project descriptor (`config`)**: the optional `mod-composer.yaml`
//!   holding repositories, dependencies and the source layout.
//! - **Planning (`dependencies`)**: the ordered dependency declarations and
//!   the repository priority for each.
//! - **Resolution (`repository`, `cache`)**: matching declarations to files,
//!   with a content-addressed project cache tried last.
//! - **Metadata (`metadata`)**: the generated tags class and descriptor
//!   token expansion.
//! - **Manifest (`manifest`)**: derived jar manifest attributes.
//! - **Rewrites (`rewrite`)**: ordered regex rules relocating resources.
//! - **Assembly (`archive`, `filesystem`)**: access transformer registration
//!   and the staged archive tree.
//! - **Run profiles (`run_profiles`)**: IDE launch configurations.
//!
//! ## Execution Flow
//!
//! `phases::orchestrator` runs the pipeline: flags are resolved, planning,
//! tags generation and manifest composition run in parallel and join,
//! dependencies are resolved, and the archive is assembled and written
//! atomically.

pub mod archive;
pub mod cache;
pub mod config;
pub mod defaults;
pub mod dependencies;
pub mod error;
pub mod filesystem;
pub mod flags;
pub mod manifest;
pub mod metadata;
pub mod output;
pub mod path;
pub mod phases;
pub mod repository;
pub mod rewrite;
pub mod run_profiles;
