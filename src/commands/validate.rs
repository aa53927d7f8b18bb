//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks the build
//! inputs without building anything.
//!
//! ## Functionality
//!
//! - **Descriptor Validation**: Parses `mod-composer.yaml` (if present) and
//!   checks its structure.
//! - **Flag Validation**: Resolves the feature set, so every consumed flag
//!   must be present and every boolean well-formed.
//! - **Plan Validation**: Plans dependencies (coordinates must parse) and
//!   composes the manifest (attributes must not conflict).
//! - **Repository Validation**: Every configured repository must map onto a
//!   readable location.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;

use mod_composer::archive;
use mod_composer::defaults::{default_mirror_root, DEFAULT_TASK};
use mod_composer::dependencies;
use mod_composer::flags::{FeatureSet, Invocation};
use mod_composer::manifest;
use mod_composer::metadata;
use mod_composer::output::{emoji, OutputConfig};
use mod_composer::phases::BuildPaths;
use mod_composer::repository::MavenRepository;

use super::Context;

/// Check the flags and project descriptor
#[derive(Args, Debug)]
pub struct ValidateArgs {}

fn report<T, E: std::fmt::Display>(
    out: &OutputConfig,
    label: &str,
    result: std::result::Result<T, E>,
    has_errors: &mut bool,
) -> Option<T> {
    match result {
        Ok(value) => {
            println!("{} {}", emoji(out, "✅", "[OK]"), label);
            Some(value)
        }
        Err(e) => {
            println!("{} {}: {}", emoji(out, "❌", "[ERR]"), label, e);
            *has_errors = true;
            None
        }
    }
}

/// Execute the `validate` command.
pub fn execute(_args: ValidateArgs, context: &Context) -> Result<()> {
    let out = context.output();
    println!(
        "{} Validating project: {}",
        emoji(&out, "🔍", "[SCAN]"),
        context.project_dir.display()
    );

    let mut has_errors = false;

    let project = report(
        &out,
        "Project descriptor parsed",
        context.load_project(),
        &mut has_errors,
    );
    let flags = report(&out, "Flags loaded", context.load_flags(), &mut has_errors);
    let (Some(project), Some(flags)) = (project, flags) else {
        return Err(anyhow::anyhow!("Validation failed"));
    };

    let Some(features) = report(
        &out,
        "Feature set resolved",
        FeatureSet::resolve(&flags, &project),
        &mut has_errors,
    ) else {
        return Err(anyhow::anyhow!("Validation failed"));
    };

    if let Some(plan) = report(
        &out,
        "Dependencies planned",
        dependencies::plan(&features, &project),
        &mut has_errors,
    ) {
        println!("   Declarations: {}", plan.len());
    }
    report(
        &out,
        "Manifest composed",
        manifest::compose(&features, &Invocation::new([DEFAULT_TASK]), &project),
        &mut has_errors,
    );
    report(
        &out,
        "Tags class name valid",
        metadata::generate_tags(&features, &project.tags),
        &mut has_errors,
    );

    let mirror_root = default_mirror_root();
    for repository in &project.repositories {
        let id = dependencies::repository_id(repository);
        report(
            &out,
            &format!("Repository {}", id),
            MavenRepository::from_config(repository, &context.project_dir, &mirror_root),
            &mut has_errors,
        );
    }

    let paths = BuildPaths::new(&context.project_dir, &project.layout);
    if let Some(registry) = report(
        &out,
        "Access transformers registered",
        archive::discover_access_transformers(&features, &paths.resources),
        &mut has_errors,
    ) {
        if features.access_transformer && registry.is_empty() {
            println!(
                "{} Access transformer feature is on but no *_at.cfg was found in {}",
                emoji(&out, "⚠️", "[WARN]"),
                paths.resources.display()
            );
        }
    }

    if has_errors {
        return Err(anyhow::anyhow!("Validation failed"));
    }
    println!("\n{} Project is valid", emoji(&out, "✅", "[OK]"));
    Ok(())
}
