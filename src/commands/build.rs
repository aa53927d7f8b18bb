//! # Build Command Implementation
//!
//! This module implements the `build` subcommand, which runs the whole
//! pipeline: flags are resolved, dependencies planned and resolved, tags and
//! the manifest generated, and the archive assembled and written atomically
//! to `<build>/libs`.
//!
//! ## Example
//!
//! ```bash
//! # Full build from gradle.properties
//! mod-composer build
//!
//! # Build a development archive with weaving forced on
//! mod-composer -P use_mixins=true build --task runClient
//! ```

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use mod_composer::archive::Stage;
use mod_composer::defaults::{default_cache_root, default_mirror_root, DEFAULT_TASK};
use mod_composer::flags::{keys, Invocation};
use mod_composer::output::{emoji, highlight};
use mod_composer::phases::orchestrator::{self, BuildRequest};

use super::Context;

/// Build the mod archive
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Task name the build was invoked for (repeatable; the first one decides
    /// whether this is a full build)
    #[arg(long = "task", value_name = "NAME", default_value = DEFAULT_TASK)]
    pub tasks: Vec<String>,

    /// Root of the per-repository mirror directories.
    ///
    /// Defaults to the system's cache directory (e.g.
    /// `~/.cache/mod-composer/mirrors` on Linux).
    #[arg(long, value_name = "DIR", env = "MOD_COMPOSER_MIRRORS")]
    pub mirror_root: Option<PathBuf>,

    /// Project artifact cache [default: <project>/.mod-composer/cache]
    #[arg(long, value_name = "DIR")]
    pub cache_root: Option<PathBuf>,

    /// Prepare the build and report what it would produce, without
    /// resolving or writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `build` command.
pub fn execute(args: BuildArgs, context: &Context) -> Result<()> {
    let out = context.output();
    let project_dir = &context.project_dir;

    let request = BuildRequest {
        project_dir: project_dir.clone(),
        flags: context.load_flags()?,
        project: context.load_project()?,
        invocation: Invocation::new(args.tasks),
        mirror_root: args.mirror_root.unwrap_or_else(default_mirror_root),
        cache_root: args
            .cache_root
            .unwrap_or_else(|| default_cache_root(project_dir)),
        dry_run: args.dry_run,
    };

    println!(
        "{} Building {} {}",
        emoji(&out, "🔨", "[BUILD]"),
        request
            .flags
            .string(keys::ARCHIVES_BASE_NAME)
            .unwrap_or_default(),
        request
            .flags
            .string(keys::MOD_VERSION)
            .unwrap_or_default()
    );

    let outcome = orchestrator::execute_build(&request)?;

    if !outcome.written {
        println!(
            "{} Dry run: would write {}",
            emoji(&out, "📋", "[DRY-RUN]"),
            outcome.plan.archive.display()
        );
        println!("   Dependencies planned: {}", outcome.plan.dependencies.len());
        println!(
            "   Manifest attributes: {}",
            outcome.plan.manifest.attributes().len()
        );
        return Ok(());
    }

    println!("   Dependencies resolved: {}", outcome.resolved.len());
    if !outcome.expanded.is_empty() {
        println!("   Descriptors expanded: {}", outcome.expanded.len());
    }
    if !outcome.renames.is_empty() {
        println!("   Resources relocated: {}", outcome.renames.len());
    }
    if !outcome.access_transformers.is_empty() {
        println!(
            "   Access transformers: {}",
            outcome
                .access_transformers
                .files(Stage::DeobfuscateMergedJarToSrg)
                .len()
        );
    }
    println!(
        "{} Wrote {} ({} entries)",
        emoji(&out, "✅", "[OK]"),
        highlight(&out, &outcome.plan.archive.display().to_string()),
        outcome.entries
    );
    if let Some(sources) = &outcome.sources_archive {
        println!("{} Wrote {}", emoji(&out, "✅", "[OK]"), sources.display());
    }
    Ok(())
}
