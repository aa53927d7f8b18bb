//! # Tags Command Implementation
//!
//! Regenerates the build tags source under
//! `<build>/generated/sources/injectTags`. The file is only rewritten when
//! its content changed, so running this repeatedly does not disturb
//! incremental Java compilation.

use anyhow::Result;
use clap::Args;

use mod_composer::flags::FeatureSet;
use mod_composer::metadata;
use mod_composer::output::emoji;
use mod_composer::phases::BuildPaths;

use super::Context;

/// Regenerate the build tags source
#[derive(Args, Debug)]
pub struct TagsArgs {}

/// Execute the `tags` command.
pub fn execute(_args: TagsArgs, context: &Context) -> Result<()> {
    let out = context.output();
    let flags = context.load_flags()?;
    let project = context.load_project()?;
    let features = FeatureSet::resolve(&flags, &project)?;
    let paths = BuildPaths::new(&context.project_dir, &project.layout);

    let source = metadata::generate_tags(&features, &project.tags)?;
    let target = paths.generated_sources.join(&source.relative_path);
    if metadata::write_generated(&source, &paths.generated_sources)? {
        println!(
            "{} Generated {} at {}",
            emoji(&out, "✅", "[OK]"),
            source.class_name,
            target.display()
        );
    } else {
        println!(
            "{} {} is up to date",
            emoji(&out, "✅", "[OK]"),
            target.display()
        );
    }
    Ok(())
}
