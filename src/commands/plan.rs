//! # Plan Command Implementation
//!
//! Prints everything a build derives from the flags (feature set, dependency
//! plan with per-declaration source priority, manifest attributes, tags class,
//! archive path and development JVM arguments) without reading build inputs
//! or writing anything. This is a safe, read-only operation.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;

use mod_composer::defaults::DEFAULT_TASK;
use mod_composer::dependencies::Origin;
use mod_composer::flags::Invocation;
use mod_composer::output::emoji;
use mod_composer::phases::orchestrator::{self, BuildPlan};
use mod_composer::phases::BuildPaths;
use mod_composer::run_profiles;

use super::Context;

/// Output format for `plan`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    Text,
    Json,
}

/// Show what a build would produce
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Task name the build would be invoked for (repeatable)
    #[arg(long = "task", value_name = "NAME", default_value = DEFAULT_TASK)]
    pub tasks: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: PlanFormat,
}

#[derive(Serialize)]
struct PlanReport<'a> {
    #[serde(flatten)]
    plan: &'a BuildPlan,
    jvm_args: Vec<String>,
}

fn origin_label(origin: &Origin) -> String {
    match origin {
        Origin::Project => "project".to_string(),
        Origin::Feature(feature) => format!("{:?}", feature).to_lowercase(),
        Origin::Companion(feature) => format!("{:?} companion", feature).to_lowercase(),
    }
}

/// Execute the `plan` command.
pub fn execute(args: PlanArgs, context: &Context) -> Result<()> {
    let flags = context.load_flags()?;
    let project = context.load_project()?;
    let invocation = Invocation::new(args.tasks);
    let paths = BuildPaths::new(&context.project_dir, &project.layout);

    let plan = orchestrator::prepare(&flags, &project, &invocation, &paths)?;
    let jvm_args = run_profiles::jvm_args(&plan.features);

    if args.format == PlanFormat::Json {
        let report = PlanReport {
            plan: &plan,
            jvm_args,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let out = context.output();
    let features = &plan.features;
    println!(
        "{} {} {} for Minecraft {}",
        emoji(&out, "📋", "[PLAN]"),
        features.archives_base_name,
        features.mod_version,
        features.mc_version
    );
    println!("   Archive: {}", plan.archive.display());
    println!("   Tags class: {}", plan.tags_class);
    println!(
        "   Coremod: {}",
        features
            .coremod
            .as_ref()
            .map(|c| c.plugin_class.as_str())
            .unwrap_or("off")
    );
    println!("   Access transformer: {}", features.access_transformer);
    println!("   Mixins: {}", features.mixins);
    println!("   Asset mover: {}", features.assetmover);

    println!("\n{} Dependencies:", emoji(&out, "📦", "[DEPS]"));
    if plan.dependencies.is_empty() {
        println!("   (none)");
    }
    for declaration in &plan.dependencies {
        let transitive = if declaration.transitive {
            ""
        } else {
            " (non-transitive)"
        };
        println!(
            "   {} {}{} [{}]",
            declaration.scope,
            declaration.artifact,
            transitive,
            origin_label(&declaration.origin)
        );
        if !declaration.sources.is_empty() {
            println!("      sources: {}", declaration.sources.join(", "));
        }
    }

    println!("\n{} Manifest:", emoji(&out, "📝", "[MANIFEST]"));
    if plan.manifest.is_empty() {
        println!("   (no attributes)");
    }
    for (key, value) in plan.manifest.attributes() {
        println!("   {}: {}", key, value);
    }

    println!("\n{} JVM arguments:", emoji(&out, "☕", "[JVM]"));
    for arg in &jvm_args {
        println!("   {}", arg);
    }
    Ok(())
}
