//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, Context};

/// Mod Composer - Build orchestration for flag-driven mod bundles
#[derive(Parser, Debug)]
#[command(name = "mod-composer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace). RUST_LOG takes
    /// precedence when set.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Project directory
    #[arg(
        short = 'C',
        long,
        global = true,
        value_name = "DIR",
        default_value = "."
    )]
    project_dir: PathBuf,

    /// Properties file holding the build flags, relative to the project
    /// directory [default: gradle.properties]
    #[arg(long, global = true, value_name = "FILE")]
    properties: Option<PathBuf>,

    /// Override a build flag (repeatable, later wins)
    #[arg(short = 'P', global = true, value_name = "KEY=VALUE")]
    property: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the mod archive
    Build(commands::build::BuildArgs),

    /// Show what a build would produce without producing it
    Plan(commands::plan::PlanArgs),

    /// Regenerate the build tags source
    Tags(commands::tags::TagsArgs),

    /// Write IDE run profiles
    RunProfiles(commands::run_profiles::RunProfilesArgs),

    /// Check the flags and project descriptor
    Validate(commands::validate::ValidateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format_timestamp(None);
    let _ = builder.try_init();
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let context = Context {
            project_dir: self.project_dir,
            properties: self.properties,
            overrides: self.property,
            color: self.color,
        };

        match self.command {
            Commands::Build(args) => commands::build::execute(args, &context),
            Commands::Plan(args) => commands::plan::execute(args, &context),
            Commands::Tags(args) => commands::tags::execute(args, &context),
            Commands::RunProfiles(args) => commands::run_profiles::execute(args, &context),
            Commands::Validate(args) => commands::validate::execute(args, &context),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
