//! # Run Profiles Command Implementation
//!
//! Emits the four fixed IDE run profiles. XML output is written as IntelliJ
//! shared run configurations (by default into `.idea/runConfigurations`);
//! JSON output goes to stdout unless an output directory is given.

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use mod_composer::filesystem::MemoryFS;
use mod_composer::output::emoji;
use mod_composer::phases::write;
use mod_composer::run_profiles::{self, RUN_CONFIGURATIONS_DIR};

use super::Context;

/// Output format for run profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileFormat {
    Xml,
    Json,
}

/// Write IDE run profiles
#[derive(Args, Debug)]
pub struct RunProfilesArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "xml")]
    pub format: ProfileFormat,

    /// Output directory, relative to the project directory
    /// [default: .idea/runConfigurations for xml, stdout for json]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Execute the `run-profiles` command.
pub fn execute(args: RunProfilesArgs, context: &Context) -> Result<()> {
    let out = context.output();

    match (args.format, args.output) {
        (ProfileFormat::Json, None) => {
            println!("{}", run_profiles::to_json()?);
        }
        (ProfileFormat::Json, Some(dir)) => {
            let dir = context.project_dir.join(dir);
            let mut tree = MemoryFS::new();
            tree.add_file_string("run-profiles.json", &run_profiles::to_json()?)?;
            write::write_tree(&tree, &dir)?;
            println!(
                "{} Wrote {}",
                emoji(&out, "✅", "[OK]"),
                dir.join("run-profiles.json").display()
            );
        }
        (ProfileFormat::Xml, output) => {
            let dir = context
                .project_dir
                .join(output.unwrap_or_else(|| PathBuf::from(RUN_CONFIGURATIONS_DIR)));
            let tree = run_profiles::xml_tree()?;
            write::write_tree(&tree, &dir)?;
            for path in tree.list_files() {
                println!(
                    "{} Wrote {}",
                    emoji(&out, "✅", "[OK]"),
                    dir.join(path).display()
                );
            }
        }
    }
    Ok(())
}
