//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `mod-composer` command-line tool. Each subcommand is defined in its own
//! file to keep the logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the shared
//!   [`Context`] and performs the command's logic.
//!
//! The `execute` function is the main entry point for the command and is
//! responsible for orchestrating the necessary operations, calling into the
//! `mod_composer` library to perform the core logic.

use anyhow::{Context as _, Result};
use std::path::PathBuf;

use mod_composer::config::{self, ProjectConfig};
use mod_composer::defaults::PROPERTIES_FILE;
use mod_composer::flags::FlagSet;
use mod_composer::output::OutputConfig;

pub mod build;
pub mod completions;
pub mod plan;
pub mod run_profiles;
pub mod tags;
pub mod validate;

/// Options shared by every project-level command
#[derive(Debug, Clone)]
pub struct Context {
    pub project_dir: PathBuf,
    /// Explicit properties file; the default one is optional
    pub properties: Option<PathBuf>,
    /// `-P key=value` overrides, in command-line order
    pub overrides: Vec<String>,
    pub color: String,
}

impl Context {
    pub fn output(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }

    /// Load the flags: the properties file, then `-P` overrides on top. A
    /// missing default properties file is treated as empty; an explicitly
    /// named one must exist.
    pub fn load_flags(&self) -> Result<FlagSet> {
        let flags = match &self.properties {
            Some(file) => {
                let path = self.project_dir.join(file);
                FlagSet::from_file(&path)
                    .with_context(|| format!("Failed to load flags from {}", path.display()))?
            }
            None => {
                let path = self.project_dir.join(PROPERTIES_FILE);
                if path.is_file() {
                    FlagSet::from_file(&path)
                        .with_context(|| format!("Failed to load flags from {}", path.display()))?
                } else {
                    log::debug!("No {} found, using command-line flags only", PROPERTIES_FILE);
                    FlagSet::new()
                }
            }
        };
        Ok(flags.with_overrides(&self.overrides)?)
    }

    /// Load `mod-composer.yaml`, or defaults when the project has none.
    pub fn load_project(&self) -> Result<ProjectConfig> {
        config::load(&self.project_dir).with_context(|| {
            format!(
                "Failed to load {}",
                self.project_dir.join(config::PROJECT_FILE).display()
            )
        })
    }
}
