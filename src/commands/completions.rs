//! `completions`: print a completion script for bash, zsh, fish, powershell
//! or elvish.
//!
//! ```bash
//! mod-composer completions bash > ~/.local/share/bash-completion/completions/mod-composer
//! mod-composer completions zsh > ~/.zfunc/_mod-composer
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::Shell;
use std::io;

use crate::cli::Cli;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the script for the chosen shell to stdout.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, bin_name, &mut io::stdout());
    Ok(())
}
