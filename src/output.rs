//! # Status Line Styling
//!
//! Commands print short status lines such as `[OK] Repository ...` or
//! `[BUILD] ExampleMod-1.12.2-1.0.0.jar`. When the terminal can show it,
//! the bracketed marker becomes an emoji and paths are bolded.
//!
//! `--color` picks the mode. In `auto` mode `NO_COLOR` and `TERM=dumb` turn
//! styling off; otherwise `console` decides from `CLICOLOR`,
//! `CLICOLOR_FORCE` and whether stdout is a terminal.
//!
//! ```rust
//! use mod_composer::output::{emoji, highlight, OutputConfig};
//!
//! let plain = OutputConfig::from_env_and_flag("never");
//! assert_eq!(emoji(&plain, "🔨", "[BUILD]"), "[BUILD]");
//! assert_eq!(highlight(&plain, "build/libs/ExampleMod.jar"), "build/libs/ExampleMod.jar");
//! ```

use std::env;

/// Whether status lines are styled
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve a `--color` value. Anything other than `always` or `never`
    /// (in any case) means auto-detect.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = if color_flag.eq_ignore_ascii_case("always") {
            true
        } else if color_flag.eq_ignore_ascii_case("never") {
            false
        } else {
            terminal_wants_color()
        };
        Self { use_color }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

fn terminal_wants_color() -> bool {
    let dumb = env::var("TERM").is_ok_and(|term| term == "dumb");
    env::var_os("NO_COLOR").is_none() && !dumb && console::colors_enabled()
}

/// `styled` when output is styled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, styled: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        styled
    } else {
        plain
    }
}

/// Bold `text` when output is styled.
pub fn highlight(config: &OutputConfig, text: &str) -> String {
    if !config.use_color {
        return text.to_string();
    }
    console::style(text).bold().force_styling(true).to_string()
}
