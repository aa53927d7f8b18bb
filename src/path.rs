//! Path manipulation utilities for mod-composer

use crate::error::{Error, Result};
use glob::Pattern;
use regex::Regex;
use std::path::Path;

/// Match a file's name (not its directory) against a glob pattern
pub fn file_name_matches(pattern: &str, path: &Path) -> Result<bool> {
    let pattern = Pattern::new(pattern).map_err(Error::Glob)?;
    Ok(path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| pattern.matches(name)))
}

/// Render a relative path with `/` separators, as stored inside archives.
pub fn to_archive_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Apply a regex-based rename with capture groups
///
/// The `replacement` can reference capture groups using $1, $2, etc.
///
/// Returns the new path if the pattern matches, None if it doesn't match.
pub fn regex_rename(regex: &Regex, replacement: &str, path: &str) -> Option<String> {
    let captures = regex.captures(path)?;
    let mut result = String::new();
    let mut chars = replacement.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            if let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                chars.next();
                if let Some(capture) = captures.get(digit as usize) {
                    result.push_str(capture.as_str());
                }
                continue;
            }
        }
        result.push(ch);
    }

    Some(result)
}

/// Encode a URL path to be filesystem-safe
///
/// This converts URL characters that are problematic for filesystems
/// into safe alternatives.
pub fn encode_url_path(url: &str) -> String {
    url.chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect()
}
