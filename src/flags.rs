//! # Build Flags
//!
//! A build is driven by a flat set of named properties, normally read from a
//! `gradle.properties`-style file and optionally overridden from the command
//! line. This module turns that bag of strings into two values:
//!
//! - **`FlagSet`**: the immutable, validated key/value map. Looking up a flag
//!   that is not present fails with `MissingConfigurationKey`; booleans are
//!   only ever `true` or `false` (case-insensitive).
//! - **`FeatureSet`**: the typed view every component consumes. It is resolved
//!   once from the `FlagSet` and passed by reference, so each component's
//!   output is a pure function of this one value.

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Flag names read by [`FeatureSet::resolve`].
pub mod keys {
    pub const MOD_VERSION: &str = "mod_version";
    pub const MAVEN_GROUP: &str = "maven_group";
    pub const ARCHIVES_BASE_NAME: &str = "archives_base_name";
    pub const USE_ACCESS_TRANSFORMER: &str = "use_access_transformer";
    pub const USE_MIXINS: &str = "use_mixins";
    pub const USE_COREMOD: &str = "use_coremod";
    pub const USE_ASSETMOVER: &str = "use_assetmover";
    pub const INCLUDE_MOD: &str = "include_mod";
    pub const COREMOD_PLUGIN_CLASS_NAME: &str = "coremod_plugin_class_name";
}

/// The value of a single flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Text(String),
    Bool(bool),
}

/// Immutable map of build properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    values: BTreeMap<String, FlagValue>,
}

impl FlagSet {
    /// Create an empty flag set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a Java-properties document. Keys end at the first unescaped
    /// `=`, `:` or whitespace; `#` and `!` start comments, a trailing `\`
    /// continues the line, and quotes are kept as part of the value.
    pub fn from_properties(content: &str) -> Result<Self> {
        let option = ini::ParseOption {
            enabled_quote: false,
            ..ini::ParseOption::default()
        };
        let document = ini::Ini::load_from_str_opt(&normalize_properties(content), option)?;
        let mut flags = Self::new();
        for (key, value) in document.general_section().iter() {
            flags.insert(key, value);
        }
        Ok(flags)
    }

    /// Load a properties file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigParse {
            message: format!("Cannot read properties file {}: {}", path.display(), e),
            hint: Some("Pass --properties or create gradle.properties".to_string()),
        })?;
        Self::from_properties(&content)
    }

    /// Set a text flag, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), FlagValue::Text(value.into()));
    }

    /// Set a boolean flag, replacing any previous value.
    pub fn insert_bool(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), FlagValue::Bool(value));
    }

    /// Builder-style [`FlagSet::insert`].
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    /// Apply `key=value` overrides on top of this set; later entries win.
    pub fn with_overrides<S: AsRef<str>>(mut self, overrides: &[S]) -> Result<Self> {
        for item in overrides {
            let item = item.as_ref();
            let (key, value) = item.split_once('=').ok_or_else(|| Error::InvalidFlagValue {
                key: item.to_string(),
                value: String::new(),
                expected: "a key=value override".to_string(),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::InvalidFlagValue {
                    key: item.to_string(),
                    value: value.to_string(),
                    expected: "a non-empty key".to_string(),
                });
            }
            self.insert(key, value.trim());
        }
        Ok(self)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn get(&self, key: &str) -> Result<&FlagValue> {
        self.values
            .get(key)
            .ok_or_else(|| Error::MissingConfigurationKey {
                key: key.to_string(),
            })
    }

    /// Read a flag as a string. Boolean flags render as `true`/`false`.
    pub fn string(&self, key: &str) -> Result<String> {
        match self.get(key)? {
            FlagValue::Text(text) => Ok(text.clone()),
            FlagValue::Bool(value) => Ok(value.to_string()),
        }
    }

    /// Read a flag as a boolean, accepting only `true`/`false` in any case.
    pub fn bool(&self, key: &str) -> Result<bool> {
        match self.get(key)? {
            FlagValue::Bool(value) => Ok(*value),
            FlagValue::Text(text) => parse_bool(key, text),
        }
    }
}

/// Rewrite properties syntax into the `key=value` lines the INI reader
/// accepts: logical lines are joined, comments dropped and the separator
/// made explicit.
fn normalize_properties(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut lines = content.lines();
    while let Some(first) = lines.next() {
        let mut line = first.trim_start().to_string();
        if line.starts_with('#') || line.starts_with('!') {
            out.push('\n');
            continue;
        }
        while ends_with_continuation(&line) {
            line.pop();
            match lines.next() {
                Some(next) => line.push_str(next.trim_start()),
                None => break,
            }
        }
        if !line.is_empty() {
            out.push_str(&unicode_escapes(&key_value_line(&line)));
        }
        out.push('\n');
    }
    out
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn is_properties_space(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\x0c'
}

fn key_value_line(line: &str) -> String {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return format!("{}={}", &line[..i], &line[i + 1..]),
            c if is_properties_space(c) => {
                let rest = line[i..].trim_start_matches(is_properties_space);
                let rest = rest
                    .strip_prefix(|c: char| c == '=' || c == ':')
                    .unwrap_or(rest);
                return format!("{}={}", &line[..i], rest);
            }
            _ => {}
        }
    }
    format!("{}=", line)
}

/// `\uXXXX` becomes the reader's `\xXXXX` form.
fn unicode_escapes(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '\\' {
            match chars.next() {
                Some('u') => out.push('x'),
                Some(next) => out.push(next),
                None => {}
            }
        }
    }
    out
}

fn parse_bool(key: &str, text: &str) -> Result<bool> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::InvalidFlagValue {
            key: key.to_string(),
            value: text.to_string(),
            expected: "true or false".to_string(),
        })
    }
}

/// Early-loaded plugin entry point settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coremod {
    /// Fully-qualified plugin class name
    pub plugin_class: String,
    /// Whether the coremod jar also contains a regular mod
    pub include_mod: bool,
}

/// Typed view of the flags, shared read-only by every component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSet {
    pub mod_version: String,
    pub maven_group: String,
    pub archives_base_name: String,
    /// Target platform version, from the project descriptor
    pub mc_version: String,
    pub coremod: Option<Coremod>,
    pub access_transformer: bool,
    /// Bytecode weaving (mixins)
    pub mixins: bool,
    pub assetmover: bool,
    /// Resolved values of every `when:` gate in the project descriptor
    pub gates: BTreeMap<String, bool>,
}

impl FeatureSet {
    /// Resolve the feature set, failing on the first missing or malformed
    /// flag. Flags are only required when they are consumed: the coremod
    /// plugin class and `include_mod` are read only if the coremod feature is
    /// on.
    pub fn resolve(flags: &FlagSet, project: &ProjectConfig) -> Result<Self> {
        let coremod = if flags.bool(keys::USE_COREMOD)? {
            Some(Coremod {
                plugin_class: flags.string(keys::COREMOD_PLUGIN_CLASS_NAME)?,
                include_mod: flags.bool(keys::INCLUDE_MOD)?,
            })
        } else {
            None
        };

        let mut gates = BTreeMap::new();
        for gate in project.gate_flags() {
            gates.insert(gate.to_string(), flags.bool(gate)?);
        }

        Ok(Self {
            mod_version: flags.string(keys::MOD_VERSION)?,
            maven_group: flags.string(keys::MAVEN_GROUP)?,
            archives_base_name: flags.string(keys::ARCHIVES_BASE_NAME)?,
            mc_version: project.minecraft.version.clone(),
            coremod,
            access_transformer: flags.bool(keys::USE_ACCESS_TRANSFORMER)?,
            mixins: flags.bool(keys::USE_MIXINS)?,
            assetmover: flags.bool(keys::USE_ASSETMOVER)?,
            gates,
        })
    }

    /// Whether a `when:` gate evaluated to true. Unknown gates are false,
    /// but [`FeatureSet::resolve`] guarantees every declared gate is present.
    pub fn gate(&self, name: &str) -> bool {
        self.gates.get(name).copied().unwrap_or(false)
    }
}

/// The task names a build was invoked with, in command-line order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub tasks: Vec<String>,
}

impl Invocation {
    pub fn new<S: Into<String>>(tasks: impl IntoIterator<Item = S>) -> Self {
        Self {
            tasks: tasks.into_iter().map(Into::into).collect(),
        }
    }

    /// The first invoked task, which decides whether this is a full build.
    pub fn first_task(&self) -> Option<&str> {
        self.tasks.first().map(String::as_str)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::base_flags;
    use super::*;

    #[test]
    fn test_from_properties() {
        let content = r#"
# Project identity
mod_version=2.1.0
maven_group = org.example.mymod
archives_base_name: ExampleMod
use_mixins=TRUE
"#;
        let flags = FlagSet::from_properties(content).unwrap();
        assert_eq!(flags.string("mod_version").unwrap(), "2.1.0");
        assert_eq!(flags.string("maven_group").unwrap(), "org.example.mymod");
        assert_eq!(flags.string("archives_base_name").unwrap(), "ExampleMod");
        assert!(flags.bool("use_mixins").unwrap());
    }

    #[test]
    fn test_properties_comments_and_quotes() {
        let content = "! generated\n# also a comment\nmod_version=\"1.0\"\n";
        let flags = FlagSet::from_properties(content).unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags.string("mod_version").unwrap(), "\"1.0\"");
    }

    #[test]
    fn test_properties_whitespace_separator() {
        let content = "mod_version 2.0\nmaven_group = org.example\nsnapshot\na b=c\n";
        let flags = FlagSet::from_properties(content).unwrap();
        assert_eq!(flags.string("mod_version").unwrap(), "2.0");
        assert_eq!(flags.string("maven_group").unwrap(), "org.example");
        assert_eq!(flags.string("snapshot").unwrap(), "");
        assert_eq!(flags.string("a").unwrap(), "b=c");
    }

    #[test]
    fn test_properties_continuations_and_escapes() {
        let content = r"description=one, \
    two
tools=C:\\tools
title=caf\u00e9
";
        let flags = FlagSet::from_properties(content).unwrap();
        assert_eq!(flags.string("description").unwrap(), "one, two");
        assert_eq!(flags.string("tools").unwrap(), r"C:\tools");
        assert_eq!(flags.string("title").unwrap(), "caf\u{e9}");
    }

    #[test]
    fn test_missing_key_is_named() {
        let flags = FlagSet::new();
        let err = flags.string("mod_version").unwrap_err();
        assert!(
            matches!(err, Error::MissingConfigurationKey { ref key } if key == "mod_version")
        );
    }

    #[test]
    fn test_bool_parsing() {
        let flags = FlagSet::new()
            .with("a", "true")
            .with("b", "False")
            .with("c", "yes")
            .with("d", "1");
        assert!(flags.bool("a").unwrap());
        assert!(!flags.bool("b").unwrap());
        assert!(matches!(
            flags.bool("c"),
            Err(Error::InvalidFlagValue { ref key, .. }) if key == "c"
        ));
        assert!(flags.bool("d").is_err());
    }

    #[test]
    fn test_bool_flag_renders_as_string() {
        let mut flags = FlagSet::new();
        flags.insert_bool("use_mixins", true);
        assert!(flags.bool("use_mixins").unwrap());
        assert_eq!(flags.string("use_mixins").unwrap(), "true");
    }

    #[test]
    fn test_overrides_win() {
        let flags = base_flags()
            .with_overrides(&["mod_version=9.9.9", "use_mixins = true"])
            .unwrap();
        assert_eq!(flags.string("mod_version").unwrap(), "9.9.9");
        assert!(flags.bool("use_mixins").unwrap());
    }

    #[test]
    fn test_override_without_equals_fails() {
        let err = FlagSet::new().with_overrides(&["use_mixins"]).unwrap_err();
        assert!(matches!(err, Error::InvalidFlagValue { .. }));
    }

    #[test]
    fn test_resolve_plain_features() {
        let features = FeatureSet::resolve(&base_flags(), &ProjectConfig::default()).unwrap();
        assert_eq!(features.mod_version, "1.0.0");
        assert_eq!(features.mc_version, "1.12.2");
        assert!(features.coremod.is_none());
        assert!(!features.mixins);
    }

    #[test]
    fn test_coremod_flags_required_only_when_enabled() {
        // Plugin class and include_mod are not consumed while the coremod is off
        assert!(FeatureSet::resolve(&base_flags(), &ProjectConfig::default()).is_ok());

        let flags = base_flags().with(keys::USE_COREMOD, "true");
        let err = FeatureSet::resolve(&flags, &ProjectConfig::default()).unwrap_err();
        assert!(err.to_string().contains(keys::COREMOD_PLUGIN_CLASS_NAME));

        let flags = flags
            .with(keys::COREMOD_PLUGIN_CLASS_NAME, "org.example.mymod.core.Plugin")
            .with(keys::INCLUDE_MOD, "true");
        let features = FeatureSet::resolve(&flags, &ProjectConfig::default()).unwrap();
        assert_eq!(
            features.coremod,
            Some(Coremod {
                plugin_class: "org.example.mymod.core.Plugin".to_string(),
                include_mod: true,
            })
        );
    }

    #[test]
    fn test_gates_must_be_present() {
        let project = crate::config::parse(
            "dependencies:\n  - compile-only: mezz.jei:jei_1.12.2:4.16.1.301\n    when: use_jei\n",
        )
        .unwrap();
        let err = FeatureSet::resolve(&base_flags(), &project).unwrap_err();
        assert!(matches!(err, Error::MissingConfigurationKey { ref key } if key == "use_jei"));

        let features =
            FeatureSet::resolve(&base_flags().with("use_jei", "true"), &project).unwrap();
        assert!(features.gate("use_jei"));
    }

    #[test]
    fn test_invocation_first_task() {
        assert_eq!(Invocation::new(["build", "runClient"]).first_task(), Some("build"));
        assert_eq!(Invocation::new(Vec::<String>::new()).first_task(), None);
    }
}
