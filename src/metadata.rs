//! Build-time metadata injection
//!
//! Two outputs are derived from the feature set here: a generated Java source
//! unit exposing build constants (`VERSION` and any configured extras), and
//! `${token}` substitution inside a whitelist of descriptor resources such as
//! `mcmod.info` and `pack.mcmeta`. Both are recomputed on every build so a
//! version bump can never leave a stale constant or descriptor behind.

use crate::config::TagsConfig;
use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;
use crate::flags::FeatureSet;
use crate::path::file_name_matches;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the constant that always carries the mod version.
pub const VERSION_CONSTANT: &str = "VERSION";

/// Matches `${name}` and `$name`.
const TOKEN_PATTERN: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)";

/// One token and the value it expands to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSubstitution {
    pub token_name: String,
    pub value: String,
}

/// The tokens available to whitelisted descriptor files.
pub fn substitutions(features: &FeatureSet) -> Vec<TemplateSubstitution> {
    vec![
        TemplateSubstitution {
            token_name: "version".to_string(),
            value: features.mod_version.clone(),
        },
        TemplateSubstitution {
            token_name: "mcversion".to_string(),
            value: features.mc_version.clone(),
        },
    ]
}

/// Expand known tokens in `text`. Unknown tokens are left exactly as written.
pub fn expand(text: &str, substitutions: &[TemplateSubstitution]) -> Result<String> {
    let tokens: BTreeMap<&str, &str> = substitutions
        .iter()
        .map(|s| (s.token_name.as_str(), s.value.as_str()))
        .collect();
    let regex = Regex::new(TOKEN_PATTERN)?;

    let expanded = regex.replace_all(text, |caps: &Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        match tokens.get(name) {
            Some(value) => (*value).to_string(),
            None => caps[0].to_string(),
        }
    });
    Ok(expanded.into_owned())
}

/// Expand tokens in every resource whose file name matches one of the
/// `whitelist` globs. Returns the paths that were processed.
pub fn expand_resources(
    resources: &mut MemoryFS,
    whitelist: &[String],
    substitutions: &[TemplateSubstitution],
) -> Result<Vec<PathBuf>> {
    let mut expanded = Vec::new();
    for path in resources.list_files() {
        let mut matched = false;
        for pattern in whitelist {
            if file_name_matches(pattern, &path)? {
                matched = true;
                break;
            }
        }
        if !matched {
            continue;
        }

        let Some(file) = resources.get_file_mut(&path) else {
            continue;
        };
        let Some(text) = file.as_str() else {
            log::warn!("Not expanding {}: content is not UTF-8", path.display());
            continue;
        };
        let result = expand(text, substitutions)?;
        file.content = result.into_bytes();
        log::debug!("Expanded tokens in {}", path.display());
        expanded.push(path);
    }
    Ok(expanded)
}

/// A generated Java source unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    /// Fully-qualified class name
    pub class_name: String,
    /// Path relative to the generated-sources root
    pub relative_path: PathBuf,
    pub contents: String,
}

fn is_java_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn java_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Fully-qualified name of the tags class: the configured one, or
/// `<maven_group>.Tags`.
pub fn tags_class_name(features: &FeatureSet, config: &TagsConfig) -> String {
    config
        .class
        .clone()
        .unwrap_or_else(|| format!("{}.Tags", features.maven_group))
}

/// Generate the tags class source.
pub fn generate_tags(features: &FeatureSet, config: &TagsConfig) -> Result<GeneratedSource> {
    let class_name = tags_class_name(features, config);
    let segments: Vec<&str> = class_name.split('.').collect();
    if !segments.iter().all(|s| is_java_identifier(s)) {
        return Err(Error::ConfigParse {
            message: format!("'{}' is not a valid Java class name", class_name),
            hint: Some("Set tags.class or fix maven_group".to_string()),
        });
    }
    if config.values.contains_key(VERSION_CONSTANT) {
        return Err(Error::ConfigParse {
            message: format!("tags.values may not redefine {}", VERSION_CONSTANT),
            hint: Some("VERSION always comes from mod_version".to_string()),
        });
    }
    for name in config.values.keys() {
        if !is_java_identifier(name) {
            return Err(Error::ConfigParse {
                message: format!("Tag name '{}' is not a valid Java identifier", name),
                hint: None,
            });
        }
    }

    let (package, simple) = match segments.split_last() {
        Some((simple, package)) => (package.join("."), *simple),
        None => (String::new(), class_name.as_str()),
    };

    let mut contents = String::new();
    if !package.is_empty() {
        contents.push_str(&format!("package {};\n\n", package));
    }
    contents.push_str("// Auto generated by mod-composer\n");
    contents.push_str(&format!("public final class {} {{\n", simple));
    contents.push_str(&format!("    private {}() {{}}\n\n", simple));
    contents.push_str(&format!(
        "    public static final String {} = {};\n",
        VERSION_CONSTANT,
        java_string_literal(&features.mod_version)
    ));
    for (name, value) in &config.values {
        contents.push_str(&format!(
            "    public static final String {} = {};\n",
            name,
            java_string_literal(value)
        ));
    }
    contents.push_str("}\n");

    let mut relative_path: PathBuf = package.split('.').filter(|s| !s.is_empty()).collect();
    relative_path.push(format!("{}.java", simple));

    Ok(GeneratedSource {
        class_name,
        relative_path,
        contents,
    })
}

/// Write a generated source under `root`. The file is rewritten only when its
/// content differs; returns whether it was written.
pub fn write_generated(source: &GeneratedSource, root: &Path) -> Result<bool> {
    let target = root.join(&source.relative_path);
    if let Ok(existing) = fs::read_to_string(&target) {
        if existing == source.contents {
            log::debug!("{} is up to date", target.display());
            return Ok(false);
        }
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, &source.contents)?;
    log::info!("Generated {}", source.class_name);
    Ok(true)
}
