//! Manifest composition
//!
//! The jar manifest is derived from the [`FeatureSet`] and the invoked task
//! list only. Attributes keep insertion order so rendering is stable, and a
//! second insertion of an existing key is accepted only when the value is
//! identical.

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::flags::{FeatureSet, Invocation};
use serde::Serialize;

/// Entry point class of an early-loaded plugin.
pub const CORE_PLUGIN: &str = "FMLCorePlugin";
/// The coremod jar also carries a regular mod.
pub const CONTAINS_MOD: &str = "FMLCorePluginContainsFMLMod";
/// Whether the archive came from a full build.
pub const FORCE_LOAD_AS_MOD: &str = "ForceLoadAsMod";
/// Access transformer file name, relative to `META-INF/`.
pub const ACCESS_TRANSFORMER: &str = "FMLAT";

/// Task name that counts as a full build.
pub const FULL_BUILD_TASK: &str = "build";

/// Archive path of the rendered manifest.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

const MAX_LINE_BYTES: usize = 72;

/// File name the access transformer attribute points at.
pub fn access_transformer_file(archives_base_name: &str) -> String {
    format!("{}_at.cfg", archives_base_name.to_lowercase())
}

/// Ordered manifest attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute. Re-adding a key with the same value is a no-op; a
    /// different value is a conflict.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        if let Some((_, existing)) = self.attributes.iter().find(|(k, _)| k == key) {
            if *existing == value {
                return Ok(());
            }
            return Err(Error::ManifestAttributeConflict {
                key: key.to_string(),
                existing: existing.clone(),
                incoming: value,
            });
        }
        self.attributes.push((key.to_string(), value));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Render as `META-INF/MANIFEST.MF` content: `Manifest-Version` first,
    /// CRLF line endings, lines wrapped at 72 bytes with a leading space on
    /// continuations, and a terminating blank line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        push_header(&mut out, "Manifest-Version", "1.0");
        for (key, value) in &self.attributes {
            push_header(&mut out, key, value);
        }
        out.push_str("\r\n");
        out
    }
}

fn push_header(out: &mut String, key: &str, value: &str) {
    let line = format!("{}: {}", key, value);
    let mut chunk = String::new();
    let mut limit = MAX_LINE_BYTES;
    for c in line.chars() {
        if chunk.len() + c.len_utf8() > limit {
            out.push_str(&chunk);
            out.push_str("\r\n ");
            chunk.clear();
            limit = MAX_LINE_BYTES - 1;
        }
        chunk.push(c);
    }
    out.push_str(&chunk);
    out.push_str("\r\n");
}

/// Derive the manifest for one build.
pub fn compose(
    features: &FeatureSet,
    invocation: &Invocation,
    project: &ProjectConfig,
) -> Result<Manifest> {
    let mut manifest = Manifest::new();

    if let Some(coremod) = &features.coremod {
        manifest.insert(CORE_PLUGIN, coremod.plugin_class.clone())?;
        if coremod.include_mod {
            manifest.insert(CONTAINS_MOD, "true")?;
            // Only the first task is considered, so `clean build` is not a
            // full build.
            let full_build = invocation.first_task() == Some(FULL_BUILD_TASK);
            manifest.insert(FORCE_LOAD_AS_MOD, full_build.to_string())?;
        }
    }

    if features.access_transformer {
        manifest.insert(
            ACCESS_TRANSFORMER,
            access_transformer_file(&features.archives_base_name),
        )?;
    }

    for (key, value) in &project.manifest {
        manifest.insert(key, value.clone())?;
    }

    log::debug!("Composed manifest with {} attributes", manifest.attributes.len());
    Ok(manifest)
}
