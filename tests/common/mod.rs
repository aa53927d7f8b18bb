//! Shared test utilities for CLI E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_properties(props::PLAIN);
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{props, read_entry, TestFixture};
}

/// Common `gradle.properties` contents.
#[allow(dead_code)]
pub mod props {
    /// Every optional feature off.
    pub const PLAIN: &str = "\
mod_version=1.0.0
maven_group=org.example.mymod
archives_base_name=ExampleMod
use_coremod=false
use_access_transformer=false
use_mixins=false
use_assetmover=false
";

    /// Coremod that also carries a regular mod, plus access transformers.
    pub const COREMOD: &str = "\
mod_version=1.0.0
maven_group=org.example.mymod
archives_base_name=ExampleMod
use_coremod=true
include_mod=true
coremod_plugin_class_name=org.example.mymod.core.LoadingPlugin
use_access_transformer=true
use_mixins=false
use_assetmover=false
";
}

/// A temporary mod project.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new fixture with an empty project directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `gradle.properties`.
    pub fn with_properties(self, content: &str) -> Self {
        self.with_file("gradle.properties", content)
    }

    /// Write `mod-composer.yaml`.
    pub fn with_descriptor(self, content: &str) -> Self {
        self.with_file("mod-composer.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Compiled classes and resources, as the external compiler would
    /// leave them.
    pub fn with_sources(self) -> Self {
        self.with_file(
            "build/classes/java/main/org/example/mymod/ExampleMod.class",
            "class",
        )
        .with_file(
            "src/main/resources/mcmod.info",
            r#"[{"modid": "examplemod", "version": "${version}", "mcversion": "${mcversion}"}]"#,
        )
        .with_file("src/main/resources/examplemod_at.cfg", "public net.minecraft.a")
    }

    /// A jar in the fixture's `repo/` maven directory.
    pub fn with_repo_jar(self, group: &str, name: &str, version: &str, entries: &[(&str, &str)]) -> Self {
        let path = self
            .path()
            .join("repo")
            .join(group.replace('.', "/"))
            .join(name)
            .join(version)
            .join(format!("{}-{}.jar", name, version));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut zip = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
        for (entry, content) in entries {
            zip.start_file(*entry, zip::write::FileOptions::default())
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        self
    }

    /// Get the path to the project directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the project directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// The main archive for the default flags.
    pub fn archive(&self) -> PathBuf {
        self.path().join("build/libs/ExampleMod-1.12.2-1.0.0.jar")
    }

    /// Create a command running in the project directory, with plain output
    /// and mirrors kept inside the fixture.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mod-composer");
        cmd.current_dir(self.path())
            .env("MOD_COMPOSER_MIRRORS", self.path().join("mirrors"))
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one entry of a jar as text.
#[allow(dead_code)]
pub fn read_entry(jar: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(jar).unwrap()).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}
