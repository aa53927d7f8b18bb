//! In-memory filesystem used to stage archive contents
//!
//! Paths are relative and kept in a sorted map, so iterating a `MemoryFS`
//! always yields entries in the same order and archives built from it are
//! reproducible.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Represents a file with content and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
    /// Unix permission bits
    pub permissions: u32,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            permissions: 0o644,
        }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Content as UTF-8, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// In-memory filesystem for staging archive contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFS {
    files: BTreeMap<PathBuf, File>,
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every regular file under `root`, keyed by its path relative to
    /// `root`. A missing root yields an empty filesystem.
    pub fn from_dir(root: &Path) -> Result<Self> {
        let mut fs = Self::new();
        if !root.exists() {
            return Ok(fs);
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| Error::ArchiveAssembly {
                    path: entry.path().to_path_buf(),
                    message: e.to_string(),
                })?;
            let content = std::fs::read(entry.path())?;
            fs.add_file(relative, File::new(content))?;
        }
        Ok(fs)
    }

    /// Expand a zip/jar archive. Directory entries and entries that would
    /// escape the archive root are skipped.
    pub fn from_archive(archive_path: &Path) -> Result<Self> {
        let file = std::fs::File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut fs = Self::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
                log::warn!(
                    "Skipping unsafe entry '{}' in {}",
                    entry.name(),
                    archive_path.display()
                );
                continue;
            };
            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            let mut file = File::new(content);
            if let Some(mode) = entry.unix_mode() {
                file.permissions = mode & 0o777;
            }
            fs.add_file(relative, file)?;
        }
        Ok(fs)
    }

    /// Add or update a file. Absolute paths are rejected.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, file: File) -> Result<()> {
        let path = path.as_ref();
        if path.is_absolute() {
            return Err(Error::ArchiveAssembly {
                path: path.to_path_buf(),
                message: "archive entries must be relative".to_string(),
            });
        }
        self.files.insert(path.to_path_buf(), file);
        Ok(())
    }

    /// Add a file with content
    pub fn add_file_content<P: AsRef<Path>>(&mut self, path: P, content: Vec<u8>) -> Result<()> {
        self.add_file(path, File::new(content))
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) -> Result<()> {
        self.add_file(path, File::from_string(content))
    }

    /// Get a file by path
    pub fn get_file<P: AsRef<Path>>(&self, path: P) -> Option<&File> {
        self.files.get(path.as_ref())
    }

    /// Get a mutable file by path
    pub fn get_file_mut<P: AsRef<Path>>(&mut self, path: P) -> Option<&mut File> {
        self.files.get_mut(path.as_ref())
    }

    /// Remove a file, returning it if it was present
    pub fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Option<File> {
        self.files.remove(path.as_ref())
    }

    /// Check if a file exists
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.files.contains_key(path.as_ref())
    }

    /// List all files, sorted
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    /// Rename a file
    pub fn rename_file<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        let from_path = from.as_ref();
        let to_path = to.as_ref();

        if let Some(file) = self.files.remove(from_path) {
            self.files.insert(to_path.to_path_buf(), file);
            Ok(())
        } else {
            Err(Error::ArchiveAssembly {
                path: from_path.to_path_buf(),
                message: "file not found for rename".to_string(),
            })
        }
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if filesystem is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Merge another filesystem into this one (last-write-wins). Returns the
    /// paths that were overwritten with different content.
    pub fn merge(&mut self, other: &MemoryFS) -> Vec<PathBuf> {
        let mut collisions = Vec::new();
        for (path, file) in &other.files {
            if let Some(previous) = self.files.insert(path.clone(), file.clone()) {
                if previous.content != file.content {
                    collisions.push(path.clone());
                }
            }
        }
        collisions
    }

    /// Iterate over all files as (path, file) pairs, sorted by path
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &File)> {
        self.files.iter()
    }
}
