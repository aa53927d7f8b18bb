//! Writing build outputs to disk
//!
//! Everything the pipeline produces goes through here, after the join
//! barrier and on a single thread:
//!
//! - **Archives**: a staged [`MemoryFS`] is written as a zip/jar. The
//!   manifest comes first, every other entry follows in path order, and all
//!   entries carry the same fixed timestamp, so identical inputs give
//!   byte-identical archives. The archive is written to `<name>.tmp` and
//!   renamed into place; on failure the temporary file is removed, so a
//!   final archive on disk is always complete.
//! - **Trees**: a [`MemoryFS`] written file by file under a directory, with
//!   permissions preserved on Unix.
//! - **Reports**: pretty-printed JSON.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;
use crate::manifest::MANIFEST_PATH;
use crate::path::to_archive_path;

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Delete a previous archive so a failed build cannot leave it looking
/// current. Returns whether anything was removed.
pub fn remove_stale(target: &Path) -> Result<bool> {
    let mut removed = false;
    for path in [target.to_path_buf(), temp_path(target)] {
        if path.is_file() {
            fs::remove_file(&path)?;
            log::debug!("Removed stale {}", path.display());
            removed = true;
        }
    }
    Ok(removed)
}

fn write_entries(contents: &MemoryFS, file: fs::File) -> Result<()> {
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let manifest = contents.get_file(MANIFEST_PATH);
    if let Some(manifest) = manifest {
        zip.add_directory("META-INF/", options)?;
        zip.start_file(MANIFEST_PATH, options.unix_permissions(manifest.permissions))?;
        zip.write_all(&manifest.content)?;
    }

    for (path, file) in contents.files() {
        let name = to_archive_path(path);
        if name == MANIFEST_PATH {
            continue;
        }
        zip.start_file(name, options.unix_permissions(file.permissions))?;
        zip.write_all(&file.content)?;
    }

    zip.finish()?;
    Ok(())
}

/// Write `contents` as a jar at `target`, atomically.
pub fn write_archive(contents: &MemoryFS, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(target);

    let result = fs::File::create(&tmp)
        .map_err(Error::from)
        .and_then(|file| write_entries(contents, file))
        .and_then(|()| fs::rename(&tmp, target).map_err(Error::from));

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(Error::ArchiveAssembly {
            path: target.to_path_buf(),
            message: e.to_string(),
        });
    }

    log::info!("Wrote {} ({} entries)", target.display(), contents.len());
    Ok(())
}

/// Write every file of `tree` under `output_path`.
pub fn write_tree(tree: &MemoryFS, output_path: &Path) -> Result<()> {
    for (relative_path, file) in tree.files() {
        let full_path = output_path.join(relative_path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, &file.content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, fs::Permissions::from_mode(file.permissions))?;
        }
    }
    Ok(())
}

/// Write `value` as pretty JSON at `path`.
pub fn write_report<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)?;
    log::debug!("Wrote report {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::File;
    use std::io::Read;
    use tempfile::TempDir;

    fn staged() -> MemoryFS {
        let mut fs = MemoryFS::new();
        fs.add_file_string("org/example/Mod.class", "mod").unwrap();
        fs.add_file_string("Assets/upper.txt", "upper").unwrap();
        fs.add_file_string(MANIFEST_PATH, "Manifest-Version: 1.0\r\n\r\n")
            .unwrap();
        fs
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_write_archive_orders_entries() {
        let temp = TempDir::new().unwrap();
        let jar = temp.path().join("libs/ExampleMod-1.12.2-1.0.0.jar");

        write_archive(&staged(), &jar).unwrap();

        assert!(jar.is_file());
        assert!(!temp_path(&jar).exists());
        assert_eq!(
            entry_names(&jar),
            vec![
                "META-INF/",
                "META-INF/MANIFEST.MF",
                "Assets/upper.txt",
                "org/example/Mod.class"
            ]
        );

        let mut archive = zip::ZipArchive::new(fs::File::open(&jar).unwrap()).unwrap();
        let mut content = String::new();
        archive
            .by_name("org/example/Mod.class")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "mod");
    }

    #[test]
    fn test_write_archive_is_reproducible() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("a.jar");
        let second = temp.path().join("b.jar");

        write_archive(&staged(), &first).unwrap();
        write_archive(&staged(), &second).unwrap();

        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
    }

    #[test]
    fn test_failed_write_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out.jar");
        // A directory at the temp path makes the create fail.
        fs::create_dir_all(temp_path(&target)).unwrap();

        let err = write_archive(&staged(), &target).unwrap_err();
        assert!(matches!(err, Error::ArchiveAssembly { .. }));
        assert!(!target.exists());
    }

    #[test]
    fn test_remove_stale() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out.jar");
        assert!(!remove_stale(&target).unwrap());

        fs::write(&target, "old").unwrap();
        fs::write(temp_path(&target), "partial").unwrap();
        assert!(remove_stale(&target).unwrap());
        assert!(!target.exists());
        assert!(!temp_path(&target).exists());
    }

    #[test]
    fn test_write_tree_nested() {
        let temp = TempDir::new().unwrap();
        let mut tree = MemoryFS::new();
        tree.add_file_string("runConfigurations/Run_Client.xml", "<component/>")
            .unwrap();

        write_tree(&tree, temp.path()).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("runConfigurations/Run_Client.xml")).unwrap(),
            "<component/>"
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_write_tree_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let mut tree = MemoryFS::new();
        let mut file = File::from_string("#!/bin/sh\n");
        file.permissions = 0o755;
        tree.add_file("gradlew", file).unwrap();

        write_tree(&tree, temp.path()).unwrap();
        let mode = fs::metadata(temp.path().join("gradlew"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_write_report() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reports/out.json");
        write_report(&vec!["a", "b"], &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!(["a", "b"]));
    }
}
