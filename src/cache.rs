//! Content-addressed project artifact cache
//!
//! Artifacts are stored once under `blobs/<aa>/<sha256>` and found through a
//! per-coordinate index entry holding the digest. The cache is always the
//! last source the resolver tries, so a host that has the artifact is
//! preferred and updates on the hosts are picked up before the cached copy is
//! used. Whenever a host provides an artifact it is written through here.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use sha2::{Digest, Sha256};

use crate::dependencies::Coordinate;
use crate::error::{Error, Result};
use crate::path::encode_url_path;

/// Hex-encoded SHA-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Per-project artifact cache
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    /// Source identifier used in dependency plans.
    pub const ID: &'static str = "project-cache";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.root
            .join("index")
            .join(encode_url_path(&coordinate.to_string()))
    }

    fn blob_path(&self, digest: &str) -> PathBuf {
        let shard = digest.get(..2).unwrap_or("00");
        self.root.join("blobs").join(shard).join(digest)
    }

    /// Find a cached artifact. Entries whose blob is missing or no longer
    /// matches its digest are treated as absent.
    pub fn lookup(&self, coordinate: &Coordinate) -> Result<Option<PathBuf>> {
        let index = self.index_path(coordinate);
        if !index.is_file() {
            return Ok(None);
        }
        let expected = fs::read_to_string(&index)?.trim().to_string();
        let blob = self.blob_path(&expected);
        if !blob.is_file() {
            log::warn!("Cache index for {} points at a missing blob", coordinate);
            return Ok(None);
        }
        let actual = digest(&fs::read(&blob)?);
        if actual != expected {
            log::warn!(
                "Cached artifact for {} is corrupt (expected {}, found {})",
                coordinate,
                expected,
                actual
            );
            return Ok(None);
        }
        Ok(Some(blob))
    }

    /// Store `artifact` under its content digest and index it by coordinate.
    pub fn store(&self, coordinate: &Coordinate, artifact: &Path) -> Result<PathBuf> {
        let bytes = fs::read(artifact).map_err(|e| Error::ArchiveAssembly {
            path: artifact.to_path_buf(),
            message: format!("cannot read artifact for caching: {}", e),
        })?;
        let hash = digest(&bytes);
        let blob = self.blob_path(&hash);

        if !blob.is_file() {
            write_atomic(&blob, &bytes)?;
        }
        write_atomic(&self.index_path(coordinate), hash.as_bytes())?;
        log::debug!("Cached {} as {}", coordinate, hash);
        Ok(blob)
    }
}

/// Write via a sibling temporary file and rename, so readers never observe a
/// partially written entry.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(
        ".{}-{}.tmp",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn coordinate() -> Coordinate {
        Coordinate::parse("zone.rong:mixinbooter:8.1").unwrap()
    }

    #[test]
    fn test_digest_is_sha256_hex() {
        assert_eq!(
            digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_store_then_lookup() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("mixinbooter-8.1.jar");
        fs::write(&artifact, b"jar bytes").unwrap();

        let cache = ArtifactCache::new(temp.path().join("cache"));
        assert!(cache.lookup(&coordinate()).unwrap().is_none());

        let stored = cache.store(&coordinate(), &artifact).unwrap();
        assert_eq!(cache.lookup(&coordinate()).unwrap(), Some(stored.clone()));
        assert_eq!(fs::read(stored).unwrap(), b"jar bytes");
    }

    #[test]
    fn test_identical_content_shares_a_blob() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("a.jar");
        fs::write(&artifact, b"same").unwrap();

        let cache = ArtifactCache::new(temp.path().join("cache"));
        let first = cache.store(&coordinate(), &artifact).unwrap();
        let other = Coordinate::parse("org.example:copy:1.0").unwrap();
        let second = cache.store(&other, &artifact).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_blob_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("a.jar");
        fs::write(&artifact, b"original").unwrap();

        let cache = ArtifactCache::new(temp.path().join("cache"));
        let blob = cache.store(&coordinate(), &artifact).unwrap();
        fs::write(&blob, b"tampered").unwrap();

        assert!(cache.lookup(&coordinate()).unwrap().is_none());
    }
}
