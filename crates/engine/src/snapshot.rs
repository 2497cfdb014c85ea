//! Pack snapshot capture and extraction
//!
//! A pack snapshot is the set of raw data files captured for exactly one
//! version label, stored under the `packs/<version>/` key prefix. Capture
//! stages writes only; the caller owns the commit. Extraction is read-only
//! and never mutates the archive.

use std::fs;
use std::path::{Path, PathBuf};

use packvault_archive::{keys, Archive};
use packvault_core::{Error, PackReader, ProgressSink, Result};
use tracing::{info, warn};

/// Stage every live pack file under `packs/<version>/`, replacing any entries
/// already present. Idempotent in effect. Returns the number of files staged.
pub fn capture_packs(
    archive: &mut Archive,
    reader: &dyn PackReader,
    version: &str,
    progress: Option<&dyn ProgressSink>,
) -> Result<usize> {
    let files = reader.pack_files()?;
    let total = files.len() as u64;
    for (index, relative) in files.iter().enumerate() {
        let data = reader.read_pack(relative)?;
        archive.write_entry(keys::pack_file(version, relative), data);
        if let Some(sink) = progress {
            sink.progress("capture", index as u64 + 1, total);
        }
    }
    info!(version, files = files.len(), "pack snapshot staged");
    Ok(files.len())
}

/// Copy every `packs/<version>/` entry into a fresh uniquely-named temp
/// directory, preserving relative structure. Fails `NotFound` if no entries
/// exist for the version. The caller removes the directory via [`cleanup`].
pub fn extract_version(archive: &Archive, version: &str) -> Result<PathBuf> {
    let prefix = keys::pack_prefix(version);
    let entries: Vec<String> = archive.list_entries(&prefix).collect();
    if entries.is_empty() {
        return Err(Error::NotFound(prefix));
    }

    let dir = tempfile::Builder::new()
        .prefix("packvault-")
        .tempdir()?
        .into_path();

    for key in &entries {
        let relative = &key[prefix.len()..];
        let dest = join_relative(&dir, relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, archive.read_entry(key)?)?;
    }
    info!(version, files = entries.len(), dir = %dir.display(), "snapshot extracted");
    Ok(dir)
}

/// Recursive best-effort delete of an extraction directory. Failures are
/// logged, never propagated.
pub fn cleanup(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = fs::remove_dir_all(path) {
        warn!(path = %path.display(), error = %e, "failed to remove extraction directory");
    }
}

/// Resolve a forward-slash archive key suffix against a local directory.
fn join_relative(dir: &Path, relative: &str) -> PathBuf {
    let mut path = dir.to_path_buf();
    for part in relative.split('/') {
        path.push(part);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::DirPackReader;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, data: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    #[test]
    fn test_capture_then_extract_round_trip() {
        let install = TempDir::new().unwrap();
        write(install.path(), "a.pack", b"alpha");
        write(install.path(), "world/b.pack", b"beta");

        let store = TempDir::new().unwrap();
        let mut archive = Archive::open(store.path().join("t.vault")).unwrap();
        let reader = DirPackReader::with_version(install.path(), "1.0");

        let staged = capture_packs(&mut archive, &reader, "1.0", None).unwrap();
        assert_eq!(staged, 2);
        archive.commit().unwrap();

        let extracted = extract_version(&archive, "1.0").unwrap();
        assert_eq!(fs::read(extracted.join("a.pack")).unwrap(), b"alpha");
        assert_eq!(fs::read(extracted.join("world/b.pack")).unwrap(), b"beta");
        cleanup(&extracted);
        assert!(!extracted.exists());
    }

    #[test]
    fn test_extract_unknown_version_fails_not_found() {
        let store = TempDir::new().unwrap();
        let archive = Archive::open(store.path().join("t.vault")).unwrap();
        let err = extract_version(&archive, "9.9").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_extract_does_not_mutate_archive() {
        let install = TempDir::new().unwrap();
        write(install.path(), "a.pack", b"alpha");

        let store = TempDir::new().unwrap();
        let path = store.path().join("t.vault");
        let mut archive = Archive::open(&path).unwrap();
        let reader = DirPackReader::with_version(install.path(), "1.0");
        capture_packs(&mut archive, &reader, "1.0", None).unwrap();
        archive.commit().unwrap();

        let before = fs::read(&path).unwrap();
        let extracted = extract_version(&archive, "1.0").unwrap();
        cleanup(&extracted);
        assert!(!archive.has_staged());
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_capture_is_idempotent() {
        let install = TempDir::new().unwrap();
        write(install.path(), "a.pack", b"alpha");

        let store = TempDir::new().unwrap();
        let mut archive = Archive::open(store.path().join("t.vault")).unwrap();
        let reader = DirPackReader::with_version(install.path(), "1.0");

        capture_packs(&mut archive, &reader, "1.0", None).unwrap();
        capture_packs(&mut archive, &reader, "1.0", None).unwrap();
        archive.commit().unwrap();

        let keys: Vec<String> = archive.list_entries("packs/1.0/").collect();
        assert_eq!(keys, vec!["packs/1.0/a.pack"]);
    }

    #[test]
    fn test_cleanup_missing_path_is_silent() {
        cleanup(Path::new("/nonexistent/packvault-gone"));
    }
}
