//! Filesystem-backed collaborators
//!
//! [`DirPackReader`] reads a live installation (or an extracted snapshot
//! directory): the version marker file, recursive pack enumeration, and an
//! optional in-memory byte cache driven by the residency hint.
//!
//! [`FileSchemaSource`] loads an override schema document from a JSON file
//! together with its filesystem modification time.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use packvault_core::{Error, PackReader, Result, SchemaDocument, SchemaSource};

/// File name of the version marker inside an installation.
pub const VERSION_FILE: &str = "version.txt";

/// Extension of raw data pack files.
pub const PACK_EXTENSION: &str = "pack";

/// Pack reader over one directory tree.
pub struct DirPackReader {
    root: PathBuf,
    /// Version label to report instead of reading the marker file.
    /// Extracted snapshot directories carry no marker of their own.
    pinned_version: Option<String>,
    resident: Cell<bool>,
    cache: RefCell<HashMap<String, Vec<u8>>>,
}

impl DirPackReader {
    /// Reader over a live installation; the version comes from its
    /// `version.txt` marker.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirPackReader {
            root: root.into(),
            pinned_version: None,
            resident: Cell::new(false),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Reader over an extracted snapshot directory, reporting a fixed
    /// version label.
    pub fn with_version(root: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        DirPackReader {
            root: root.into(),
            pinned_version: Some(version.into()),
            resident: Cell::new(false),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// The directory this reader covers.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collect_packs(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let relative = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.collect_packs(&entry.path(), &relative, out)?;
            } else if entry.path().extension().is_some_and(|ext| ext == PACK_EXTENSION) {
                out.push(relative);
            }
        }
        Ok(())
    }
}

impl PackReader for DirPackReader {
    fn reported_version(&self) -> Result<String> {
        if let Some(version) = &self.pinned_version {
            return Ok(version.clone());
        }
        let marker = self.root.join(VERSION_FILE);
        let raw = fs::read_to_string(&marker).map_err(|e| {
            Error::ConfigurationMissing(format!(
                "no version marker at {}: {e}",
                marker.display()
            ))
        })?;
        Ok(raw.trim().to_string())
    }

    fn pack_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        self.collect_packs(&self.root, "", &mut files)?;
        files.sort();
        Ok(files)
    }

    fn read_pack(&self, relative: &str) -> Result<Vec<u8>> {
        if self.resident.get() {
            if let Some(data) = self.cache.borrow().get(relative) {
                return Ok(data.clone());
            }
        }
        let data = fs::read(self.root.join(relative))?;
        if self.resident.get() {
            self.cache
                .borrow_mut()
                .insert(relative.to_string(), data.clone());
        }
        Ok(data)
    }

    fn set_resident(&self, resident: bool) -> bool {
        let prior = self.resident.replace(resident);
        if !resident {
            self.cache.borrow_mut().clear();
        }
        prior
    }
}

/// Schema source reading a JSON document file, if present.
pub struct FileSchemaSource {
    path: PathBuf,
}

impl FileSchemaSource {
    /// Source over the given document path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSchemaSource { path: path.into() }
    }
}

impl SchemaSource for FileSchemaSource {
    fn load(&self) -> Result<Option<(SchemaDocument, SystemTime)>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let document = SchemaDocument::from_json(&bytes)?;
        let mtime = fs::metadata(&self.path)?.modified()?;
        Ok(Some((document, mtime)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, data: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    #[test]
    fn test_reported_version_trims_marker() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), VERSION_FILE, b"3.1.4.1\n");
        let reader = DirPackReader::new(dir.path());
        assert_eq!(reader.reported_version().unwrap(), "3.1.4.1");
    }

    #[test]
    fn test_missing_marker_is_configuration_missing() {
        let dir = TempDir::new().unwrap();
        let reader = DirPackReader::new(dir.path());
        let err = reader.reported_version().unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(_)));
    }

    #[test]
    fn test_pinned_version_skips_marker() {
        let dir = TempDir::new().unwrap();
        let reader = DirPackReader::with_version(dir.path(), "A");
        assert_eq!(reader.reported_version().unwrap(), "A");
    }

    #[test]
    fn test_pack_files_recursive_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "world/b.pack", b"b");
        write(dir.path(), "world/deep/a.pack", b"a");
        write(dir.path(), "root.pack", b"r");
        write(dir.path(), "notes.txt", b"skip me");
        write(dir.path(), VERSION_FILE, b"1.0");

        let reader = DirPackReader::new(dir.path());
        assert_eq!(
            reader.pack_files().unwrap(),
            vec!["root.pack", "world/b.pack", "world/deep/a.pack"]
        );
    }

    #[test]
    fn test_residency_cache_serves_stale_bytes_until_cleared() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.pack", b"one");
        let reader = DirPackReader::new(dir.path());

        let prior = reader.set_resident(true);
        assert!(!prior);
        assert_eq!(reader.read_pack("a.pack").unwrap(), b"one");

        // Overwrite on disk; the resident cache still holds the old bytes.
        write(dir.path(), "a.pack", b"two");
        assert_eq!(reader.read_pack("a.pack").unwrap(), b"one");

        // Dropping residency clears the cache.
        let prior = reader.set_resident(false);
        assert!(prior);
        assert_eq!(reader.read_pack("a.pack").unwrap(), b"two");
    }

    #[test]
    fn test_file_schema_source_absent_is_none() {
        let dir = TempDir::new().unwrap();
        let source = FileSchemaSource::new(dir.path().join("schema.json"));
        assert!(source.load().unwrap().is_none());
    }

    #[test]
    fn test_file_schema_source_loads_document_and_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.json");
        let doc = SchemaDocument::new("1.0");
        fs::write(&path, doc.to_json().unwrap()).unwrap();

        let source = FileSchemaSource::new(&path);
        let (loaded, mtime) = source.load().unwrap().unwrap();
        assert_eq!(loaded, doc);
        assert!(mtime <= SystemTime::now());
    }
}
