//! The archive container
//!
//! One compressed keyed-entry file (zstd-compressed tar) holding schema
//! documents, pack snapshots, the version marker, and migration reports.
//! Entries are keyed by forward-slash relative paths and carry a modification
//! timestamp (tar header mtime, second granularity).
//!
//! Writes are staged in memory and only reach durable storage at
//! [`Archive::commit`], which rewrites the whole container through the
//! write-fsync-rename pattern. Either the complete new container is visible
//! or the previous one is, never a partial state. A handle's reads see its
//! own staged writes.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use packvault_core::{Error, Result};
use tracing::debug;

use crate::manifest::{xxh3_hex, VaultManifest, FORMAT_VERSION, MANIFEST_KEY};

/// zstd level for container commits.
const COMPRESSION_LEVEL: i32 = 3;

/// Seconds since the Unix epoch, saturating at zero for pre-epoch times.
pub fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn now_secs() -> u64 {
    unix_secs(SystemTime::now())
}

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    mtime: u64,
}

/// Open handle on one archive container file.
///
/// Single-owner: one handle per operation span, never shared across
/// concurrent operations. Callers serialize access to the same path.
pub struct Archive {
    path: PathBuf,
    committed: BTreeMap<String, Entry>,
    staged: BTreeMap<String, Entry>,
}

impl Archive {
    /// Open the container at `path`, loading every entry and verifying the
    /// embedded manifest. An absent file yields an empty container; nothing
    /// is created on disk until the first commit.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut committed = BTreeMap::new();

        if path.exists() {
            let file = File::open(&path)?;
            let decoder = zstd::Decoder::new(BufReader::new(file))?;
            let mut tar = tar::Archive::new(decoder);

            let mut manifest: Option<VaultManifest> = None;
            for entry in tar.entries()? {
                let mut entry = entry?;
                let key = entry.path()?.to_string_lossy().into_owned();
                let mtime = entry.header().mtime().unwrap_or(0);
                let mut data = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut data)?;
                if key == MANIFEST_KEY {
                    manifest = Some(serde_json::from_slice(&data)?);
                } else {
                    committed.insert(key, Entry { data, mtime });
                }
            }

            let manifest = manifest
                .ok_or_else(|| Error::Corruption(format!("{}: no manifest", path.display())))?;
            verify(&path, &manifest, &committed)?;
            debug!(path = %path.display(), entries = committed.len(), "archive opened");
        }

        Ok(Archive {
            path,
            committed,
            staged: BTreeMap::new(),
        })
    }

    /// The container file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an entry exists (committed or staged).
    pub fn has_entry(&self, key: &str) -> bool {
        self.staged.contains_key(key) || self.committed.contains_key(key)
    }

    /// Read one entry's bytes; staged writes shadow committed state.
    pub fn read_entry(&self, key: &str) -> Result<Vec<u8>> {
        self.entry(key)
            .map(|e| e.data.clone())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// An entry's modification time in seconds since the epoch.
    pub fn entry_mtime(&self, key: &str) -> Result<u64> {
        self.entry(key)
            .map(|e| e.mtime)
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// Stage a create-or-replace write, stamped with the current time.
    /// Not durable until [`Archive::commit`].
    pub fn write_entry(&mut self, key: impl Into<String>, data: Vec<u8>) {
        self.write_entry_dated(key, data, now_secs());
    }

    /// Stage a create-or-replace write with an explicit modification time.
    /// Used when restoring entries that should keep their original timestamp.
    pub fn write_entry_dated(&mut self, key: impl Into<String>, data: Vec<u8>, mtime: u64) {
        self.staged.insert(key.into(), Entry { data, mtime });
    }

    /// Keys of all entries under `prefix`, in sorted order.
    pub fn list_entries<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = String> + 'a {
        self.merged()
            .into_iter()
            .filter(move |(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.to_string())
    }

    /// Whether any writes are staged but not yet committed.
    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Flush all staged writes to durable storage as one atomic replacement
    /// of the container file.
    pub fn commit(&mut self) -> Result<()> {
        let merged = self.merged();

        let mut manifest = VaultManifest::new();
        for (key, entry) in &merged {
            manifest.add_checksum(key, xxh3_hex(&entry.data));
        }
        let manifest_json = serde_json::to_vec_pretty(&manifest)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("vault-tmp");
        match write_container(&tmp, &manifest_json, &merged) {
            Ok(()) => {
                fs::rename(&tmp, &self.path)?;
                sync_parent_dir(&self.path);
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
        }

        let staged = std::mem::take(&mut self.staged);
        self.committed.extend(staged);
        debug!(path = %self.path.display(), entries = self.committed.len(), "archive committed");
        Ok(())
    }

    /// Release the handle. Staged, uncommitted writes are discarded.
    pub fn close(self) {}

    fn entry(&self, key: &str) -> Option<&Entry> {
        self.staged.get(key).or_else(|| self.committed.get(key))
    }

    /// Committed entries with staged writes shadowing them, in key order.
    fn merged(&self) -> BTreeMap<&str, &Entry> {
        let mut merged: BTreeMap<&str, &Entry> = self
            .committed
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        for (k, v) in &self.staged {
            merged.insert(k.as_str(), v);
        }
        merged
    }
}

fn verify(path: &Path, manifest: &VaultManifest, entries: &BTreeMap<String, Entry>) -> Result<()> {
    if manifest.format_version != FORMAT_VERSION {
        return Err(Error::Corruption(format!(
            "{}: unsupported format version {}",
            path.display(),
            manifest.format_version
        )));
    }
    for (key, entry) in entries {
        match manifest.checksums.get(key) {
            None => {
                return Err(Error::Corruption(format!(
                    "{}: entry {key} missing from manifest",
                    path.display()
                )));
            }
            Some(expected) => {
                let actual = xxh3_hex(&entry.data);
                if expected != &actual {
                    return Err(Error::Corruption(format!(
                        "{}: checksum mismatch for {key}: expected {expected}, got {actual}",
                        path.display()
                    )));
                }
            }
        }
    }
    for key in manifest.checksums.keys() {
        if !entries.contains_key(key) {
            return Err(Error::Corruption(format!(
                "{}: manifest lists missing entry {key}",
                path.display()
            )));
        }
    }
    Ok(())
}

fn write_container(tmp: &Path, manifest_json: &[u8], merged: &BTreeMap<&str, &Entry>) -> Result<()> {
    let file = File::create(tmp)?;
    let encoder = zstd::Encoder::new(BufWriter::new(file), COMPRESSION_LEVEL)?;
    let mut builder = tar::Builder::new(encoder);

    append_entry(&mut builder, MANIFEST_KEY, manifest_json, now_secs())?;
    for (key, entry) in merged {
        append_entry(&mut builder, key, &entry.data, entry.mtime)?;
    }

    let encoder = builder.into_inner()?;
    let writer = encoder.finish()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

fn append_entry<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    key: &str,
    data: &[u8],
    mtime: u64,
) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    builder.append_data(&mut header, key, data)?;
    Ok(())
}

fn sync_parent_dir(path: &Path) {
    // Best-effort; not available on all platforms.
    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}
