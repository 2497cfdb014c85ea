//! Container manifest
//!
//! Every archive embeds a `MANIFEST.json` entry carrying the format version
//! and an xxh3 checksum for every other entry. The manifest is written on
//! each commit and verified on open.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved entry name; never exposed through the store's key API.
pub const MANIFEST_KEY: &str = "MANIFEST.json";

/// Current container format version.
pub const FORMAT_VERSION: u32 = 1;

/// Format metadata and per-entry checksums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultManifest {
    /// Container format version
    pub format_version: u32,
    /// xxh3-64 hex checksum per entry key
    pub checksums: BTreeMap<String, String>,
}

impl VaultManifest {
    /// Create an empty manifest at the current format version.
    pub fn new() -> Self {
        VaultManifest {
            format_version: FORMAT_VERSION,
            checksums: BTreeMap::new(),
        }
    }

    /// Record the checksum for one entry.
    pub fn add_checksum(&mut self, key: &str, checksum: impl Into<String>) {
        self.checksums.insert(key.to_string(), checksum.into());
    }
}

impl Default for VaultManifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Hex-encoded xxh3-64 of the given bytes.
pub fn xxh3_hex(data: &[u8]) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(data))
}
