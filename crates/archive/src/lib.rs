//! Archive container for PackVault
//!
//! A single compressed keyed-entry file (zstd-compressed tar) used for all
//! durable state: schema documents, pack snapshots, the version marker, and
//! migration reports. Writes are staged in memory and flushed atomically by
//! one `commit()`, so multi-entry updates appear atomic relative to readers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod keys;
pub mod manifest;
pub mod store;

pub use manifest::{VaultManifest, FORMAT_VERSION};
pub use store::{unix_secs, Archive};

/// Default container file name.
pub const DEFAULT_ARCHIVE_NAME: &str = "packvault.vault";
