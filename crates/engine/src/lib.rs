//! PackVault engine
//!
//! Orchestration over the archive container: startup version resolution,
//! pack snapshot capture/extraction, one-shot migrations, report encodings,
//! and the [`Vault`] host facade.
//!
//! Single-threaded and synchronous by contract; `migrate` is not re-entrant
//! and not safe to run concurrently with `resolve` against the same archive
//! path. Callers serialize access.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod emit;
pub mod migrate;
pub mod reader;
pub mod resolver;
pub mod snapshot;
pub mod vault;

pub use emit::{
    decode_binary, decode_structured, emit, encode_binary, encode_structured, parse_text,
    render_text, ReportArtifacts,
};
pub use migrate::migrate;
pub use reader::{DirPackReader, FileSchemaSource, PACK_EXTENSION, VERSION_FILE};
pub use resolver::resolve;
pub use snapshot::{capture_packs, cleanup, extract_version};
pub use vault::{Vault, VaultConfig};
