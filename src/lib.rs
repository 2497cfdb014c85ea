//! PackVault - versioned archive and migration orchestrator for game data packs
//!
//! The external game replaces its data wholesale on each release, with no
//! migration support of its own. PackVault keeps a schema document that
//! always matches the installed data, archives a raw pack snapshot per seen
//! version, and records what changed across each version transition.
//!
//! # Quick Start
//!
//! ```ignore
//! use packvault::{DirPackReader, FileSchemaSource, NoopCompiler, Vault, VaultConfig};
//!
//! let config = VaultConfig::new("/games/example", "/var/lib/packvault")
//!     .with_override_schema("/games/example/schema.json");
//! let mut vault = Vault::initialize(
//!     config.clone(),
//!     Box::new(DirPackReader::new(&config.install_dir)),
//!     Box::new(FileSchemaSource::new(config.override_schema.clone().unwrap())),
//!     Box::new(MyDiffEngine),
//!     Box::new(NoopCompiler),
//! )?;
//!
//! if !vault.is_current()? {
//!     let report = vault.migrate(true, None)?;
//!     println!("{} changes", report.changes.len());
//! }
//! ```
//!
//! # Architecture
//!
//! Durable state lives in one compressed keyed-entry container file
//! ([`Archive`]); all multi-entry updates land in exactly one commit. The
//! diff engine, pack reader, and schema compile step are external
//! collaborators behind traits.

pub use packvault_archive::{keys, Archive, DEFAULT_ARCHIVE_NAME};
pub use packvault_core::{
    Change, ChangeKind, ColumnDef, ColumnType, DiffEngine, DiffOutcome, Error, MigrationReport,
    NoopCompiler, PackReader, ProgressSink, Result, SchemaCompiler, SchemaDocument, SchemaSource,
    TableDef,
};
pub use packvault_engine::{
    capture_packs, cleanup, decode_binary, decode_structured, emit, encode_binary,
    encode_structured, extract_version, migrate, parse_text, render_text, resolve, DirPackReader,
    FileSchemaSource, ReportArtifacts, Vault, VaultConfig,
};
