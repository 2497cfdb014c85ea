//! The host facade
//!
//! [`Vault`] ties the pieces together for a host application: resolve the
//! authoritative schema at startup, answer whether the installed data still
//! matches it, and drive one-shot migrations. The archive is opened once per
//! operation span and released on every exit path; operations are not
//! re-entrant and callers serialize access to one archive path.

use std::path::PathBuf;

use packvault_archive::{Archive, DEFAULT_ARCHIVE_NAME};
use packvault_core::{
    DiffEngine, MigrationReport, PackReader, ProgressSink, Result, SchemaCompiler, SchemaDocument,
    SchemaSource,
};
use tracing::info;

use crate::migrate::migrate;
use crate::resolver::resolve;

/// Locations the vault works against.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Root of the live game installation
    pub install_dir: PathBuf,
    /// Path of the archive container file
    pub archive_path: PathBuf,
    /// Optional filesystem-resident schema override document
    pub override_schema: Option<PathBuf>,
}

impl VaultConfig {
    /// Config with the archive stored under `data_dir` with the default
    /// container name.
    pub fn new(install_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        VaultConfig {
            install_dir: install_dir.into(),
            archive_path: data_dir.into().join(DEFAULT_ARCHIVE_NAME),
            override_schema: None,
        }
    }

    /// Use an explicit container file path.
    pub fn with_archive_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive_path = path.into();
        self
    }

    /// Watch a filesystem schema document as an override source.
    pub fn with_override_schema(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_schema = Some(path.into());
        self
    }
}

/// Ready-to-use handle over one archive and one live installation.
pub struct Vault {
    config: VaultConfig,
    reader: Box<dyn PackReader>,
    schema_source: Box<dyn SchemaSource>,
    diff_engine: Box<dyn DiffEngine>,
    compiler: Box<dyn SchemaCompiler>,
    active: SchemaDocument,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("config", &self.config)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Resolve the authoritative schema (running first-time setup on an
    /// empty archive), compile it, and return a ready handle.
    ///
    /// Fails `ConfigurationMissing` when no usable schema source exists
    /// anywhere; that blocks all use.
    pub fn initialize(
        config: VaultConfig,
        reader: Box<dyn PackReader>,
        schema_source: Box<dyn SchemaSource>,
        diff_engine: Box<dyn DiffEngine>,
        compiler: Box<dyn SchemaCompiler>,
    ) -> Result<Self> {
        let mut archive = Archive::open(&config.archive_path)?;
        let active = resolve(reader.as_ref(), schema_source.as_ref(), &mut archive, None)?;
        archive.close();

        compiler.compile(&active)?;
        info!(version = %active.version, archive = %config.archive_path.display(), "vault ready");

        Ok(Vault {
            config,
            reader,
            schema_source,
            diff_engine,
            compiler,
            active,
        })
    }

    /// Whether the active schema still matches the installed data's version.
    pub fn is_current(&self) -> Result<bool> {
        Ok(self.active.version == self.reader.reported_version()?)
    }

    /// The schema describing the currently installed data.
    pub fn active_schema(&self) -> &SchemaDocument {
        &self.active
    }

    /// The configured locations.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The filesystem override source in use.
    pub fn schema_source(&self) -> &dyn SchemaSource {
        self.schema_source.as_ref()
    }

    /// Advance the active schema to the installed data's version.
    ///
    /// Fails `AlreadyCurrent` when nothing changed, `HistoryMissing` when no
    /// snapshot exists to diff against, `UpdateFailed` on diff engine errors;
    /// in every failure case the archive stays at its last committed state
    /// and the previously active schema remains fully usable.
    pub fn migrate(
        &mut self,
        detect_data_changes: bool,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<MigrationReport> {
        let mut archive = Archive::open(&self.config.archive_path)?;
        let result = migrate(
            &self.active,
            self.reader.as_ref(),
            &mut archive,
            self.diff_engine.as_ref(),
            detect_data_changes,
            progress,
        );
        archive.close();

        let (report, updated) = result?;
        self.active = updated;
        self.compiler.compile(&self.active)?;
        Ok(report)
    }
}
