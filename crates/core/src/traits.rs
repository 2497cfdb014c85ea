//! Collaborator contracts
//!
//! The diff engine, the raw pack reader, the filesystem schema source, and
//! the schema compile step are substantial external subsystems. This module
//! defines only the contract surface the orchestrator requires from them.

use std::time::SystemTime;

use crate::error::Result;
use crate::report::Change;
use crate::schema::SchemaDocument;

/// Advisory progress events for long-running steps.
///
/// Absence of a sink produces no events and never alters control flow.
pub trait ProgressSink {
    /// Report progress within a named stage. `done` and `total` are counted
    /// in stage-specific units (files, tables, ...).
    fn progress(&self, stage: &str, done: u64, total: u64);
}

/// Reader over one installation (or extracted snapshot) of the raw data packs.
pub trait PackReader {
    /// The version label the installation reports for itself.
    fn reported_version(&self) -> Result<String>;

    /// Relative forward-slash paths of every pack file, in stable order.
    fn pack_files(&self) -> Result<Vec<String>>;

    /// Read one pack file by its relative path.
    fn read_pack(&self, relative: &str) -> Result<Vec<u8>>;

    /// Toggle the memory-residency hint; returns the prior setting.
    ///
    /// When resident, the reader should keep decoded pack data in memory for
    /// the duration, as repeated access is expected. Strictly a performance
    /// hint.
    fn set_resident(&self, resident: bool) -> bool;
}

/// Loader for an optional filesystem-resident schema document override.
pub trait SchemaSource {
    /// Load the document and its modification time, or `None` if no override
    /// document exists.
    fn load(&self) -> Result<Option<(SchemaDocument, SystemTime)>>;
}

/// Output of one diff engine invocation.
#[derive(Debug, Clone)]
pub struct DiffOutcome {
    /// Detected changes, in the engine's stable order
    pub changes: Vec<Change>,
    /// Schema document updated to describe the new version
    pub schema: SchemaDocument,
}

/// The external engine that computes what changed between two snapshots.
pub trait DiffEngine {
    /// Diff the previous snapshot against the live data.
    ///
    /// `detect_data_changes` additionally scans row data rather than only
    /// structure. The returned schema must describe `target_version`.
    #[allow(clippy::too_many_arguments)]
    fn diff(
        &self,
        previous: &dyn PackReader,
        previous_schema: &SchemaDocument,
        live: &dyn PackReader,
        target_version: &str,
        detect_data_changes: bool,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<DiffOutcome>;
}

/// The external finalize step that turns a document into queryable structures.
pub trait SchemaCompiler {
    /// Compile the document. Called after a successful resolve or migration.
    fn compile(&self, schema: &SchemaDocument) -> Result<()>;
}

/// Compiler that does nothing; for hosts that only archive.
pub struct NoopCompiler;

impl SchemaCompiler for NoopCompiler {
    fn compile(&self, _schema: &SchemaDocument) -> Result<()> {
        Ok(())
    }
}
