//! The migration orchestrator
//!
//! One-shot "advance to current version" operation: extract the previous
//! version's snapshot, hand both snapshots to the external diff engine,
//! persist the outcome (new snapshot, updated schema, report in three
//! encodings, version marker) under exactly one commit, and clean up.
//!
//! Not re-entrant; callers serialize access to the archive path. Cancellation
//! is not supported: once started the operation runs to completion or
//! failure, with cleanup guaranteed on every exit path.

use std::path::PathBuf;

use packvault_archive::{keys, Archive};
use packvault_core::{
    DiffEngine, Error, MigrationReport, PackReader, ProgressSink, Result, SchemaDocument,
};
use tracing::{info, warn};

use crate::emit::emit;
use crate::reader::DirPackReader;
use crate::snapshot::{capture_packs, cleanup, extract_version};

/// Restores the reader's residency hint on every exit path.
struct ResidencyGuard<'a> {
    reader: &'a dyn PackReader,
    prior: bool,
}

impl Drop for ResidencyGuard<'_> {
    fn drop(&mut self) {
        self.reader.set_resident(self.prior);
    }
}

/// Removes the extraction directory (best-effort) on every exit path.
struct ExtractionGuard {
    dir: PathBuf,
}

impl Drop for ExtractionGuard {
    fn drop(&mut self) {
        cleanup(&self.dir);
    }
}

/// Run one migration from the active schema's version to the version the
/// live data reports.
///
/// Returns the report and the updated schema document. The caller swaps its
/// active schema reference and runs the compile step. Failure leaves the
/// archive byte-for-byte unchanged.
pub fn migrate(
    active: &SchemaDocument,
    reader: &dyn PackReader,
    archive: &mut Archive,
    engine: &dyn DiffEngine,
    detect_data_changes: bool,
    progress: Option<&dyn ProgressSink>,
) -> Result<(MigrationReport, SchemaDocument)> {
    let new_version = reader.reported_version()?;
    if active.version == new_version {
        return Err(Error::AlreadyCurrent {
            version: new_version,
        });
    }
    let previous_version = active.version.clone();
    info!(previous = %previous_version, new = %new_version, "migration started");

    // Keep structured-record data resident for the repeated access the diff
    // performs; the guard restores the caller's setting afterwards.
    let prior = reader.set_resident(true);
    let _residency = ResidencyGuard { reader, prior };

    let dir = match extract_version(archive, &previous_version) {
        Ok(dir) => dir,
        Err(Error::NotFound(_)) => {
            return Err(Error::HistoryMissing {
                version: previous_version,
            });
        }
        Err(e) => return Err(e),
    };
    let _extraction = ExtractionGuard { dir: dir.clone() };

    // Secondary, read-only reader over the extracted history, with the same
    // residency hint applied. It dies with this scope, so no restore needed.
    let previous_reader = DirPackReader::with_version(&dir, &previous_version);
    previous_reader.set_resident(true);

    let previous_schema = read_previous_schema(archive, &previous_version)?;

    let outcome = engine
        .diff(
            &previous_reader,
            &previous_schema,
            reader,
            &new_version,
            detect_data_changes,
            progress,
        )
        .map_err(|e| Error::UpdateFailed(e.to_string()))?;

    let mut updated = outcome.schema;
    if updated.version != new_version {
        warn!(
            returned = %updated.version,
            expected = %new_version,
            "diff engine returned schema for unexpected version; forcing"
        );
        updated.version = new_version.clone();
    }

    let report = MigrationReport {
        previous_version: previous_version.clone(),
        new_version: new_version.clone(),
        changes: outcome.changes,
    };

    // Stage everything, then exactly one commit.
    capture_packs(archive, reader, &new_version, progress)?;
    let schema_bytes = updated.to_json()?;
    archive.write_entry(keys::SCHEMA_CURRENT, schema_bytes.clone());
    archive.write_entry(keys::schema_version(&new_version), schema_bytes);
    let artifacts = emit(&report)?;
    archive.write_entry(keys::report_text(&previous_version, &new_version), artifacts.text);
    archive.write_entry(
        keys::report_structured(&previous_version, &new_version),
        artifacts.structured,
    );
    archive.write_entry(keys::report_binary(&previous_version, &new_version), artifacts.binary);
    archive.write_entry(keys::VERSION_MARKER, new_version.clone().into_bytes());
    archive.commit()?;

    info!(
        previous = %report.previous_version,
        new = %report.new_version,
        changes = report.changes.len(),
        "migration committed"
    );
    Ok((report, updated))
}

/// The archived schema for the version being migrated away from. The
/// per-version backup is authoritative; the canonical current entry covers
/// archives predating per-version backups.
fn read_previous_schema(archive: &Archive, version: &str) -> Result<SchemaDocument> {
    let backup_key = keys::schema_version(version);
    let bytes = if archive.has_entry(&backup_key) {
        archive.read_entry(&backup_key)?
    } else {
        archive.read_entry(keys::SCHEMA_CURRENT)?
    };
    SchemaDocument::from_json(&bytes)
}
