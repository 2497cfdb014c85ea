//! Startup version resolution
//!
//! Decides the authoritative schema document for the currently installed
//! data, reconciling archive- and filesystem-sourced documents by recency.
//! The filesystem override wins only when strictly newer than the archived
//! document; ties and absence favor the archive.

use packvault_archive::{keys, unix_secs, Archive};
use packvault_core::{
    Error, PackReader, ProgressSink, Result, SchemaDocument, SchemaSource,
};
use tracing::{info, warn};

use crate::snapshot::capture_packs;

/// Resolve the authoritative schema document at startup.
///
/// Runs first-time setup when the archive has no version marker yet. On
/// return the archive's marker, canonical current document, and the returned
/// document all agree on the reported version.
pub fn resolve(
    reader: &dyn PackReader,
    source: &dyn SchemaSource,
    archive: &mut Archive,
    progress: Option<&dyn ProgressSink>,
) -> Result<SchemaDocument> {
    let reported = reader.reported_version()?;

    if !archive.has_entry(keys::VERSION_MARKER) {
        return first_time_setup(reader, source, archive, &reported, progress);
    }

    // Archive candidate: exact per-version lookup, falling back to the
    // canonical current document (an older release) when no exact match
    // exists anywhere.
    let mut from_fallback = false;
    let archived = match lookup_version(archive, &reported)? {
        Some(found) => Some(found),
        None if archive.has_entry(keys::SCHEMA_CURRENT) => {
            from_fallback = true;
            Some(read_current(archive)?)
        }
        None => None,
    };
    let override_doc = source.load()?;

    let (mut document, mtime_secs, filesystem_wins) = pick_winner(archived, override_doc)?;
    let forced = force_version(&mut document, &reported);

    // Persist when the filesystem document won, or when the fallback
    // document's version had to be forced; either way the canonical current
    // entry and the marker must agree with the resolved document.
    if filesystem_wins || (from_fallback && forced) {
        archive.write_entry_dated(keys::SCHEMA_CURRENT, document.to_json()?, mtime_secs);
        archive.write_entry(keys::VERSION_MARKER, reported.clone().into_bytes());
        archive.commit()?;
    }

    info!(
        version = %reported,
        source = if filesystem_wins { "filesystem" } else { "archive" },
        "schema resolved"
    );
    Ok(document)
}

/// Populate an empty archive from whichever schema source exists.
///
/// Requires at least one of the filesystem override or an archived current
/// document, else fails `ConfigurationMissing`. Captures a full pack
/// snapshot for the reported version and commits everything at once.
fn first_time_setup(
    reader: &dyn PackReader,
    source: &dyn SchemaSource,
    archive: &mut Archive,
    reported: &str,
    progress: Option<&dyn ProgressSink>,
) -> Result<SchemaDocument> {
    let override_doc = source.load()?;
    let archived = if archive.has_entry(keys::SCHEMA_CURRENT) {
        Some(read_current(archive)?)
    } else {
        None
    };

    let (mut document, mtime_secs, _) = pick_winner(archived, override_doc)?;
    force_version(&mut document, reported);

    let bytes = document.to_json()?;
    archive.write_entry_dated(keys::schema_version(reported), bytes.clone(), mtime_secs);
    archive.write_entry_dated(keys::SCHEMA_CURRENT, bytes, mtime_secs);
    capture_packs(archive, reader, reported, progress)?;
    archive.write_entry(keys::VERSION_MARKER, reported.as_bytes().to_vec());
    archive.commit()?;

    info!(version = reported, "first-time setup complete");
    Ok(document)
}

/// Recency tie-break between the archived and filesystem documents.
///
/// Returns (document, mtime in seconds, filesystem won). The filesystem
/// document wins only when strictly newer; equal timestamps and absence
/// favor the archive. `ConfigurationMissing` when neither source exists.
fn pick_winner(
    archived: Option<(SchemaDocument, u64)>,
    override_doc: Option<(SchemaDocument, std::time::SystemTime)>,
) -> Result<(SchemaDocument, u64, bool)> {
    match (archived, override_doc) {
        (None, None) => Err(Error::ConfigurationMissing(
            "no schema document found in the archive or on the filesystem".to_string(),
        )),
        (Some((doc, mtime)), None) => Ok((doc, mtime, false)),
        (None, Some((doc, mtime))) => Ok((doc, unix_secs(mtime), true)),
        (Some((archived_doc, archived_mtime)), Some((fs_doc, fs_mtime))) => {
            let fs_secs = unix_secs(fs_mtime);
            if fs_secs > archived_mtime {
                Ok((fs_doc, fs_secs, true))
            } else {
                Ok((archived_doc, archived_mtime, false))
            }
        }
    }
}

/// Per-version lookup.
///
/// If the marker already names `version`, the canonical current document is
/// returned directly. Otherwise a per-version backup, if present, is copied
/// to the canonical key (keeping its timestamp), the marker is updated, and
/// the change committed. Returns `None` when neither exists.
pub(crate) fn lookup_version(
    archive: &mut Archive,
    version: &str,
) -> Result<Option<(SchemaDocument, u64)>> {
    if read_marker(archive)?.as_deref() == Some(version) {
        return Ok(Some(read_current(archive)?));
    }

    let backup_key = keys::schema_version(version);
    if archive.has_entry(&backup_key) {
        let bytes = archive.read_entry(&backup_key)?;
        let mtime = archive.entry_mtime(&backup_key)?;
        let document = SchemaDocument::from_json(&bytes)?;
        archive.write_entry_dated(keys::SCHEMA_CURRENT, bytes, mtime);
        archive.write_entry(keys::VERSION_MARKER, version.as_bytes().to_vec());
        archive.commit()?;
        info!(version, "restored schema from per-version backup");
        return Ok(Some((document, mtime)));
    }

    Ok(None)
}

/// The archive's version marker, if any.
pub(crate) fn read_marker(archive: &Archive) -> Result<Option<String>> {
    if !archive.has_entry(keys::VERSION_MARKER) {
        return Ok(None);
    }
    let raw = archive.read_entry(keys::VERSION_MARKER)?;
    Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
}

fn read_current(archive: &Archive) -> Result<(SchemaDocument, u64)> {
    let bytes = archive.read_entry(keys::SCHEMA_CURRENT)?;
    let mtime = archive.entry_mtime(keys::SCHEMA_CURRENT)?;
    Ok((SchemaDocument::from_json(&bytes)?, mtime))
}

/// Force the document's version to the reported label. Returns whether the
/// stored value disagreed (logged, non-fatal).
fn force_version(document: &mut SchemaDocument, reported: &str) -> bool {
    if document.version != reported {
        warn!(
            stored = %document.version,
            reported,
            "schema document version disagrees with installation; forcing"
        );
        document.version = reported.to_string();
        true
    } else {
        false
    }
}
