//! Archive key layout
//!
//! All entries are keyed by forward-slash relative paths:
//! - `schema/current` — canonical current schema document
//! - `schema/<version>` — immutable per-version backup
//! - `version/marker` — raw UTF-8 version label
//! - `packs/<version>/<relative-path>` — pack snapshot files
//! - `reports/<previous>-<new>.{text,structured,binary}` — migration reports

/// Canonical current schema document
pub const SCHEMA_CURRENT: &str = "schema/current";

/// Raw version-label marker
pub const VERSION_MARKER: &str = "version/marker";

/// Per-version schema backup key
pub fn schema_version(version: &str) -> String {
    format!("schema/{version}")
}

/// Prefix under which one version's pack snapshot lives (trailing slash)
pub fn pack_prefix(version: &str) -> String {
    format!("packs/{version}/")
}

/// Key for one snapshot file
pub fn pack_file(version: &str, relative: &str) -> String {
    format!("packs/{version}/{relative}")
}

/// Text-encoded report for one migration
pub fn report_text(previous: &str, new: &str) -> String {
    format!("reports/{previous}-{new}.text")
}

/// Structured (JSON) report for one migration
pub fn report_structured(previous: &str, new: &str) -> String {
    format!("reports/{previous}-{new}.structured")
}

/// Compact binary report for one migration
pub fn report_binary(previous: &str, new: &str) -> String {
    format!("reports/{previous}-{new}.binary")
}
