//! Report encodings
//!
//! One migration report is persisted in three independent encodings, all
//! carrying identical logical content:
//! - text: one line per change, in change order (human changelog)
//! - structured: pretty JSON of the full report (long-term archival)
//! - binary: msgpack (internal reload only)
//!
//! Each encoding is a pure transform over the report value; text and
//! structured decode back for round-trip verification.

use std::str::FromStr;

use packvault_core::{Change, Error, MigrationReport, Result};

/// All three encodings of one report.
pub struct ReportArtifacts {
    /// Newline-joined change lines
    pub text: Vec<u8>,
    /// Pretty JSON of the full report
    pub structured: Vec<u8>,
    /// Compact msgpack of the full report
    pub binary: Vec<u8>,
}

/// Produce all three encodings in one call.
pub fn emit(report: &MigrationReport) -> Result<ReportArtifacts> {
    Ok(ReportArtifacts {
        text: render_text(report).into_bytes(),
        structured: encode_structured(report)?,
        binary: encode_binary(report)?,
    })
}

/// One line per change, change order, newline-joined. Zero changes render as
/// the empty string.
pub fn render_text(report: &MigrationReport) -> String {
    report
        .changes
        .iter()
        .map(|change| change.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode a text report. Version labels are not part of the text form, so
/// the caller supplies them from the entry key.
pub fn parse_text(previous: &str, new: &str, bytes: &[u8]) -> Result<MigrationReport> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    let changes = text
        .lines()
        .map(Change::from_str)
        .collect::<Result<Vec<_>>>()?;
    Ok(MigrationReport {
        previous_version: previous.to_string(),
        new_version: new.to_string(),
        changes,
    })
}

/// Field-labeled serialization of the full report graph (pretty JSON).
pub fn encode_structured(report: &MigrationReport) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(report)?)
}

/// Decode a structured report.
pub fn decode_structured(bytes: &[u8]) -> Result<MigrationReport> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Dense machine serialization (msgpack); no external interoperability.
pub fn encode_binary(report: &MigrationReport) -> Result<Vec<u8>> {
    rmp_serde::to_vec(report).map_err(|e| Error::Encode(e.to_string()))
}

/// Decode a binary report.
pub fn decode_binary(bytes: &[u8]) -> Result<MigrationReport> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use packvault_core::ChangeKind;

    fn sample_report() -> MigrationReport {
        MigrationReport {
            previous_version: "A".to_string(),
            new_version: "B".to_string(),
            changes: vec![
                Change::new(ChangeKind::Added, "items", "new table"),
                Change::new(ChangeKind::Modified, "npcs", "3 columns changed"),
                Change::new(ChangeKind::Removed, "legacy", "table dropped"),
            ],
        }
    }

    #[test]
    fn test_text_line_count_equals_change_count() {
        let report = sample_report();
        let text = render_text(&report);
        assert_eq!(text.lines().count(), report.changes.len());
    }

    #[test]
    fn test_text_preserves_change_order() {
        let report = sample_report();
        let text = render_text(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "+ items: new table");
        assert_eq!(lines[1], "~ npcs: 3 columns changed");
        assert_eq!(lines[2], "- legacy: table dropped");
    }

    #[test]
    fn test_text_round_trip() {
        let report = sample_report();
        let text = render_text(&report);
        let back = parse_text("A", "B", text.as_bytes()).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_empty_report_renders_zero_lines() {
        let report = MigrationReport {
            previous_version: "A".to_string(),
            new_version: "B".to_string(),
            changes: vec![],
        };
        let text = render_text(&report);
        assert!(text.is_empty());
        let back = parse_text("A", "B", text.as_bytes()).unwrap();
        assert!(back.changes.is_empty());
    }

    #[test]
    fn test_structured_round_trip() {
        let report = sample_report();
        let bytes = encode_structured(&report).unwrap();
        assert_eq!(decode_structured(&bytes).unwrap(), report);
    }

    #[test]
    fn test_binary_round_trip() {
        let report = sample_report();
        let bytes = encode_binary(&report).unwrap();
        assert_eq!(decode_binary(&bytes).unwrap(), report);
    }

    #[test]
    fn test_all_encodings_agree() {
        let report = sample_report();
        let artifacts = emit(&report).unwrap();
        let from_text = parse_text("A", "B", &artifacts.text).unwrap();
        let from_structured = decode_structured(&artifacts.structured).unwrap();
        let from_binary = decode_binary(&artifacts.binary).unwrap();
        assert_eq!(from_text, report);
        assert_eq!(from_structured, report);
        assert_eq!(from_binary, report);
    }
}
