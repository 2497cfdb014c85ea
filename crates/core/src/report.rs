//! Migration reports and changes
//!
//! A [`MigrationReport`] records one version transition: the previous and new
//! version labels plus the ordered changes the diff engine detected. The
//! orchestrator treats each [`Change`] as opaque; all it requires is a stable
//! one-line text form and stable ordering.
//!
//! Text form: `<sigil> <entity>: <detail>` where the sigil is `+` (added),
//! `-` (removed) or `~` (modified). The entity must not itself contain `": "`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Kind of a detected change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Entity appeared in the new version
    Added,
    /// Entity disappeared in the new version
    Removed,
    /// Entity exists in both versions but differs
    Modified,
}

impl ChangeKind {
    fn sigil(self) -> char {
        match self {
            ChangeKind::Added => '+',
            ChangeKind::Removed => '-',
            ChangeKind::Modified => '~',
        }
    }

    fn from_sigil(c: char) -> Option<Self> {
        match c {
            '+' => Some(ChangeKind::Added),
            '-' => Some(ChangeKind::Removed),
            '~' => Some(ChangeKind::Modified),
            _ => None,
        }
    }
}

/// One detected difference between two data snapshots.
///
/// Produced by the external diff engine; the orchestrator only renders and
/// orders changes, it never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// The table, column, or record the change concerns
    pub entity: String,
    /// What happened to it
    pub kind: ChangeKind,
    /// Human-readable description of the difference
    pub detail: String,
}

impl Change {
    /// Construct a change record.
    pub fn new(kind: ChangeKind, entity: impl Into<String>, detail: impl Into<String>) -> Self {
        Change {
            entity: entity.into(),
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind.sigil(), self.entity, self.detail)
    }
}

impl FromStr for Change {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut chars = line.chars();
        let kind = chars
            .next()
            .and_then(ChangeKind::from_sigil)
            .ok_or_else(|| Error::Decode(format!("bad change line: {line:?}")))?;
        let rest = chars.as_str();
        let rest = rest
            .strip_prefix(' ')
            .ok_or_else(|| Error::Decode(format!("bad change line: {line:?}")))?;
        let (entity, detail) = rest
            .split_once(": ")
            .ok_or_else(|| Error::Decode(format!("bad change line: {line:?}")))?;
        Ok(Change {
            entity: entity.to_string(),
            kind,
            detail: detail.to_string(),
        })
    }
}

/// The outcome of one successful migration.
///
/// Persisted in three parallel encodings (text, structured, binary) which
/// must all represent identical logical content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Version the active schema had before the migration
    pub previous_version: String,
    /// Version the live data reported
    pub new_version: String,
    /// Detected changes, in diff engine order
    pub changes: Vec<Change>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_display_sigils() {
        let added = Change::new(ChangeKind::Added, "items", "new table");
        let removed = Change::new(ChangeKind::Removed, "spells.cost", "column dropped");
        let modified = Change::new(ChangeKind::Modified, "npcs", "12 rows changed");
        assert_eq!(added.to_string(), "+ items: new table");
        assert_eq!(removed.to_string(), "- spells.cost: column dropped");
        assert_eq!(modified.to_string(), "~ npcs: 12 rows changed");
    }

    #[test]
    fn test_change_parse_round_trip() {
        let change = Change::new(ChangeKind::Modified, "items", "column level: int -> float");
        let parsed: Change = change.to_string().parse().unwrap();
        assert_eq!(parsed, change);
    }

    #[test]
    fn test_change_parse_rejects_garbage() {
        assert!("? items: what".parse::<Change>().is_err());
        assert!("+items: missing space".parse::<Change>().is_err());
        assert!("+ no separator".parse::<Change>().is_err());
    }

    #[test]
    fn test_report_serde_round_trip() {
        let report = MigrationReport {
            previous_version: "A".to_string(),
            new_version: "B".to_string(),
            changes: vec![Change::new(ChangeKind::Added, "items", "new table")],
        };
        let json = serde_json::to_vec(&report).unwrap();
        let back: MigrationReport = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, report);
    }
}
