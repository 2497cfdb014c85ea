//! Schema definition documents
//!
//! A [`SchemaDocument`] describes the relational shape of one release of the
//! external game data: the tables it contains and their columns. Documents
//! carry their own version label, which must match the archive's version
//! marker whenever the document is current.
//!
//! Documents round-trip through JSON (the archive's textual form). The
//! finalize/compile step that turns a document into queryable structures is
//! external; see [`crate::traits::SchemaCompiler`].

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Column value type as exposed by the external data packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Signed integer
    Int,
    /// Floating point
    Float,
    /// UTF-8 string
    Text,
    /// Raw byte blob
    Blob,
    /// Foreign reference into another table
    Ref,
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Value type
    pub column_type: ColumnType,
    /// Whether the column may be absent in a row
    #[serde(default)]
    pub nullable: bool,
}

/// One table of the external data's relational shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name
    pub name: String,
    /// Ordered column definitions
    pub columns: Vec<ColumnDef>,
}

/// Versioned description of the external data's relational shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Version label of the release this document describes.
    /// Compared only for equality, never ordered.
    pub version: String,
    /// Ordered table definitions
    pub tables: Vec<TableDef>,
}

impl SchemaDocument {
    /// Create an empty document for the given version label.
    pub fn new(version: impl Into<String>) -> Self {
        SchemaDocument {
            version: version.into(),
            tables: Vec::new(),
        }
    }

    /// Serialize to the archive's textual form (pretty JSON).
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Deserialize from the archive's textual form.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
