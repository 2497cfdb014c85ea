//! Core types and traits for PackVault
//!
//! This crate defines the foundational types used throughout the system:
//! - SchemaDocument: versioned description of the external data's shape
//! - Change / MigrationReport: what a migration detected and recorded
//! - Error: error type hierarchy
//! - Traits: collaborator contracts (PackReader, DiffEngine, SchemaSource,
//!   SchemaCompiler, ProgressSink)
//!
//! Version labels are plain strings, compared only for equality.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod report;
pub mod schema;
pub mod traits;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use report::{Change, ChangeKind, MigrationReport};
pub use schema::{ColumnDef, ColumnType, SchemaDocument, TableDef};
pub use traits::{
    DiffEngine, DiffOutcome, NoopCompiler, PackReader, ProgressSink, SchemaCompiler, SchemaSource,
};
