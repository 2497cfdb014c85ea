//! Shared helpers and fake collaborators for engine integration tests

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use packvault_core::{
    Change, DiffEngine, DiffOutcome, Error, PackReader, ProgressSink, Result, SchemaCompiler,
    SchemaDocument, SchemaSource, TableDef,
};

/// Build a SystemTime from seconds since the epoch.
pub fn at_secs(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// A schema document distinguishable by a single marker table name.
pub fn document(version: &str, table: &str) -> SchemaDocument {
    SchemaDocument {
        version: version.to_string(),
        tables: vec![TableDef {
            name: table.to_string(),
            columns: vec![],
        }],
    }
}

/// Write a live installation: the version marker plus pack files. An
/// existing installation is replaced wholesale, as the game's releases do.
pub fn write_install(root: &Path, version: &str, packs: &[(&str, &[u8])]) {
    if root.exists() {
        fs::remove_dir_all(root).unwrap();
    }
    fs::create_dir_all(root).unwrap();
    fs::write(root.join("version.txt"), version).unwrap();
    for (relative, data) in packs {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }
}

/// Schema source returning a fixed document with a chosen mtime, or nothing.
pub struct StubSchemaSource {
    doc: Option<(SchemaDocument, SystemTime)>,
}

impl StubSchemaSource {
    pub fn absent() -> Self {
        StubSchemaSource { doc: None }
    }

    pub fn with(doc: SchemaDocument, mtime_secs: u64) -> Self {
        StubSchemaSource {
            doc: Some((doc, at_secs(mtime_secs))),
        }
    }
}

impl SchemaSource for StubSchemaSource {
    fn load(&self) -> Result<Option<(SchemaDocument, SystemTime)>> {
        Ok(self.doc.clone())
    }
}

/// Diff engine returning canned changes, or failing on request. Records what
/// it saw of the previous snapshot for later assertions.
pub struct FakeDiffEngine {
    changes: Vec<Change>,
    fail: bool,
    pub seen_previous_packs: RefCell<Option<Vec<String>>>,
    pub seen_previous_version: RefCell<Option<String>>,
}

impl FakeDiffEngine {
    pub fn returning(changes: Vec<Change>) -> Self {
        FakeDiffEngine {
            changes,
            fail: false,
            seen_previous_packs: RefCell::new(None),
            seen_previous_version: RefCell::new(None),
        }
    }

    pub fn failing() -> Self {
        FakeDiffEngine {
            changes: vec![],
            fail: true,
            seen_previous_packs: RefCell::new(None),
            seen_previous_version: RefCell::new(None),
        }
    }
}

impl DiffEngine for FakeDiffEngine {
    fn diff(
        &self,
        previous: &dyn PackReader,
        previous_schema: &SchemaDocument,
        _live: &dyn PackReader,
        target_version: &str,
        _detect_data_changes: bool,
        _progress: Option<&dyn ProgressSink>,
    ) -> Result<DiffOutcome> {
        if self.fail {
            return Err(Error::UpdateFailed("simulated diff failure".to_string()));
        }
        *self.seen_previous_packs.borrow_mut() = Some(previous.pack_files()?);
        *self.seen_previous_version.borrow_mut() = Some(previous.reported_version()?);
        let mut schema = previous_schema.clone();
        schema.version = target_version.to_string();
        Ok(DiffOutcome {
            changes: self.changes.clone(),
            schema,
        })
    }
}

/// Compiler counting its invocations.
#[derive(Default)]
pub struct CountingCompiler {
    pub compiled: Cell<u64>,
}

impl SchemaCompiler for CountingCompiler {
    fn compile(&self, _schema: &SchemaDocument) -> Result<()> {
        self.compiled.set(self.compiled.get() + 1);
        Ok(())
    }
}

/// Progress sink counting events.
#[derive(Default)]
pub struct CountingSink {
    pub events: Cell<u64>,
}

impl ProgressSink for CountingSink {
    fn progress(&self, _stage: &str, _done: u64, _total: u64) {
        self.events.set(self.events.get() + 1);
    }
}
