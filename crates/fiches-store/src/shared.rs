use crate::backup;
use crate::error::{Result, StoreError};
use crate::fiches::Fiches;
use crate::merge::{ImportReport, SecondaryUniqueness};
use crate::snapshot::{self, open_snapshot, MemorySnapshot, Snapshot, SnapshotFormat};
use fiches_core::domain::PhoneKey;
use fiches_import::{parse_text, ImportOptions};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub secondary_uniqueness: SecondaryUniqueness,
    pub import: ImportOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenReport {
    pub path: Option<PathBuf>,
    pub format: SnapshotFormat,
    pub records: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
struct WriterState {
    /// The file on disk failed to load and has not been moved aside yet.
    quarantine_pending: bool,
}

/// Shared handle over one store: concurrent lookups, one writer at a time.
pub struct FicheStore {
    snapshot: Box<dyn Snapshot>,
    options: StoreOptions,
    current: RwLock<Arc<Fiches>>,
    writer: Mutex<WriterState>,
}

impl FicheStore {
    /// Never fails: an unreadable store opens empty and the reason is
    /// returned in `OpenReport::warnings`.
    pub fn open(snapshot: Box<dyn Snapshot>, options: StoreOptions) -> (Self, OpenReport) {
        let mut warnings = Vec::new();
        let mut state = WriterState::default();
        let fiches = match snapshot.load() {
            Ok(loaded) => {
                warnings.extend(loaded.warnings);
                loaded.fiches
            }
            Err(err) => {
                let err = StoreError::PersistenceRead {
                    path: snapshot.path().map(Path::to_path_buf).unwrap_or_default(),
                    source: Box::new(err),
                };
                warn!(error = %err, "starting from an empty store");
                warnings.push(err.to_string());
                state.quarantine_pending = true;
                Fiches::new()
            }
        };

        let report = OpenReport {
            path: snapshot.path().map(Path::to_path_buf),
            format: snapshot.format(),
            records: fiches.len(),
            warnings,
        };
        debug!(
            format = report.format.as_str(),
            records = report.records,
            "store opened"
        );

        let store = Self {
            snapshot,
            options,
            current: RwLock::new(Arc::new(fiches)),
            writer: Mutex::new(state),
        };
        (store, report)
    }

    pub fn open_path(
        path: PathBuf,
        format: Option<SnapshotFormat>,
        options: StoreOptions,
    ) -> (Self, OpenReport) {
        Self::open(open_snapshot(path, format), options)
    }

    pub fn open_in_memory(options: StoreOptions) -> Self {
        Self::open(Box::new(MemorySnapshot::default()), options).0
    }

    pub fn path(&self) -> Option<&Path> {
        self.snapshot.path()
    }

    pub fn format(&self) -> SnapshotFormat {
        self.snapshot.format()
    }

    /// The current immutable view; later imports never change it.
    pub fn snapshot(&self) -> Arc<Fiches> {
        Arc::clone(&*self.current.read())
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, raw: &str) -> Result<Option<String>> {
        let key = PhoneKey::parse(raw)?;
        Ok(self.snapshot().get(&key).map(str::to_string))
    }

    /// Parse, merge into a copy, persist when something changed, then publish.
    pub fn import(&self, text: &str) -> Result<ImportReport> {
        let mut writer = self.writer.lock();
        let batch = parse_text(text, &self.options.import);
        let mut next = Fiches::clone(&self.snapshot());
        let report = next.merge_batch(batch, self.options.secondary_uniqueness);

        if report.is_mutated() {
            if let Err(err) = self.persist(&mut writer, &next) {
                warn!(error = %err, "import not saved");
                return Err(StoreError::PersistenceWrite {
                    path: self.path().map(Path::to_path_buf).unwrap_or_default(),
                    report: Box::new(report),
                    source: Box::new(err),
                });
            }
            *self.current.write() = Arc::new(next);
        }

        info!(
            format = report.format.as_str(),
            added = report.added,
            updated = report.updated,
            duplicate = report.duplicate,
            skipped = report.skipped,
            "import finished"
        );
        Ok(report)
    }

    /// Rewrites the store file from the current snapshot.
    pub fn flush(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        let fiches = self.snapshot();
        self.persist(&mut writer, &fiches)
    }

    pub fn export_text(&self) -> String {
        self.snapshot().export_text()
    }

    pub fn backup_to(&self, path: &Path) -> Result<()> {
        let fiches = self.snapshot();
        backup::backup_to(&fiches, self.path(), path)
    }

    fn persist(&self, writer: &mut WriterState, fiches: &Fiches) -> Result<()> {
        if writer.quarantine_pending {
            if let Some(moved) = self.path().map(snapshot::quarantine).transpose()?.flatten() {
                warn!(path = %moved.display(), "unreadable store moved aside");
            }
            writer.quarantine_pending = false;
        }
        self.snapshot.save(fiches)
    }
}
