use crate::merge::ImportReport;
use fiches_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("migration error: {0}")]
    Migration(String),
    #[error("invalid data path: {0}")]
    InvalidDataPath(PathBuf),
    #[error("invalid backup path (matches store): {0}")]
    InvalidBackupPath(PathBuf),
    #[error("failed to read store {path}: {source}")]
    PersistenceRead {
        path: PathBuf,
        #[source]
        source: Box<StoreError>,
    },
    #[error("failed to save store {path}: {source}")]
    PersistenceWrite {
        path: PathBuf,
        report: Box<ImportReport>,
        #[source]
        source: Box<StoreError>,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Io,
    Sql,
    Json,
    Core,
    MissingHomeDir,
    Migration,
    InvalidDataPath,
    InvalidBackupPath,
    PersistenceRead,
    PersistenceWrite,
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Io(_) => StoreErrorKind::Io,
            StoreError::Sql(_) => StoreErrorKind::Sql,
            StoreError::Json(_) => StoreErrorKind::Json,
            StoreError::Core(_) => StoreErrorKind::Core,
            StoreError::MissingHomeDir => StoreErrorKind::MissingHomeDir,
            StoreError::Migration(_) => StoreErrorKind::Migration,
            StoreError::InvalidDataPath(_) => StoreErrorKind::InvalidDataPath,
            StoreError::InvalidBackupPath(_) => StoreErrorKind::InvalidBackupPath,
            StoreError::PersistenceRead { .. } => StoreErrorKind::PersistenceRead,
            StoreError::PersistenceWrite { .. } => StoreErrorKind::PersistenceWrite,
        }
    }

    /// Counts of the batch whose save failed, when this is a write failure.
    pub fn import_report(&self) -> Option<&ImportReport> {
        match self {
            StoreError::PersistenceWrite { report, .. } => Some(report),
            _ => None,
        }
    }
}
