pub mod backup;
pub mod db;
pub mod error;
pub mod fiches;
pub mod index;
pub mod merge;
pub mod migrate;
pub mod paths;
pub mod shared;
pub mod snapshot;

pub use error::{Result, StoreError, StoreErrorKind};
pub use fiches::Fiches;
pub use merge::{ImportReport, MergeReport, SecondaryUniqueness};
pub use shared::{FicheStore, OpenReport, StoreOptions};
pub use snapshot::{
    open_snapshot, JsonSnapshot, Loaded, MemorySnapshot, Snapshot, SnapshotFormat, SqliteSnapshot,
};
