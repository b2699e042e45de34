use crate::db;
use crate::error::{Result, StoreError};
use crate::fiches::Fiches;
use crate::migrate;
use fiches_core::domain::PhoneKey;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Sqlite,
    Json,
    Memory,
}

impl SnapshotFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            SnapshotFormat::Sqlite => "sqlite",
            SnapshotFormat::Json => "json",
            SnapshotFormat::Memory => "memory",
        }
    }

    /// `.json` paths hold the legacy keyed-object document.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SnapshotFormat::Json,
            _ => SnapshotFormat::Sqlite,
        }
    }
}

#[derive(Debug, Default)]
pub struct Loaded {
    pub fiches: Fiches,
    pub warnings: Vec<String>,
}

impl Loaded {
    /// Keys are re-normalized; rows whose key no longer parses are dropped.
    fn from_records(records: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut map = BTreeMap::new();
        let mut warnings = Vec::new();
        for (raw, body) in records {
            match PhoneKey::parse(&raw) {
                Ok(key) if map.contains_key(&key) => {
                    warnings.push(format!("stored key {raw:?} duplicates {key}, dropped"));
                }
                Ok(key) => {
                    map.insert(key, body);
                }
                Err(err) => warnings.push(format!("stored key dropped: {err}")),
            }
        }
        for warning in &warnings {
            warn!("{warning}");
        }
        Self {
            fiches: map.into_iter().collect(),
            warnings,
        }
    }
}

/// Whole-store persistence. Both operations are all-or-nothing.
pub trait Snapshot: Send + Sync {
    fn format(&self) -> SnapshotFormat;

    fn path(&self) -> Option<&Path>;

    /// A missing file loads as an empty store.
    fn load(&self) -> Result<Loaded>;

    fn save(&self, fiches: &Fiches) -> Result<()>;
}

impl<S: Snapshot + ?Sized> Snapshot for Arc<S> {
    fn format(&self) -> SnapshotFormat {
        (**self).format()
    }

    fn path(&self) -> Option<&Path> {
        (**self).path()
    }

    fn load(&self) -> Result<Loaded> {
        (**self).load()
    }

    fn save(&self, fiches: &Fiches) -> Result<()> {
        (**self).save(fiches)
    }
}

pub fn open_snapshot(path: PathBuf, format: Option<SnapshotFormat>) -> Box<dyn Snapshot> {
    match format.unwrap_or_else(|| SnapshotFormat::for_path(&path)) {
        SnapshotFormat::Sqlite => Box::new(SqliteSnapshot::new(path)),
        SnapshotFormat::Json => Box::new(JsonSnapshot::new(path)),
        SnapshotFormat::Memory => Box::new(MemorySnapshot::default()),
    }
}

#[derive(Debug, Clone)]
pub struct SqliteSnapshot {
    path: PathBuf,
}

impl SqliteSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Snapshot for SqliteSnapshot {
    fn format(&self) -> SnapshotFormat {
        SnapshotFormat::Sqlite
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn load(&self) -> Result<Loaded> {
        if !self.path.exists() {
            return Ok(Loaded::default());
        }
        let conn = db::open_read_only(&self.path)?;
        migrate::schema_version(&conn)?;
        let records = db::read_records(&conn)?;
        Ok(Loaded::from_records(records))
    }

    fn save(&self, fiches: &Fiches) -> Result<()> {
        let tmp = tmp_path(&self.path);
        remove_if_exists(&tmp)?;
        let written = (|| {
            let mut conn = db::open(&tmp)?;
            migrate::run_migrations(&mut conn)?;
            db::write_records(&mut conn, fiches)?;
            conn.close().map_err(|(_, err)| StoreError::Sql(err))
        })();
        replace_with(&tmp, &self.path, written)
    }
}

/// The keyed-object document: `{"0612345678": "body", ...}`.
#[derive(Debug, Clone)]
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Snapshot for JsonSnapshot {
    fn format(&self) -> SnapshotFormat {
        SnapshotFormat::Json
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn load(&self) -> Result<Loaded> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Loaded::default()),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Loaded::default());
        }
        let records: BTreeMap<String, String> = serde_json::from_str(&raw)?;
        Ok(Loaded::from_records(records))
    }

    fn save(&self, fiches: &Fiches) -> Result<()> {
        let document: BTreeMap<&str, &str> = fiches
            .iter()
            .map(|(key, body)| (key.as_str(), body))
            .collect();
        let tmp = tmp_path(&self.path);
        let written = serde_json::to_string_pretty(&document)
            .map_err(StoreError::from)
            .and_then(|mut json| {
                json.push('\n');
                fs::write(&tmp, json)?;
                db::restrict_db_permissions(&tmp)
            });
        replace_with(&tmp, &self.path, written)
    }
}

/// Keeps the last saved store in memory; nothing touches the disk.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    saved: Mutex<Fiches>,
    read_only: Mutex<bool>,
}

impl MemorySnapshot {
    pub fn with_fiches(fiches: Fiches) -> Self {
        Self {
            saved: Mutex::new(fiches),
            read_only: Mutex::new(false),
        }
    }

    /// Makes every later `save` fail, to exercise write-failure handling.
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.lock() = read_only;
    }

    pub fn saved(&self) -> Fiches {
        self.saved.lock().clone()
    }
}

impl Snapshot for MemorySnapshot {
    fn format(&self) -> SnapshotFormat {
        SnapshotFormat::Memory
    }

    fn path(&self) -> Option<&Path> {
        None
    }

    fn load(&self) -> Result<Loaded> {
        Ok(Loaded {
            fiches: self.saved.lock().clone(),
            warnings: Vec::new(),
        })
    }

    fn save(&self, fiches: &Fiches) -> Result<()> {
        if *self.read_only.lock() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "memory snapshot is read-only",
            )));
        }
        *self.saved.lock() = fiches.clone();
        Ok(())
    }
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    with_suffix(path, ".tmp")
}

/// Moves an unreadable store aside so the next save does not destroy it.
pub(crate) fn quarantine(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let target = with_suffix(path, ".corrupt");
    fs::rename(path, &target)?;
    Ok(Some(target))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn replace_with(tmp: &Path, target: &Path, written: Result<()>) -> Result<()> {
    let renamed = written.and_then(|()| fs::rename(tmp, target).map_err(StoreError::from));
    if renamed.is_err() {
        let _ = fs::remove_file(tmp);
    }
    renamed
}

#[cfg(test)]
mod tests {
    use super::{open_snapshot, tmp_path, JsonSnapshot, Snapshot, SnapshotFormat, SqliteSnapshot};
    use crate::fiches::Fiches;
    use fiches_core::domain::PhoneKey;
    use std::fs;

    fn sample() -> Fiches {
        [
            ("0612345678", "Fiche pour DUPONT Jean\nAdresse: 3 rue Haute"),
            ("0712345678", "Élodie Müller\nnoté « important »"),
        ]
        .into_iter()
        .map(|(key, body)| (PhoneKey::parse(key).unwrap(), body.to_string()))
        .collect()
    }

    #[test]
    fn format_follows_extension() {
        let temp = tempfile::tempdir().expect("tempdir");
        let json = open_snapshot(temp.path().join("db.json"), None);
        assert_eq!(json.format(), SnapshotFormat::Json);
        let sqlite = open_snapshot(temp.path().join("fiches.sqlite3"), None);
        assert_eq!(sqlite.format(), SnapshotFormat::Sqlite);
        let forced = open_snapshot(temp.path().join("db.json"), Some(SnapshotFormat::Sqlite));
        assert_eq!(forced.format(), SnapshotFormat::Sqlite);
    }

    #[test]
    fn sqlite_round_trip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let snapshot = SqliteSnapshot::new(temp.path().join("fiches.sqlite3"));
        assert!(snapshot.load().expect("missing file").fiches.is_empty());

        snapshot.save(&sample()).expect("save");
        assert_eq!(snapshot.load().expect("load").fiches, sample());
        assert!(!tmp_path(&temp.path().join("fiches.sqlite3")).exists());

        snapshot.save(&Fiches::new()).expect("save empty");
        assert!(snapshot.load().expect("load").fiches.is_empty());
    }

    #[test]
    fn json_round_trip_keeps_non_ascii() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("db.json");
        let snapshot = JsonSnapshot::new(&path);
        snapshot.save(&sample()).expect("save");

        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.contains("Élodie Müller"));
        assert_eq!(snapshot.load().expect("load").fiches, sample());
    }

    #[test]
    fn legacy_keys_are_normalized_and_invalid_ones_dropped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("db.json");
        fs::write(
            &path,
            r#"{"06 12 34 56 78": "Jean", "0612345678": "doublon", "abc": "rien"}"#,
        )
        .expect("write");

        let loaded = JsonSnapshot::new(&path).load().expect("load");
        assert_eq!(loaded.fiches.len(), 1);
        assert_eq!(
            loaded.fiches.get(&PhoneKey::parse("0612345678").unwrap()),
            Some("Jean")
        );
        assert_eq!(loaded.warnings.len(), 2);
    }

    #[test]
    fn corrupt_files_fail_to_load() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sqlite = temp.path().join("fiches.sqlite3");
        fs::write(&sqlite, "not a database, just some text").expect("write");
        assert!(SqliteSnapshot::new(&sqlite).load().is_err());

        let json = temp.path().join("db.json");
        fs::write(&json, "{\"0612345678\": ").expect("write");
        assert!(JsonSnapshot::new(&json).load().is_err());
    }
}
