use crate::db;
use crate::error::{Result, StoreError};
use crate::fiches::Fiches;
use crate::migrate;
use crate::paths;
use rusqlite::backup::Backup;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PAGES_PER_STEP: i32 = 200;
const PAUSE_BETWEEN_STEPS: Duration = Duration::from_millis(25);

/// Writes `fiches` as a standalone SQLite store at `path`, which must not be
/// the live store or one of its side files.
pub fn backup_to(fiches: &Fiches, live: Option<&Path>, path: &Path) -> Result<()> {
    paths::ensure_parent_dir(path)?;
    let target = canonicalize_path(path)?;
    if let Some(live) = live {
        let live = canonicalize_path(live)?;
        if live == target
            || is_side_file(&target, &live)
            || is_same_file_identity(&target, &live)?
        {
            return Err(StoreError::InvalidBackupPath(path.to_path_buf()));
        }
    }

    let mut source = db::open_in_memory()?;
    migrate::run_migrations(&mut source)?;
    db::write_records(&mut source, fiches)?;

    let mut dest = Connection::open(&target)?;
    let backup = Backup::new(&source, &mut dest)?;
    backup.run_to_completion(PAGES_PER_STEP, PAUSE_BETWEEN_STEPS, None)?;
    drop(backup);
    db::restrict_db_permissions(&target)?;
    Ok(())
}

fn canonicalize_path(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(fs::canonicalize(path)?);
    }
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let parent = fs::canonicalize(parent)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::InvalidBackupPath(path.to_path_buf()))?;
    Ok(parent.join(file_name))
}

fn is_side_file(target: &Path, live: &Path) -> bool {
    ["-journal", ".tmp", ".corrupt"].iter().any(|suffix| {
        let mut side = live.as_os_str().to_owned();
        side.push(suffix);
        target == Path::new(&side)
    })
}

#[cfg(unix)]
fn is_same_file_identity(target: &Path, live: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;
    if !target.exists() || !live.exists() {
        return Ok(false);
    }
    let target_meta = fs::metadata(target)?;
    let live_meta = fs::metadata(live)?;
    Ok(target_meta.dev() == live_meta.dev() && target_meta.ino() == live_meta.ino())
}

#[cfg(not(unix))]
fn is_same_file_identity(_target: &Path, _live: &Path) -> Result<bool> {
    Ok(false)
}
