use crate::error::{Result, StoreError};
use chrono::Utc;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "fiches";
const STORE_FILENAME: &str = "fiches.sqlite3";
const BACKUP_DIR: &str = "backups";

pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_DATA_HOME") {
        let path = PathBuf::from(dir);
        if path.as_os_str().is_empty() {
            return Err(StoreError::InvalidDataPath(path));
        }
        return Ok(path.join(APP_DIR));
    }

    let home = dirs::home_dir().ok_or(StoreError::MissingHomeDir)?;
    Ok(home.join(".local").join("share").join(APP_DIR))
}

pub fn ensure_data_dir() -> Result<PathBuf> {
    let dir = data_dir()?;
    ensure_dir(&dir)?;
    Ok(dir)
}

pub fn store_path() -> Result<PathBuf> {
    Ok(ensure_data_dir()?.join(STORE_FILENAME))
}

pub fn store_path_in(dir: &Path) -> PathBuf {
    dir.join(STORE_FILENAME)
}

/// `<data dir>/backups/fiches-<unix ts>.sqlite3`
pub fn default_backup_path() -> Result<PathBuf> {
    let dir = ensure_data_dir()?.join(BACKUP_DIR);
    ensure_dir(&dir)?;
    Ok(backup_path_in(&dir, Utc::now().timestamp()))
}

pub fn backup_path_in(dir: &Path, timestamp: i64) -> PathBuf {
    dir.join(format!("{APP_DIR}-{timestamp}.sqlite3"))
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) if !parent.exists() => {
            fs::create_dir_all(parent)?;
            restrict_dir_permissions(parent)
        }
        _ => Ok(()),
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    restrict_dir_permissions(dir)
}

#[cfg(unix)]
fn restrict_dir_permissions(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(0o700);
    fs::set_permissions(dir, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_dir_permissions(_dir: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{backup_path_in, ensure_parent_dir, store_path_in};
    use std::path::Path;

    #[test]
    fn file_names_are_stable() {
        let dir = Path::new("/data/fiches");
        assert_eq!(
            store_path_in(dir),
            Path::new("/data/fiches/fiches.sqlite3")
        );
        assert_eq!(
            backup_path_in(dir, 1_700_000_000),
            Path::new("/data/fiches/fiches-1700000000.sqlite3")
        );
    }

    #[test]
    fn parent_dirs_are_created() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("a").join("b").join("fiches.sqlite3");
        ensure_parent_dir(&path).expect("create parents");
        assert!(path.parent().expect("parent").is_dir());
    }
}
