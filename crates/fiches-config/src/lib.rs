use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use fiches_import::RowLayout;
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "fiches";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub store_path: Option<PathBuf>,
    /// `None` picks the format from the store file extension.
    pub format: Option<StoreFormat>,
    pub secondary_uniqueness: bool,
    pub layout: RowLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    Sqlite,
    Json,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid store_path: {0}")]
    InvalidStorePath(PathBuf),
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    store_path: Option<PathBuf>,
    format: Option<StoreFormat>,
    secondary_uniqueness: Option<bool>,
    layout: Option<LayoutFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutFile {
    separator: Option<String>,
    min_fields: Option<usize>,
    phone: Option<usize>,
    birth_date: Option<Slot>,
    address: Option<Vec<usize>>,
    email: Option<Slot>,
    iban: Option<Slot>,
    bic: Option<Slot>,
    name: Option<Slot>,
    given_name: Option<Slot>,
}

/// An optional column: a position, or `false` to leave it out.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Slot {
    At(usize),
    Enabled(bool),
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path.clone()) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(store_path) = parsed.store_path {
        if store_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidStorePath(store_path));
        }
        config.store_path = Some(store_path);
    }
    config.format = parsed.format;
    if let Some(enforce) = parsed.secondary_uniqueness {
        config.secondary_uniqueness = enforce;
    }
    if let Some(layout) = parsed.layout {
        config.layout = merge_layout(layout)?;
    }

    Ok(config)
}

fn merge_layout(file: LayoutFile) -> Result<RowLayout> {
    let mut layout = RowLayout::default();

    if let Some(separator) = file.separator {
        let mut chars = separator.chars();
        layout.separator = match (chars.next(), chars.next()) {
            (Some(ch), None) => ch,
            _ => {
                return Err(ConfigError::InvalidLayout(format!(
                    "separator must be a single character, got {separator:?}"
                )))
            }
        };
    }
    if let Some(min_fields) = file.min_fields {
        layout.min_fields = min_fields;
    }
    if let Some(phone) = file.phone {
        layout.phone = phone;
    }
    if let Some(address) = file.address {
        layout.address = address;
    }
    layout.birth_date = slot("birth_date", file.birth_date, layout.birth_date)?;
    layout.email = slot("email", file.email, layout.email)?;
    layout.iban = slot("iban", file.iban, layout.iban)?;
    layout.bic = slot("bic", file.bic, layout.bic)?;
    layout.name = slot("name", file.name, None)?;
    layout.given_name = slot("given_name", file.given_name, None)?;

    layout
        .validate()
        .map_err(|err| ConfigError::InvalidLayout(err.to_string()))?;
    Ok(layout)
}

fn slot(field: &str, value: Option<Slot>, default: Option<usize>) -> Result<Option<usize>> {
    match value {
        None => Ok(default),
        Some(Slot::At(position)) => Ok(Some(position)),
        Some(Slot::Enabled(false)) => Ok(None),
        Some(Slot::Enabled(true)) => Err(ConfigError::InvalidLayout(format!(
            "{field} must be a position or false"
        ))),
    }
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
