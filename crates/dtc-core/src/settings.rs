//! Settings: storage layout, asset locations and mail configuration.
//!
//! Values come from an optional YAML file, then environment variables
//! (which win). A `.env` file is loaded by the binary before this runs.

use crate::error::ConfigError;
use crate::DEFAULT_LANGUAGE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_STORAGE_ROOT: &str = "storage";
const DEFAULT_RETENTION_DAYS: i64 = 30;
const DEFAULT_MAIL_PORT: u16 = 587;
const DEFAULT_MAIL_SENDER: &str = "reports@example.com";
const DB_FILENAME: &str = "metadata.db";

/// Workspace copies of the shipped assets, used when nothing else is found.
const WORKSPACE_I18N_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../i18n");
const WORKSPACE_KB_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/obd_codes.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub use_tls: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub storage_root: PathBuf,
    pub upload_dir: PathBuf,
    pub report_dir: PathBuf,
    pub database_path: PathBuf,
    pub i18n_dir: PathBuf,
    pub knowledge_base_path: PathBuf,
    pub default_language: String,
    pub retention_days: i64,
    pub mail: Option<MailSettings>,
}

/// Partial settings as written in a YAML config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub storage_root: Option<PathBuf>,
    pub i18n_dir: Option<PathBuf>,
    pub knowledge_base_path: Option<PathBuf>,
    pub default_language: Option<String>,
    pub retention_days: Option<i64>,
    pub mail: Option<FileMailConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileMailConfig {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sender: Option<String>,
    pub use_tls: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl Settings {
    /// Load from the process environment, optionally layered over a YAML file.
    ///
    /// `VEHICLESCAN_CONFIG` names the file when `config_path` is `None`.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var("VEHICLESCAN_CONFIG").ok().map(PathBuf::from);
        let file = match config_path.map(Path::to_path_buf).or(env_path) {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Build settings from a parsed file and an environment lookup.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_root = env("APP_STORAGE_ROOT")
            .map(PathBuf::from)
            .or(file.storage_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT));

        let i18n_dir = env("VEHICLESCAN_I18N_DIR")
            .map(PathBuf::from)
            .or(file.i18n_dir)
            .unwrap_or_else(default_i18n_dir);

        let knowledge_base_path = env("VEHICLESCAN_KB_PATH")
            .map(PathBuf::from)
            .or(file.knowledge_base_path)
            .unwrap_or_else(default_knowledge_base_path);

        let default_language = env("VEHICLESCAN_DEFAULT_LANGUAGE")
            .or(file.default_language)
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let retention_days = match env("VEHICLESCAN_RETENTION_DAYS") {
            Some(raw) => parse_value("VEHICLESCAN_RETENTION_DAYS", &raw, "number of days")?,
            None => file.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
        };

        let mail = mail_settings(file.mail.unwrap_or_default(), &env)?;

        Ok(Settings {
            upload_dir: storage_root.join("uploads"),
            report_dir: storage_root.join("reports"),
            database_path: storage_root.join(DB_FILENAME),
            storage_root,
            i18n_dir,
            knowledge_base_path,
            default_language,
            retention_days,
            mail,
        })
    }

    /// Create the storage, upload and report directories.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        for dir in [&self.storage_root, &self.upload_dir, &self.report_dir] {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Mail is enabled only when a server is named (env `MAIL_SERVER` or the file).
fn mail_settings<F>(file: FileMailConfig, env: &F) -> Result<Option<MailSettings>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let server = match env("MAIL_SERVER").or(file.server) {
        Some(server) => server,
        None => return Ok(None),
    };

    let port = match env("MAIL_PORT") {
        Some(raw) => parse_value("MAIL_PORT", &raw, "port")?,
        None => file.port.unwrap_or(DEFAULT_MAIL_PORT),
    };

    let use_tls = match env("MAIL_USE_TLS") {
        Some(raw) => raw.trim().eq_ignore_ascii_case("true"),
        None => file.use_tls.unwrap_or(true),
    };

    Ok(Some(MailSettings {
        server,
        port,
        username: env("MAIL_USERNAME").or(file.username).unwrap_or_default(),
        password: env("MAIL_PASSWORD").or(file.password).unwrap_or_default(),
        sender: env("MAIL_SENDER")
            .or(file.sender)
            .unwrap_or_else(|| DEFAULT_MAIL_SENDER.to_string()),
        use_tls,
    }))
}

fn parse_value<T: std::str::FromStr>(
    key: &str,
    raw: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        expected,
    })
}

/// `./i18n` when present in the working directory, else the workspace copy.
pub fn default_i18n_dir() -> PathBuf {
    first_existing(Path::new("i18n"), WORKSPACE_I18N_DIR)
}

/// `./data/obd_codes.json` when present in the working directory, else the workspace copy.
pub fn default_knowledge_base_path() -> PathBuf {
    first_existing(Path::new("data/obd_codes.json"), WORKSPACE_KB_PATH)
}

fn first_existing(local: &Path, workspace: &str) -> PathBuf {
    if local.exists() {
        local.to_path_buf()
    } else {
        PathBuf::from(workspace)
    }
}
