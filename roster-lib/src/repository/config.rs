use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use getset::Getters;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{countries::DEFAULT_COUNTRY, fs::config_dir, fs::data_dir};

const CURRENT_CONFIG_VERSION: u16 = 1;
const FILE_NAME: &str = "core.toml";

pub const DEFAULT_RECORDS_KEY: &str = "records";
pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/all?fields=name";

/// Handle to the library's core configuration
pub type Cfg = Arc<RwLock<CoreConfig>>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to access configuration file: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed configuration file: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// The library's core configuration, serialized to TOML. Missing keys and sections fall back
/// to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
#[getset(get = "pub")]
pub struct CoreConfig {
    version: u16,
    storage: StorageConfig,
    countries: CountriesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
#[getset(get = "pub")]
pub struct StorageConfig {
    /// Storage key the record array lives under
    records_key: String,
    /// Overrides the XDG data directory when set
    #[serde(skip_serializing_if = "Option::is_none")]
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
#[getset(get = "pub")]
pub struct CountriesConfig {
    /// Endpoint returning the country reference list
    url: String,
    /// Country preselected in a fresh form
    default: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            storage: StorageConfig::default(),
            countries: <CountriesConfig as Default>::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            records_key: DEFAULT_RECORDS_KEY.into(),
            data_dir: None,
        }
    }
}

impl Default for CountriesConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_COUNTRIES_URL.into(),
            default: DEFAULT_COUNTRY.into(),
        }
    }
}

impl CoreConfig {
    /// Load `core.toml` from the configuration directory, writing the defaults if it doesn't
    /// exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir()?.join(FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            debug!("No configuration at {}, writing defaults", path.display());
            let cfg = Self::default();
            cfg.save_to(path)?;
            Ok(cfg)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_dir()?.join(FILE_NAME))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;

        Ok(())
    }

    /// The directory records are stored in: the override if set, otherwise the XDG data
    /// directory.
    pub fn resolve_data_dir(&self) -> io::Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => data_dir(),
        }
    }

    pub fn set_data_dir(&mut self, dir: impl Into<PathBuf>) {
        self.storage.data_dir = Some(dir.into());
    }

    #[cfg(test)]
    /// Return a mock [`CoreConfig`] that never touches the user's directories.
    pub(crate) fn mock() -> Self {
        let mut cfg = Self::default();
        cfg.countries.url = "http://localhost/countries".into();
        cfg
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILE_NAME);

        let cfg = CoreConfig::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(cfg, CoreConfig::default());
        assert_eq!(cfg.countries().default(), "Nepal");
        assert_eq!(cfg.storage().records_key(), "records");
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);

        let mut cfg = CoreConfig::mock();
        cfg.set_data_dir(dir.path().join("data"));
        cfg.save_to(&path).unwrap();

        let loaded = CoreConfig::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.resolve_data_dir().unwrap(), dir.path().join("data"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "version = 1\n\n[storage]\nrecords_key = \"people\"\n").unwrap();

        let cfg = CoreConfig::load_from(&path).unwrap();

        assert_eq!(cfg.storage().records_key(), "people");
        assert_eq!(cfg.storage().data_dir(), &None);
        assert_eq!(cfg.countries(), &<CountriesConfig as Default>::default());
        assert_eq!(cfg.countries().default(), "Nepal");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "").unwrap();

        assert_eq!(CoreConfig::load_from(&path).unwrap(), CoreConfig::default());
    }

    #[test]
    fn test_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "version = \"one\"").unwrap();

        assert!(matches!(CoreConfig::load_from(&path), Err(Error::TomlDe(_))));
    }
}
