//! Configuration management for qsolog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::export::ExportHeader;
use crate::fields::{self, InputPolicy};
use crate::form::FormDefaults;
use crate::qso::{Band, Mode, QsoDirection};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "qsolog";

/// Default log file name.
const LOG_FILE_NAME: &str = "log.json";

/// Prefix of configuration environment variables.
const ENV_PREFIX: &str = "QSOLOG_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `QSOLOG_`, sections separated by
///    `__`, e.g. `QSOLOG_STORAGE__LOG_PATH`)
/// 2. TOML config file at `~/.config/qsolog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Operator station defaults.
    pub station: StationConfig,
    /// Data entry configuration.
    pub entry: EntryConfig,
    /// ADIF export configuration.
    pub export: ExportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the log file.
    /// Defaults to `~/.local/share/qsolog/log.json`
    pub log_path: Option<PathBuf>,
}

/// Operator station defaults, used when creating a log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Operator call sign.
    pub mycall: Option<String>,
    /// Operator Maidenhead grid square.
    pub grid: Option<String>,
}

/// Data entry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    /// How invalid input is handled.
    pub policy: InputPolicy,
    /// Mode preselected on the entry form.
    pub default_mode: Mode,
    /// Band preselected on the entry form.
    pub default_band: Band,
    /// QSO direction preselected on the entry form.
    pub default_qso: QsoDirection,
}

/// ADIF export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Program named in the export header.
    pub program: String,
    /// Author named in the export header.
    /// Defaults to the log's operator call sign.
    pub author: Option<String>,
}

impl Default for EntryConfig {
    fn default() -> Self {
        let form = FormDefaults::default();
        Self {
            policy: InputPolicy::default(),
            default_mode: form.mode,
            default_band: form.band,
            default_qso: form.qso,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            program: concat!("qsolog ", env!("CARGO_PKG_VERSION")).to_string(),
            author: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `QSOLOG_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single TOML file, without the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be parsed or is
    /// invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::FileRead {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let invalid = |err: Error| Error::ConfigValidation {
            message: format!("station: {err}"),
        };
        if let Some(mycall) = &self.station.mycall {
            fields::validate_mycall(mycall, InputPolicy::Reject).map_err(invalid)?;
        }
        if let Some(grid) = &self.station.grid {
            fields::validate_grid(grid).map_err(invalid)?;
        }

        if self.export.program.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "export.program must not be empty".to_string(),
            });
        }

        if self
            .storage
            .log_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "storage.log_path must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the log file path, resolving defaults if not set.
    ///
    /// A relative configured path is taken relative to the data directory.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        match &self.storage.log_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => Self::default_data_dir().join(path),
            None => Self::default_data_dir().join(LOG_FILE_NAME),
        }
    }

    /// Selections the entry form starts with.
    #[must_use]
    pub fn form_defaults(&self) -> FormDefaults {
        FormDefaults {
            mode: self.entry.default_mode,
            band: self.entry.default_band,
            qso: self.entry.default_qso,
        }
    }

    /// Export header for a log with the given operator call sign.
    #[must_use]
    pub fn export_header(&self, mycall: &str) -> ExportHeader {
        ExportHeader {
            program: self.export.program.clone(),
            author: self
                .export
                .author
                .clone()
                .unwrap_or_else(|| mycall.to_string()),
        }
    }
}
