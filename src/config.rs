//! Configuration management for parkwatch
//!
//! Read from `parkwatch.toml` in the working directory (or an explicit path).
//! Every key is optional. `PARKWATCH_DATA_DIR` overrides `data_dir`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "parkwatch.toml";
pub const DATA_DIR_ENV: &str = "PARKWATCH_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the three tables
    pub data_dir: PathBuf,

    pub vehicles_file: String,
    pub rates_file: String,
    pub layout_file: String,

    /// Symbol printed in front of rent amounts
    pub currency: String,

    /// Bind address for parkwatch-server
    pub server_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            vehicles_file: "vehicles.csv".to_string(),
            rates_file: "rent_rates.csv".to_string(),
            layout_file: "parking_layout.csv".to_string(),
            currency: "₹".to_string(),
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// With `explicit` set, the file must exist. Otherwise `parkwatch.toml` is
    /// used when present and defaults apply when it is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn vehicles_path(&self) -> PathBuf {
        self.data_dir.join(&self.vehicles_file)
    }

    pub fn rates_path(&self) -> PathBuf {
        self.data_dir.join(&self.rates_file)
    }

    pub fn layout_path(&self) -> PathBuf {
        self.data_dir.join(&self.layout_file)
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Data dir:   {}", self.data_dir.display())?;
        writeln!(f, "Vehicles:   {}", self.vehicles_path().display())?;
        writeln!(f, "Rates:      {}", self.rates_path().display())?;
        writeln!(f, "Layout:     {}", self.layout_path().display())?;
        writeln!(f, "Currency:   {}", self.currency)?;
        write!(f, "Server:     {}", self.server_addr)
    }
}
