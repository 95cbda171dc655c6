//! Freight configuration.
//!
//! Loaded from `~/.freight/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::Storage;

/// Freight configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Path to the `SQLite` database.
    /// Defaults to `~/.freight/freight.sqlite`.
    pub database: Option<PathBuf>,

    /// The acting party (consignor or carrier UUID) when `--as` and
    /// `FREIGHT_IDENTITY` are both absent.
    pub identity: Option<String>,

    /// A `tracing` filter directive such as `"freight=debug"`.
    /// Overridden by `FREIGHT_LOG`.
    pub log: Option<String>,
}

impl Config {
    /// Load config from `~/.freight/config.toml`.
    /// Returns defaults if the file is missing, an error if it is invalid.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// Parse config from TOML text.
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// The config file path: `~/.freight/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".freight").join("config.toml"))
    }

    /// The database path: the configured one, or the default location.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.clone().or_else(Storage::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = Config::parse("").unwrap();
        assert!(config.database.is_none());
        assert!(config.identity.is_none());
        assert!(config.log.is_none());
    }

    #[test]
    fn parses_kebab_case_keys() {
        let config = Config::parse(
            r#"
            database = "/var/lib/freight/freight.sqlite"
            identity = "1c5e4d8e-1b1f-4c87-9f0b-1a6f3c2d9e10"
            log = "freight=debug"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/var/lib/freight/freight.sqlite")
        );
        assert_eq!(config.log.as_deref(), Some("freight=debug"));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(Config::parse("default-identity = \"someone\"").is_err());
    }
}
