//! Backend configuration.
//!
//! ```yaml
//! data_directory: ./data
//! storage: csv        # or memory
//! log_level: info
//! max_description_length: 1000
//! ```
//!
//! Every key is optional. The file is found through an explicit path, then
//! the `FOODSHARE_CONFIG` environment variable; with neither, defaults
//! apply. `FOODSHARE_DATA_DIR` overrides `data_directory` in all cases.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::donation_service::DEFAULT_MAX_DESCRIPTION_LENGTH;

pub const CONFIG_PATH_ENV: &str = "FOODSHARE_CONFIG";
pub const DATA_DIR_ENV: &str = "FOODSHARE_DATA_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Csv,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub data_directory: PathBuf,
    pub storage: StorageBackend,
    pub log_level: String,
    pub max_description_length: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("data"),
            storage: StorageBackend::Csv,
            log_level: "info".to_string(),
            max_description_length: DEFAULT_MAX_DESCRIPTION_LENGTH,
        }
    }
}

impl BackendConfig {
    /// Parse a YAML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: BackendConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve configuration from `explicit_path` and the environment
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        Self::resolve(
            explicit_path,
            std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from),
            std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
        )
    }

    fn resolve(
        explicit_path: Option<&Path>,
        env_path: Option<PathBuf>,
        env_data_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config = match explicit_path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(path)?,
            None => {
                info!("No config file given, using defaults");
                Self::default()
            }
        };
        if let Some(data_dir) = env_data_dir {
            debug!("{} overrides data directory: {}", DATA_DIR_ENV, data_dir.display());
            config.data_directory = data_dir;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).expect("Failed to write config");
        path
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "config.yaml", "storage: memory\n");

        let config = BackendConfig::from_file(&path).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.data_directory, PathBuf::from("data"));
        assert_eq!(config.max_description_length, DEFAULT_MAX_DESCRIPTION_LENGTH);
    }

    #[test]
    fn test_explicit_path_wins_over_env_path() {
        let temp_dir = TempDir::new().unwrap();
        let explicit = write_config(&temp_dir, "explicit.yaml", "log_level: debug\n");
        let from_env = write_config(&temp_dir, "env.yaml", "log_level: warn\n");

        let config = BackendConfig::resolve(Some(&explicit), Some(from_env.clone()), None).unwrap();
        assert_eq!(config.log_level, "debug");

        let config = BackendConfig::resolve(None, Some(from_env), None).unwrap();
        assert_eq!(config.log_level, "warn");

        assert_eq!(BackendConfig::resolve(None, None, None).unwrap(), BackendConfig::default());
    }

    #[test]
    fn test_data_dir_override() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            "config.yaml",
            "data_directory: /srv/foodshare\nmax_description_length: 200\n",
        );

        let config =
            BackendConfig::resolve(Some(&path), None, Some(PathBuf::from("/tmp/override"))).unwrap();
        assert_eq!(config.data_directory, PathBuf::from("/tmp/override"));
        assert_eq!(config.max_description_length, 200);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "config.yaml", "storage: postgres\n");
        assert!(BackendConfig::from_file(&path).is_err());
        assert!(BackendConfig::from_file(temp_dir.path().join("missing.yaml")).is_err());
    }
}
