//! Named robot configurations and their persistence.
//!
//! The session only ever reads a configuration when sending it to the
//! robot; storage lives behind [`ConfigStore`] so the backing can be
//! swapped. A session built without a store treats configurations as
//! unsupported rather than failing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A named drive-geometry configuration for the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    pub name: String,
    /// Wheel diameter in centimeters.
    pub diameter: f64,
    /// Track offset (half the wheel base) in centimeters.
    pub offset: f64,
}

impl RobotConfig {
    pub fn new(name: impl Into<String>, diameter: f64, offset: f64) -> Self {
        Self {
            name: name.into(),
            diameter,
            offset,
        }
    }
}

/// Errors that can occur in the configuration store.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config store contains invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence for named robot configurations.
pub trait ConfigStore: Send + Sync {
    /// Read all stored configurations.
    fn read_configs(&self) -> Result<Vec<RobotConfig>, ConfigError>;

    /// Append one configuration.
    fn create_config(&self, config: &RobotConfig) -> Result<(), ConfigError>;
}

/// A [`ConfigStore`] over a single JSON file holding an array of configs.
///
/// A missing file reads as empty; the file is created on the first write.
#[derive(Debug)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    /// Open a store at `path`, validating any existing content.
    ///
    /// Fails if the file exists but cannot be read or parsed; a corrupt
    /// store should be noticed at construction, not on first use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str::<Vec<RobotConfig>>(&raw)?;
        }
        debug!(?path, "opened config store");
        Ok(Self { path })
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonConfigStore {
    fn read_configs(&self) -> Result<Vec<RobotConfig>, ConfigError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn create_config(&self, config: &RobotConfig) -> Result<(), ConfigError> {
        let mut configs = self.read_configs()?;
        configs.push(config.clone());
        std::fs::write(&self.path, serde_json::to_string_pretty(&configs)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_store_path(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "roverlink-config-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir.join("configs.json")
    }

    #[test]
    fn missing_file_reads_empty() {
        let path = unique_store_path("missing");
        let store = JsonConfigStore::open(&path).unwrap();
        assert!(store.read_configs().unwrap().is_empty());
    }

    #[test]
    fn create_then_read_roundtrips() {
        let path = unique_store_path("roundtrip");
        let store = JsonConfigStore::open(&path).unwrap();

        store
            .create_config(&RobotConfig::new("default", 4.15, 6.49))
            .unwrap();
        store
            .create_config(&RobotConfig::new("outdoor", 5.6, 7.2))
            .unwrap();

        let configs = store.read_configs().unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0], RobotConfig::new("default", 4.15, 6.49));
        assert_eq!(configs[1].name, "outdoor");
    }

    #[test]
    fn reopen_sees_existing_configs() {
        let path = unique_store_path("reopen");
        {
            let store = JsonConfigStore::open(&path).unwrap();
            store
                .create_config(&RobotConfig::new("default", 4.15, 6.49))
                .unwrap();
        }

        let store = JsonConfigStore::open(&path).unwrap();
        assert_eq!(store.read_configs().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_file_refuses_to_open() {
        let path = unique_store_path("corrupt");
        std::fs::write(&path, "not json at all").unwrap();

        let err = JsonConfigStore::open(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
