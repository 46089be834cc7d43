use std::path::PathBuf;

use crate::domain::{AppConfig, SenseError};

/// Configuration store port for persisting and loading app configuration.
pub trait ConfigStore: Send + Sync {
    /// Load configuration from persistent storage.
    /// Creates default config if none exists.
    fn load(&self) -> Result<AppConfig, SenseError>;

    /// Save configuration to persistent storage.
    fn save(&self, config: &AppConfig) -> Result<(), SenseError>;

    /// Path to the configuration file.
    fn config_path(&self) -> PathBuf;

    /// The application home directory.
    fn home_dir(&self) -> PathBuf;

    /// Directory for log files.
    fn logs_dir(&self) -> PathBuf;

    /// Directory for runtime data.
    fn data_dir(&self) -> PathBuf;

    /// Directory for scratch files.
    fn temp_dir(&self) -> PathBuf;

    /// Directory for downloaded model artifacts.
    fn models_dir(&self) -> PathBuf;
}
