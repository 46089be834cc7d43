use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{AppConfig, SenseError};
use crate::ports::ConfigStore;

/// Environment variable overriding the application home directory.
pub const HOME_ENV: &str = "SENSEBRIDGE_HOME";

/// TOML-based configuration store rooted at the application home directory.
///
/// The home resolves to `$SENSEBRIDGE_HOME` when set, otherwise to the
/// OS-specific configuration directory:
/// - macOS: ~/Library/Application Support/SenseBridge/
/// - Windows: %APPDATA%\SenseBridge\
/// - Linux: ~/.config/SenseBridge/
pub struct TomlConfigStore {
    home: PathBuf,
}

impl TomlConfigStore {
    pub fn new() -> Result<Self, SenseError> {
        let home = Self::resolve_home()?;
        fs::create_dir_all(&home)?;

        info!(home = ?home, "ConfigStore initialized");

        Ok(Self { home })
    }

    /// Create a store rooted at an explicit directory.
    pub fn at(home: PathBuf) -> Result<Self, SenseError> {
        fs::create_dir_all(&home)?;
        Ok(Self { home })
    }

    fn resolve_home() -> Result<PathBuf, SenseError> {
        if let Ok(value) = std::env::var(HOME_ENV) {
            if !value.is_empty() {
                return Ok(PathBuf::from(value));
            }
        }

        #[cfg(target_os = "macos")]
        {
            dirs::data_dir()
                .map(|p| p.join("SenseBridge"))
                .ok_or_else(|| {
                    SenseError::Config("Could not find application data directory".to_string())
                })
        }

        #[cfg(not(target_os = "macos"))]
        {
            dirs::config_dir()
                .map(|p| p.join("SenseBridge"))
                .ok_or_else(|| {
                    SenseError::Config("Could not find application data directory".to_string())
                })
        }
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<AppConfig, SenseError> {
        let config_path = self.config_path();

        if config_path.exists() {
            debug!(path = ?config_path, "Loading configuration");
            let content = fs::read_to_string(&config_path)?;
            let config: AppConfig = toml::from_str(&content)?;
            info!(path = ?config_path, "Configuration loaded");
            Ok(config)
        } else {
            info!(path = ?config_path, "Configuration file not found, creating default");
            let config = AppConfig::new();
            self.save(&config)?;
            Ok(config)
        }
    }

    fn save(&self, config: &AppConfig) -> Result<(), SenseError> {
        let config_path = self.config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&config_path, content)?;

        info!(path = ?config_path, "Configuration saved");
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    fn home_dir(&self) -> PathBuf {
        self.home.clone()
    }

    fn logs_dir(&self) -> PathBuf {
        self.home.join("logs")
    }

    fn data_dir(&self) -> PathBuf {
        self.home.join("data")
    }

    fn temp_dir(&self) -> PathBuf {
        self.home.join("temp")
    }

    fn models_dir(&self) -> PathBuf {
        self.home.join("models").join("yamnet_model")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directory_layout_hangs_off_the_home() {
        let dir = tempdir().unwrap();
        let store = TomlConfigStore::at(dir.path().to_path_buf()).unwrap();

        assert!(store.config_path().ends_with("config.toml"));
        assert!(store.logs_dir().ends_with("logs"));
        assert!(store.models_dir().ends_with("models/yamnet_model"));
    }

    #[test]
    fn load_creates_defaults_then_roundtrips() {
        let dir = tempdir().unwrap();
        let store = TomlConfigStore::at(dir.path().to_path_buf()).unwrap();

        // First load writes the default file.
        let config = store.load().unwrap();
        assert!(store.config_path().exists());
        assert_eq!(config.logging.level, "info");

        // Edits survive a save/load cycle.
        let mut config = config;
        config.logging.level = "debug".to_string();
        config.speech.language = "fr".to_string();
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.logging.level, "debug");
        assert_eq!(loaded.speech.language, "fr");
    }
}
