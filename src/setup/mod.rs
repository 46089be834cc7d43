//! Workspace bootstrap: the Rust rendition of the install scripts.
//!
//! Creates the directory layout under the application home, and fetches the
//! pretrained audio-event model with download failure treated as non-fatal.
//! Every operation is idempotent; re-running setup never destroys existing
//! content.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::adapters::ModelFetcher;
use crate::domain::{ArtifactStatus, ModelArtifact, SenseError};
use crate::ports::ConfigStore;

/// Directory layout under the application home.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub home: PathBuf,
    pub logs: PathBuf,
    pub temp: PathBuf,
    pub data: PathBuf,
    pub models: PathBuf,
}

impl WorkspacePaths {
    pub fn from_store(store: &dyn ConfigStore) -> Self {
        Self {
            home: store.home_dir(),
            logs: store.logs_dir(),
            temp: store.temp_dir(),
            data: store.data_dir(),
            models: store.models_dir(),
        }
    }

    fn directories(&self) -> [&PathBuf; 5] {
        [&self.home, &self.logs, &self.temp, &self.data, &self.models]
    }
}

/// Create the workspace directories that do not exist yet.
pub fn prepare_workspace(paths: &WorkspacePaths) -> Result<(), SenseError> {
    for dir in paths.directories() {
        if dir.is_dir() {
            debug!(dir = %dir.display(), "Directory already present");
        } else {
            fs::create_dir_all(dir)?;
            info!(dir = %dir.display(), "Created directory");
        }
    }
    Ok(())
}

/// Fetch the pretrained audio-event model if absent.
///
/// Total download failure produces a placeholder, not an error; the
/// classifier degrades to its fallback path.
pub async fn ensure_model(fetcher: &ModelFetcher) -> Result<ArtifactStatus, SenseError> {
    fetcher.ensure(&ModelArtifact::yamnet()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn paths(home: &std::path::Path) -> WorkspacePaths {
        WorkspacePaths {
            home: home.to_path_buf(),
            logs: home.join("logs"),
            temp: home.join("temp"),
            data: home.join("data"),
            models: home.join("models").join("yamnet_model"),
        }
    }

    #[test]
    fn creates_the_full_layout() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());

        prepare_workspace(&paths).unwrap();

        assert!(paths.logs.is_dir());
        assert!(paths.temp.is_dir());
        assert!(paths.data.is_dir());
        assert!(paths.models.is_dir());
    }

    #[test]
    fn reruns_preserve_existing_content() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());

        prepare_workspace(&paths).unwrap();
        let keepsake = paths.data.join("events.db");
        fs::write(&keepsake, b"do not touch").unwrap();

        prepare_workspace(&paths).unwrap();

        assert_eq!(fs::read(&keepsake).unwrap(), b"do not touch");
    }
}
