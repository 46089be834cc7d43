use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::domain::{ArtifactStatus, ModelArtifact, SenseError};
use crate::ports::HttpFetcher;

/// Fetches and verifies pretrained model artifacts in the models directory.
///
/// Download failure is never fatal: when every mirror fails, an empty
/// placeholder file is written so later stages see a present path and can
/// degrade to fallback classification instead of erroring on a missing file.
pub struct ModelFetcher {
    fetcher: Arc<dyn HttpFetcher>,
    models_dir: PathBuf,
}

impl ModelFetcher {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, models_dir: PathBuf) -> Self {
        Self {
            fetcher,
            models_dir,
        }
    }

    /// Path where an artifact lives.
    pub fn artifact_path(&self, artifact: &ModelArtifact) -> PathBuf {
        self.models_dir.join(&artifact.file_name)
    }

    /// Current installation state of an artifact.
    pub fn status(&self, artifact: &ModelArtifact) -> ArtifactStatus {
        let path = self.artifact_path(artifact);
        match fs::metadata(&path) {
            Ok(meta) if meta.len() > 0 => ArtifactStatus::Installed {
                path,
                size_bytes: meta.len(),
            },
            Ok(_) => ArtifactStatus::Placeholder { path },
            Err(_) => ArtifactStatus::Missing,
        }
    }

    /// Make sure an artifact is present.
    ///
    /// An existing file is never re-downloaded, placeholder included; delete
    /// the file to force a retry. Mirrors are tried in order; a checksum
    /// mismatch discards that download and moves on to the next mirror.
    pub async fn ensure(&self, artifact: &ModelArtifact) -> Result<ArtifactStatus, SenseError> {
        let current = self.status(artifact);
        if !matches!(current, ArtifactStatus::Missing) {
            info!(
                artifact = %artifact.id,
                status = ?current,
                "Model artifact already present, skipping download"
            );
            return Ok(current);
        }

        fs::create_dir_all(&self.models_dir)?;
        let path = self.artifact_path(artifact);

        for url in &artifact.mirrors {
            info!(artifact = %artifact.id, url = %url, "Trying model download");

            match self.fetcher.download_file(url, &path, None).await {
                Ok(()) => {
                    if let Some(expected) = &artifact.sha256 {
                        let actual = sha256_of(&path)?;
                        if &actual != expected {
                            warn!(
                                artifact = %artifact.id,
                                expected = %expected,
                                actual = %actual,
                                "Checksum mismatch, discarding download"
                            );
                            let _ = fs::remove_file(&path);
                            continue;
                        }
                    }

                    let size = fs::metadata(&path)?.len();
                    info!(
                        artifact = %artifact.id,
                        size_mb = size / (1024 * 1024),
                        "Model artifact installed"
                    );
                    return Ok(ArtifactStatus::Installed {
                        path,
                        size_bytes: size,
                    });
                }
                Err(e) => {
                    warn!(artifact = %artifact.id, url = %url, error = %e, "Mirror failed");
                }
            }
        }

        // All mirrors failed; leave a placeholder so re-runs and later
        // stages see a present path.
        error!(
            artifact = %artifact.id,
            "All mirrors failed, writing placeholder"
        );
        fs::write(&path, b"")?;
        Ok(ArtifactStatus::Placeholder { path })
    }
}

/// SHA-256 of a file, streamed.
pub fn sha256_of(path: &Path) -> Result<String, SenseError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| SenseError::Io(e.to_string()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
