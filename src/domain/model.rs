use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A pretrained model artifact the application depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Stable identifier (e.g. "yamnet").
    pub id: String,
    /// File name inside the models directory.
    pub file_name: String,
    /// Download mirrors, tried in order.
    pub mirrors: Vec<String>,
    /// SHA-256 checksum, when published.
    pub sha256: Option<String>,
}

impl ModelArtifact {
    /// The pretrained audio-event model.
    pub fn yamnet() -> Self {
        Self {
            id: "yamnet".to_string(),
            file_name: "yamnet.tflite".to_string(),
            mirrors: vec![
                "https://storage.googleapis.com/download.tensorflow.org/models/tflite/yamnet/yamnet.tflite".to_string(),
                "https://github.com/tensorflow/models/raw/master/research/audioset/yamnet/yamnet.tflite".to_string(),
                "https://tfhub.dev/google/lite-model/yamnet/classification/tflite/1?lite-format=tflite".to_string(),
            ],
            sha256: None,
        }
    }
}

/// Installation state of a model artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// Present and non-empty.
    Installed { path: PathBuf, size_bytes: u64 },
    /// Present but empty: every mirror failed and a placeholder was written
    /// so later stages see a path instead of hard-failing.
    Placeholder { path: PathBuf },
    /// Not present at all.
    Missing,
}

impl ArtifactStatus {
    /// Whether the artifact can actually be used for inference.
    pub fn is_usable(&self) -> bool {
        matches!(self, ArtifactStatus::Installed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yamnet_artifact_has_mirrors() {
        let artifact = ModelArtifact::yamnet();
        assert_eq!(artifact.file_name, "yamnet.tflite");
        assert!(artifact.mirrors.len() >= 2);
        assert!(artifact.mirrors.iter().all(|m| m.starts_with("https://")));
    }

    #[test]
    fn placeholder_is_not_usable() {
        let status = ArtifactStatus::Placeholder {
            path: PathBuf::from("yamnet.tflite"),
        };
        assert!(!status.is_usable());
        assert!(ArtifactStatus::Installed {
            path: PathBuf::from("yamnet.tflite"),
            size_bytes: 1,
        }
        .is_usable());
    }
}
