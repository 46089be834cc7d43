use thiserror::Error;

/// Domain-level errors for SenseBridge.
#[derive(Error, Debug)]
pub enum SenseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Audio device error: {message}")]
    AudioDevice { message: String },

    #[error("Not currently listening")]
    NotListening,

    #[error("Already listening")]
    AlreadyListening,

    #[error("Sound event catalog error: {0}")]
    Catalog(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Speech recognition error: {0}")]
    Speech(String),

    #[error("Wearable link error: {0}")]
    Wearable(String),

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

impl From<std::io::Error> for SenseError {
    fn from(err: std::io::Error) -> Self {
        SenseError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for SenseError {
    fn from(err: toml::de::Error) -> Self {
        SenseError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SenseError {
    fn from(err: toml::ser::Error) -> Self {
        SenseError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SenseError {
    fn from(err: serde_json::Error) -> Self {
        SenseError::Serialization(err.to_string())
    }
}
