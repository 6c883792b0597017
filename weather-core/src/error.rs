use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single weather provider request.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status code.
    #[error("provider reported status {code}: {message}")]
    NotFound { code: String, message: String },

    #[error("weather request failed: {0}")]
    Transport(String),

    #[error("failed to parse weather response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("geolocation denied: {0}")]
    Denied(String),

    #[error("geolocation unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize store contents: {0}")]
    Serialize(#[from] serde_json::Error),
}
