use sandhai_core::RepositoryError;
use thiserror::Error;

/// Why the device sensor produced no coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("location sensor unavailable: {0}")]
    Unavailable(String),

    #[error("location sensor timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Reverse geocoding failed; always recovered with the default place names.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder response for {context} had no address")]
    MissingAddress { context: String },
}

/// An HTTP-backed sensor or geocoder could not be constructed.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Durable location storage could not be read or written.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("location storage I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stored location is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error(transparent)]
    Sensor(#[from] SensorError),

    /// A newer transition (manual entry, reset, another detection) landed first.
    #[error("location update superseded by a newer one")]
    Superseded,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("could not load listings: {0}")]
    Repository(#[from] RepositoryError),

    /// A newer build started while this one was waiting on the store.
    #[error("feed build superseded by a newer request")]
    Superseded,
}
