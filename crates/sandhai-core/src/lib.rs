pub mod app_config;
pub mod config;
pub mod coordinate;
pub mod listings;
pub mod location;
pub mod repository;

pub use app_config::{AppConfig, Environment, FeedSettings};
pub use config::{
    load_app_config, load_app_config_from_env, load_feed_settings, load_feed_settings_from_env,
};
pub use coordinate::Coordinate;
pub use listings::{
    CategoryAttributes, Listing, ListingDraft, ListingQuery, Place, Seller, ValidationError,
};
pub use location::{LocationSource, UserLocation};
pub use repository::{ListingRepository, RepositoryError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
