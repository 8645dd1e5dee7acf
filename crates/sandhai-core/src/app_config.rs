use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_RADIUS_KM: f64 = 50.0;
pub const DEFAULT_AD_CADENCE: usize = 5;
pub const DEFAULT_CITY: &str = "Chennai";
pub const DEFAULT_AREA: &str = "City Center";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Knobs for location resolution and feed assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    pub radius_km: f64,
    /// A value of 0 disables ad placement.
    pub ad_cadence: usize,
    /// Rows pulled from the store before ranking.
    pub fetch_limit: i64,
    pub sensor_timeout_secs: u64,
    pub default_city: String,
    pub default_area: String,
    pub geocoder_url: String,
    pub ip_locator_url: String,
    pub http_user_agent: String,
    pub http_timeout_secs: u64,
    pub location_path: PathBuf,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            ad_cadence: DEFAULT_AD_CADENCE,
            fetch_limit: 200,
            sensor_timeout_secs: 5,
            default_city: DEFAULT_CITY.to_string(),
            default_area: DEFAULT_AREA.to_string(),
            geocoder_url: "https://nominatim.openstreetmap.org/".to_string(),
            ip_locator_url: "http://ip-api.com/".to_string(),
            http_user_agent: "namma-sandhai/0.1 (local-classifieds)".to_string(),
            http_timeout_secs: 10,
            location_path: PathBuf::from("./.sandhai/location.json"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub feed: FeedSettings,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("feed", &self.feed)
            .finish()
    }
}
