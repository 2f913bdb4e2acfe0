use std::path::PathBuf;

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

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub deals_path: PathBuf,
    pub geocoding_api_key: Option<String>,
    pub geocode_timeout_secs: u64,
    pub geocode_user_agent: String,
    pub geocode_cache_ttl_secs: u64,
    pub geocode_cache_max_entries: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("deals_path", &self.deals_path)
            .field("database_url", &"[redacted]")
            .field(
                "geocoding_api_key",
                &self.geocoding_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("geocode_timeout_secs", &self.geocode_timeout_secs)
            .field("geocode_user_agent", &self.geocode_user_agent)
            .field("geocode_cache_ttl_secs", &self.geocode_cache_ttl_secs)
            .field(
                "geocode_cache_max_entries",
                &self.geocode_cache_max_entries,
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
