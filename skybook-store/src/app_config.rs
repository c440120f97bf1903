use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Postgres is optional: without a URL the booking archive is disabled and
/// the in-process engine runs alone.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

/// Redis is optional: without a URL the availability mirror and rate
/// limiting are disabled.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// How long an unpaid seat hold survives before the sweeper releases it.
    #[serde(default = "default_seat_hold_seconds")]
    pub seat_hold_seconds: u64,
    #[serde(default = "default_sweep_interval_seconds")]
    pub hold_sweep_interval_seconds: u64,
    #[serde(default = "default_fare_history_limit")]
    pub fare_history_limit: usize,
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: i64,
}

fn default_seat_hold_seconds() -> u64 {
    900
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

fn default_fare_history_limit() -> usize {
    50
}

fn default_rate_limit_per_minute() -> i64 {
    100
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            seat_hold_seconds: default_seat_hold_seconds(),
            hold_sweep_interval_seconds: default_sweep_interval_seconds(),
            fare_history_limit: default_fare_history_limit(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    #[serde(default = "default_seed_enabled")]
    pub enabled: bool,
    #[serde(default = "default_seed_flights")]
    pub flights: usize,
}

fn default_seed_enabled() -> bool {
    true
}

fn default_seed_flights() -> usize {
    25
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: default_seed_enabled(),
            flights: default_seed_flights(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start from the checked-in defaults.
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional.
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            // Finally the environment: SKYBOOK__SERVER__PORT=9000 etc.
            .add_source(config::Environment::with_prefix("SKYBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
