use skybook_booking::BookingManager;
use skybook_catalog::{FareHistory, FlightRegistry, SeatInventory};
use skybook_store::app_config::BusinessRules;
use skybook_store::{DbClient, RedisClient};
use std::sync::Arc;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub flights: Arc<FlightRegistry>,
    pub seats: Arc<SeatInventory>,
    pub fares: Arc<FareHistory>,
    pub engine: Arc<BookingManager>,
    /// Write-behind booking archive; None when Postgres is unconfigured.
    pub db: Option<Arc<DbClient>>,
    /// Availability mirror and rate-limit counters; None when Redis is
    /// unconfigured.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
    pub metrics: Arc<Metrics>,
}
