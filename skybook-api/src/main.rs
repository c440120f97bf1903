use skybook_api::{app, metrics::Metrics, seed, state::{AppState, AuthConfig}, worker};
use skybook_booking::BookingManager;
use skybook_catalog::{FareHistory, FlightRegistry, SeatInventory};
use skybook_core::ports::{AvailabilityCache, EventSink};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skybook_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = skybook_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Skybook API on port {}", config.server.port);

    // Domain state.
    let flights = Arc::new(FlightRegistry::new());
    let seats = Arc::new(SeatInventory::new());
    let fares = Arc::new(FareHistory::new());
    let engine = Arc::new(BookingManager::new(flights.clone(), seats.clone()));
    let metrics = Arc::new(Metrics::new());

    if config.seed.enabled {
        seed::generate_sample_flights(&flights, &seats, config.seed.flights);
    }

    // Optional Redis availability mirror.
    let redis = match &config.redis.url {
        Some(url) => {
            let client = skybook_store::RedisClient::new(url)
                .await
                .expect("Failed to connect to Redis");
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("Redis not configured; availability mirror and rate limiting disabled");
            None
        }
    };

    // Optional Postgres booking archive.
    let db = match &config.database.url {
        Some(url) => {
            let client = skybook_store::DbClient::new(url)
                .await
                .expect("Failed to connect to Postgres");
            client.ensure_schema().await.expect("Failed to ensure schema");
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("Postgres not configured; booking archive disabled");
            None
        }
    };

    // Seed the availability mirror so searches hit a warm cache.
    if let Some(redis) = &redis {
        for flight in flights.list() {
            if let Ok(count) = seats.available_count(flight.id) {
                let _ = redis.set(flight.id, count).await;
            }
        }
    }

    // Background workers: event pump and hold-expiry sweeper.
    let sinks: Vec<Arc<dyn EventSink>> = match &db {
        Some(db) => vec![db.clone() as Arc<dyn EventSink>],
        None => Vec::new(),
    };
    let cache = redis
        .clone()
        .map(|redis| redis as Arc<dyn AvailabilityCache>);
    tokio::spawn(worker::start_event_pump(engine.subscribe(), sinks, cache));
    tokio::spawn(worker::start_hold_expiry_worker(
        engine.clone(),
        metrics.clone(),
        config.business_rules.seat_hold_seconds,
        config.business_rules.hold_sweep_interval_seconds,
    ));

    let app_state = AppState {
        flights,
        seats,
        fares,
        engine,
        db,
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        business_rules: config.business_rules.clone(),
        metrics,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
