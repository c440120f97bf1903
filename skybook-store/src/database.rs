use async_trait::async_trait;
use skybook_core::ports::EventSink;
use skybook_shared::events::{BookingChanged, BookingEvent};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    /// Create the archive table if it does not exist yet. The archive is a
    /// write-behind copy of booking snapshots for audit and restarts; the
    /// in-process engine stays authoritative while running.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        info!("Ensuring booking archive schema...");
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id UUID PRIMARY KEY,
                user_id TEXT NOT NULL,
                flight_id UUID NOT NULL,
                seat_no TEXT NOT NULL,
                status TEXT NOT NULL,
                pnr TEXT UNIQUE,
                final_price_cents INTEGER NOT NULL,
                currency TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_booking(&self, change: &BookingChanged) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, user_id, flight_id, seat_no, status, pnr,
                 final_price_cents, currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                pnr = EXCLUDED.pnr,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(change.booking_id)
        .bind(&change.user_id)
        .bind(change.flight_id)
        .bind(&change.seat_no)
        .bind(&change.status)
        .bind(&change.pnr)
        .bind(change.final_price_cents)
        .bind(&change.currency)
        .bind(change.created_at)
        .bind(change.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl EventSink for DbClient {
    async fn handle(
        &self,
        event: &BookingEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match event {
            BookingEvent::BookingChanged(change) => {
                self.upsert_booking(change).await?;
                Ok(())
            }
            // Seat and fare traffic is served from memory; only booking
            // snapshots are archived.
            _ => Ok(()),
        }
    }
}
