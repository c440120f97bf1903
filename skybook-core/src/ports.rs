use async_trait::async_trait;
use skybook_shared::events::BookingEvent;
use uuid::Uuid;

/// Sink for booking engine events (archive, audit, downstream notification).
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn handle(
        &self,
        event: &BookingEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Read-through mirror of per-flight availability counts, kept warm for the
/// search path. Misses are acceptable; the seat map remains authoritative.
#[async_trait]
pub trait AvailabilityCache: Send + Sync {
    async fn get(
        &self,
        flight_id: Uuid,
    ) -> Result<Option<i32>, Box<dyn std::error::Error + Send + Sync>>;

    async fn set(
        &self,
        flight_id: Uuid,
        count: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Adjust the cached count by `delta` if the key is already seeded.
    async fn adjust(
        &self,
        flight_id: Uuid,
        delta: i32,
    ) -> Result<Option<i64>, Box<dyn std::error::Error + Send + Sync>>;

    async fn clear(
        &self,
        flight_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
