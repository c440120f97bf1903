use chrono::Utc;
use skybook_booking::BookingManager;
use skybook_core::ports::{AvailabilityCache, EventSink};
use skybook_shared::events::BookingEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::metrics::Metrics;

/// Drain the engine's event channel into the configured sinks: booking
/// snapshots go to the archive, seat movements keep the availability mirror
/// warm. Mirror/archive failures are logged and skipped; the in-process
/// engine stays authoritative.
pub async fn start_event_pump(
    mut rx: broadcast::Receiver<BookingEvent>,
    sinks: Vec<Arc<dyn EventSink>>,
    cache: Option<Arc<dyn AvailabilityCache>>,
) {
    info!("event pump started");

    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event pump lagged behind the engine");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if let Some(cache) = &cache {
            let adjustment = match &event {
                BookingEvent::SeatHeld(e) => Some((e.flight_id, -1)),
                BookingEvent::SeatReleased(e) => Some((e.flight_id, 1)),
                _ => None,
            };
            if let Some((flight_id, delta)) = adjustment {
                match cache.adjust(flight_id, delta).await {
                    Ok(Some(count)) => {
                        info!(%flight_id, count, "availability mirror adjusted")
                    }
                    // Cache miss: the next search re-seeds from the seat map.
                    Ok(None) => {}
                    Err(err) => error!(%flight_id, %err, "availability mirror update failed"),
                }
            }
        }

        for sink in &sinks {
            if let Err(err) = sink.handle(&event).await {
                error!(%err, "event sink failed");
            }
        }
    }

    info!("event pump stopped: engine channel closed");
}

/// Periodically release unpaid seat holds that outlived the configured TTL.
pub async fn start_hold_expiry_worker(
    engine: Arc<BookingManager>,
    metrics: Arc<Metrics>,
    hold_seconds: u64,
    sweep_interval_seconds: u64,
) {
    info!(hold_seconds, "hold expiry worker started");
    let mut ticker =
        tokio::time::interval(std::time::Duration::from_secs(sweep_interval_seconds.max(1)));

    loop {
        ticker.tick().await;
        let expired =
            engine.expire_stale_holds(chrono::Duration::seconds(hold_seconds as i64), Utc::now());
        if expired > 0 {
            info!(expired, "released stale seat holds");
            metrics.holds_expired.inc_by(expired as u64);
        }
    }
}
