use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::info;
use ulid::Ulid;

use crate::engine::{AdminAlert, Intent};
use crate::model::{Booking, BookingStatus};
use crate::notify::IntentHub;
use crate::observability;

/// Bookings that have sat in `Assigned` or `AwaitingTutorConfirmation` for
/// longer than `grace` since assignment. Pure; the sweep loop below feeds it
/// the clock.
pub fn overdue_confirmations(
    bookings: &[Booking],
    now: NaiveDateTime,
    grace: chrono::Duration,
) -> Vec<Ulid> {
    bookings
        .iter()
        .filter(|b| {
            matches!(
                b.status,
                BookingStatus::Assigned | BookingStatus::AwaitingTutorConfirmation
            )
        })
        .filter(|b| b.assigned_at.is_some_and(|at| now - at > grace))
        .map(|b| b.id)
        .collect()
}

/// Background task that periodically flags bookings whose tutor has gone
/// quiet. `snapshot` hands back the current active bookings; follow-up
/// alerts go out through the hub as `NotifyAdmin` intents.
pub async fn run_follow_up_sweep<F>(
    hub: Arc<IntentHub>,
    snapshot: F,
    every: Duration,
    grace: chrono::Duration,
) where
    F: Fn() -> Vec<Booking> + Send + 'static,
{
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let now = chrono::Local::now().naive_local();
        for booking_id in overdue_confirmations(&snapshot(), now, grace) {
            metrics::counter!(observability::FOLLOW_UPS_EMITTED_TOTAL).increment(1);
            info!(%booking_id, "tutor confirmation overdue");
            hub.send(&Intent::NotifyAdmin {
                booking_id,
                alert: AdminAlert::ConfirmationOverdue,
            });
        }
    }
}
