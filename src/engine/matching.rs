use chrono::{NaiveDate, NaiveTime};
use ulid::Ulid;

use crate::model::*;

// ── Matching Algorithm ────────────────────────────────────────────

/// Is the tutor free for `duration_minutes` starting at `start_time` on
/// `exam_date`?
///
/// Only windows belonging to the tutor and covering `exam_date` are
/// considered. A whole-day or malformed window blocks outright; a timed
/// window blocks iff it strictly overlaps the requested slot.
pub fn is_available(
    tutor_id: Ulid,
    exam_date: NaiveDate,
    start_time: NaiveTime,
    duration_minutes: i64,
    windows: &[UnavailabilityWindow],
) -> bool {
    let slot = TimeSlot::from_start(exam_date, start_time, duration_minutes);
    !windows
        .iter()
        .filter(|w| w.tutor_id == tutor_id)
        .any(|w| w.blocks(exam_date, &slot))
}

/// Can this tutor take this booking? The single filter behind both
/// candidate search and assignment guards: approval, role compatibility,
/// language capability, and time availability.
pub fn is_eligible(booking: &Booking, tutor: &Tutor, windows: &[UnavailabilityWindow]) -> bool {
    if !tutor.approved {
        return false;
    }
    if !tutor.role.satisfies(booking.required_role) {
        return false;
    }
    if let Some(language) = Language::required_for_subject(&booking.subject)
        && !tutor.speaks(language)
    {
        return false;
    }
    is_available(
        tutor.id,
        booking.exam_date,
        booking.start_time,
        booking.total_minutes(),
        windows,
    )
}

/// Filter `tutors` down to those who can take `booking`, preserving the
/// input order (stable filter, no re-ranking), truncated to `max_results`.
///
/// An empty result is the expected "no suitable tutor" outcome, never an
/// error.
pub fn select_candidates(
    booking: &Booking,
    tutors: &[Tutor],
    windows: &[UnavailabilityWindow],
    max_results: usize,
) -> Vec<Tutor> {
    tutors
        .iter()
        .filter(|t| is_eligible(booking, t, windows))
        .take(max_results)
        .cloned()
        .collect()
}
