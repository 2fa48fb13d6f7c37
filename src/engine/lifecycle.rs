use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::billing::CancelActor;
use super::error::EngineError;
use super::matching::is_eligible;

// ── Intents ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Email,
    Sms,
}

/// Contact details surfaced to the parent once a booking is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorContact {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl TutorContact {
    pub fn from_tutor(tutor: &Tutor) -> Self {
        Self {
            name: tutor.full_name(),
            phone: tutor.phone.clone(),
            email: tutor.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminAlert {
    TutorAccepted,
    TutorDeclined,
    ConfirmationOverdue,
}

/// A side effect the caller should perform. Transition functions only
/// describe I/O; the notify adapter executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    NotifyParent {
        booking_id: Ulid,
        channel: Channel,
        tutor: Option<TutorContact>,
    },
    NotifyTutor {
        booking_id: Ulid,
        tutor_id: Ulid,
        channel: Channel,
    },
    NotifyAdmin {
        booking_id: Ulid,
        alert: AdminAlert,
    },
}

impl Intent {
    pub fn booking_id(&self) -> Ulid {
        match self {
            Intent::NotifyParent { booking_id, .. }
            | Intent::NotifyTutor { booking_id, .. }
            | Intent::NotifyAdmin { booking_id, .. } => *booking_id,
        }
    }
}

/// New booking state plus the side effects it calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub booking: Booking,
    pub intents: Vec<Intent>,
}

/// Cancellation outcome. The penalty verdict rides along so the caller can
/// surface it; billing itself happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    pub booking: Booking,
    pub intents: Vec<Intent>,
    pub penalty_applies: bool,
}

// ── Booking creation ──────────────────────────────────────────────

fn validate_request(request: &BookingRequest, now: NaiveDateTime) -> Result<(), EngineError> {
    if request.child_name.is_empty() || request.child_name.len() > MAX_NAME_LEN {
        return Err(EngineError::Validation("child name empty or too long"));
    }
    if request.school.len() > MAX_NAME_LEN {
        return Err(EngineError::Validation("school name too long"));
    }
    if request.subject.is_empty() || request.subject.len() > MAX_SUBJECT_LEN {
        return Err(EngineError::Validation("subject empty or too long"));
    }
    if request.duration_minutes <= 0 || request.duration_minutes > MAX_DURATION_MINUTES {
        return Err(EngineError::Validation("duration out of range"));
    }
    if request.extra_time_minutes < 0 || request.extra_time_minutes > MAX_EXTRA_TIME_MINUTES {
        return Err(EngineError::Validation("extra time out of range"));
    }
    if request.exam_date.and_time(request.start_time) <= now {
        return Err(EngineError::Validation("exam must be in the future"));
    }
    Ok(())
}

/// Open a new booking in `Pending`.
pub fn create_booking(request: BookingRequest, now: NaiveDateTime) -> Result<Booking, EngineError> {
    validate_request(&request, now)?;
    Ok(Booking {
        id: Ulid::new(),
        parent_id: request.parent_id,
        child_name: request.child_name,
        grade: request.grade,
        school: request.school,
        subject: request.subject,
        required_role: request.required_role,
        exam_date: request.exam_date,
        start_time: request.start_time,
        duration_minutes: request.duration_minutes,
        extra_time_minutes: request.extra_time_minutes,
        tutor_id: None,
        status: BookingStatus::Pending,
        cancelled: false,
        cancelled_at: None,
        confirmed_at: None,
        assigned_at: None,
    })
}

/// Caller-side gate: bookings should be placed at least
/// `MIN_BOOKING_LEAD_HOURS` ahead. The transition functions do not
/// re-check this — the surface driving them does.
pub fn meets_booking_lead_time(exam_start: NaiveDateTime, now: NaiveDateTime) -> bool {
    exam_start - now >= Duration::hours(MIN_BOOKING_LEAD_HOURS)
}

// ── Transitions ───────────────────────────────────────────────────

fn require_future_exam(booking: &Booking, now: NaiveDateTime) -> Result<(), EngineError> {
    if booking.exam_start() <= now {
        return Err(EngineError::Validation("exam date/time is in the past"));
    }
    Ok(())
}

fn require_eligible(
    booking: &Booking,
    tutor: &Tutor,
    windows: &[UnavailabilityWindow],
) -> Result<(), EngineError> {
    if !is_eligible(booking, tutor, windows) {
        return Err(EngineError::IneligibleTutor(tutor.id));
    }
    Ok(())
}

/// `Pending → Assigned`. The tutor must pass the same filter that produced
/// the candidate list, and the exam must still be in the future.
pub fn assign(
    mut booking: Booking,
    tutor: &Tutor,
    windows: &[UnavailabilityWindow],
    now: NaiveDateTime,
) -> Result<Transition, EngineError> {
    if booking.status != BookingStatus::Pending {
        return Err(EngineError::InvalidTransition {
            from: booking.status,
            action: "assign",
        });
    }
    require_future_exam(&booking, now)?;
    require_eligible(&booking, tutor, windows)?;

    booking.tutor_id = Some(tutor.id);
    booking.status = BookingStatus::Assigned;
    booking.assigned_at = Some(now);
    let intents = vec![Intent::NotifyTutor {
        booking_id: booking.id,
        tutor_id: tutor.id,
        channel: Channel::Email,
    }];
    Ok(Transition { booking, intents })
}

/// `Assigned → AwaitingTutorConfirmation`, once the adapter has actually
/// dispatched the tutor notification. Tutor responses are accepted from
/// either state, so a lost notification cannot wedge the workflow.
pub fn mark_notified(mut booking: Booking) -> Result<Transition, EngineError> {
    if booking.status != BookingStatus::Assigned {
        return Err(EngineError::InvalidTransition {
            from: booking.status,
            action: "mark notified",
        });
    }
    booking.status = BookingStatus::AwaitingTutorConfirmation;
    Ok(Transition {
        booking,
        intents: Vec::new(),
    })
}

/// Tutor accepts. Valid from `Assigned` or `AwaitingTutorConfirmation`.
pub fn tutor_accept(mut booking: Booking) -> Result<Transition, EngineError> {
    match booking.status {
        BookingStatus::Assigned | BookingStatus::AwaitingTutorConfirmation => {}
        from => {
            return Err(EngineError::InvalidTransition {
                from,
                action: "accept",
            });
        }
    }
    booking.status = BookingStatus::TutorConfirmed;
    let intents = vec![Intent::NotifyAdmin {
        booking_id: booking.id,
        alert: AdminAlert::TutorAccepted,
    }];
    Ok(Transition { booking, intents })
}

/// Tutor declines. The booking parks in `TutorDeclined` until an admin
/// re-assigns it.
pub fn tutor_decline(mut booking: Booking) -> Result<Transition, EngineError> {
    match booking.status {
        BookingStatus::Assigned | BookingStatus::AwaitingTutorConfirmation => {}
        from => {
            return Err(EngineError::InvalidTransition {
                from,
                action: "decline",
            });
        }
    }
    booking.status = BookingStatus::TutorDeclined;
    let intents = vec![Intent::NotifyAdmin {
        booking_id: booking.id,
        alert: AdminAlert::TutorDeclined,
    }];
    Ok(Transition { booking, intents })
}

/// `TutorConfirmed → Confirmed` — the admin's hard confirm. The parent
/// notification carries the tutor's contact details.
pub fn finalize(
    mut booking: Booking,
    tutor: &Tutor,
    now: NaiveDateTime,
) -> Result<Transition, EngineError> {
    if booking.status != BookingStatus::TutorConfirmed {
        return Err(EngineError::InvalidTransition {
            from: booking.status,
            action: "finalize",
        });
    }
    if booking.tutor_id != Some(tutor.id) {
        return Err(EngineError::Validation(
            "finalize must reference the assigned tutor",
        ));
    }
    booking.status = BookingStatus::Confirmed;
    booking.confirmed_at = Some(now);
    let intents = vec![Intent::NotifyParent {
        booking_id: booking.id,
        channel: Channel::Email,
        tutor: Some(TutorContact::from_tutor(tutor)),
    }];
    Ok(Transition { booking, intents })
}

/// `Pending → Confirmed` in one admin action, equivalent to assign +
/// accept + finalize collapsed. Both the tutor and the parent are notified.
pub fn hard_confirm(
    mut booking: Booking,
    tutor: &Tutor,
    windows: &[UnavailabilityWindow],
    now: NaiveDateTime,
) -> Result<Transition, EngineError> {
    if booking.status != BookingStatus::Pending {
        return Err(EngineError::InvalidTransition {
            from: booking.status,
            action: "hard-confirm",
        });
    }
    require_future_exam(&booking, now)?;
    require_eligible(&booking, tutor, windows)?;

    booking.tutor_id = Some(tutor.id);
    booking.status = BookingStatus::Confirmed;
    booking.assigned_at = Some(now);
    booking.confirmed_at = Some(now);
    let intents = vec![
        Intent::NotifyTutor {
            booking_id: booking.id,
            tutor_id: tutor.id,
            channel: Channel::Email,
        },
        Intent::NotifyParent {
            booking_id: booking.id,
            channel: Channel::Email,
            tutor: Some(TutorContact::from_tutor(tutor)),
        },
    ];
    Ok(Transition { booking, intents })
}

/// Hand the booking to a different tutor. Valid while `Assigned` or
/// `AwaitingTutorConfirmation`, and from `TutorDeclined` (a decline is
/// resolved by re-entering `Assigned`, not by a self-loop). The new tutor
/// is validated against the existing date/time and `assigned_at` is
/// refreshed.
pub fn reassign(
    mut booking: Booking,
    new_tutor: &Tutor,
    windows: &[UnavailabilityWindow],
    now: NaiveDateTime,
) -> Result<Transition, EngineError> {
    match booking.status {
        BookingStatus::Assigned
        | BookingStatus::AwaitingTutorConfirmation
        | BookingStatus::TutorDeclined => {}
        from => {
            return Err(EngineError::InvalidTransition {
                from,
                action: "reassign",
            });
        }
    }
    if booking.tutor_id == Some(new_tutor.id) {
        return Err(EngineError::Validation("reassign requires a different tutor"));
    }
    require_future_exam(&booking, now)?;
    require_eligible(&booking, new_tutor, windows)?;

    booking.tutor_id = Some(new_tutor.id);
    booking.status = BookingStatus::Assigned;
    booking.assigned_at = Some(now);
    let intents = vec![Intent::NotifyTutor {
        booking_id: booking.id,
        tutor_id: new_tutor.id,
        channel: Channel::Email,
    }];
    Ok(Transition { booking, intents })
}

/// Cancel the booking. Allowed from every state except `Cancelled` itself:
/// a confirmed booking can still be called off (that is exactly where the
/// penalty matters) and a declined one abandoned. The penalty verdict for
/// the acting party is computed here and returned; the caller surfaces it.
pub fn cancel(
    mut booking: Booking,
    actor: CancelActor,
    now: NaiveDateTime,
) -> Result<Cancellation, EngineError> {
    if booking.status == BookingStatus::Cancelled {
        return Err(EngineError::InvalidTransition {
            from: booking.status,
            action: "cancel",
        });
    }
    let penalty_applies = actor.penalty_applies(booking.exam_start(), now);
    let mut intents = Vec::new();
    // A tutor who declined is out of the loop already.
    if booking.status != BookingStatus::TutorDeclined
        && let Some(tutor_id) = booking.tutor_id
    {
        intents.push(Intent::NotifyTutor {
            booking_id: booking.id,
            tutor_id,
            channel: Channel::Email,
        });
    }
    booking.status = BookingStatus::Cancelled;
    booking.cancelled = true;
    booking.cancelled_at = Some(now);
    Ok(Cancellation {
        booking,
        intents,
        penalty_applies,
    })
}
