use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::EngineError;
use crate::limits::MAX_REASON_LEN;

/// Half-open interval `[start, end)` on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSlot {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start < end, "TimeSlot start must be before end");
        Self { start, end }
    }

    /// Slot beginning at `time` on `date`, running for `minutes`.
    /// Slots crossing midnight spill into the following date.
    pub fn from_start(date: NaiveDate, time: NaiveTime, minutes: i64) -> Self {
        let start = date.and_time(time);
        Self::new(start, start + Duration::minutes(minutes))
    }

    /// Slot between two times of day on the same date.
    pub fn on_date(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self::new(date.and_time(start_time), date.and_time(end_time))
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Strict overlap: a shared boundary is not a conflict.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// What a tutor can be booked as. Exactly one value per tutor, but a value
/// may denote several concrete roles (`Both`, `AllOfTheAbove`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Reader,
    Scribe,
    Invigilator,
    Prompter,
    /// Reader & Scribe.
    Both,
    AllOfTheAbove,
}

impl Role {
    /// Parse a stored label. Any label containing "both" collapses to
    /// `Both` regardless of decoration ("Both (Reader & Scribe)").
    pub fn parse(label: &str) -> Option<Role> {
        let normalized = label.trim().to_lowercase();
        if normalized.contains("both") {
            return Some(Role::Both);
        }
        match normalized.as_str() {
            "reader" => Some(Role::Reader),
            "scribe" => Some(Role::Scribe),
            "invigilator" => Some(Role::Invigilator),
            "prompter" => Some(Role::Prompter),
            "all of the above" | "alloftheabove" => Some(Role::AllOfTheAbove),
            _ => None,
        }
    }

    /// One-directional compatibility: does a tutor declaring `self` satisfy
    /// a booking requiring `required`? `AllOfTheAbove` satisfies anything;
    /// `Both` satisfies only `Reader` and `Scribe`.
    pub fn satisfies(self, required: Role) -> bool {
        if self == required {
            return true;
        }
        if self == Role::AllOfTheAbove {
            return true;
        }
        self == Role::Both && matches!(required, Role::Reader | Role::Scribe)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Reader => "Reader",
            Role::Scribe => "Scribe",
            Role::Invigilator => "Invigilator",
            Role::Prompter => "Prompter",
            Role::Both => "Both",
            Role::AllOfTheAbove => "All of the Above",
        }
    }
}

/// Additional language a booking may require beyond the default English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    Afrikaans,
    Isizulu,
    Setswana,
    Isixhosa,
    French,
}

impl Language {
    /// Closed subject → language table. Unrecognized subjects (including
    /// the default English) need no extra language capability.
    pub fn required_for_subject(subject: &str) -> Option<Language> {
        match subject.trim().to_lowercase().as_str() {
            "afrikaans" => Some(Language::Afrikaans),
            "isizulu" | "zulu" => Some(Language::Isizulu),
            "setswana" => Some(Language::Setswana),
            "isixhosa" | "xhosa" => Some(Language::Isixhosa),
            "french" => Some(Language::French),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutor {
    pub id: Ulid,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: String,
    pub town: String,
    /// Only approved tutors are eligible for matching.
    pub approved: bool,
    pub role: Role,
    pub languages: BTreeSet<Language>,
    pub has_transport: bool,
}

impl Tutor {
    pub fn speaks(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// A tutor's declared non-availability. Dates are an inclusive range; the
/// optional times narrow it to a daily window, otherwise the whole day is out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailabilityWindow {
    pub id: Ulid,
    pub tutor_id: Ulid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
}

impl UnavailabilityWindow {
    /// Well-formedness check applied when a window is stored. The matching
    /// path never relies on it — a malformed window that slipped past still
    /// fails closed in [`UnavailabilityWindow::blocks`].
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start_date > self.end_date {
            return Err(EngineError::Validation("window end date before start date"));
        }
        match (self.start_time, self.end_time) {
            (None, None) => {}
            (Some(start), Some(end)) if start < end => {}
            (Some(_), Some(_)) => {
                return Err(EngineError::Validation(
                    "window start time must be before end time",
                ));
            }
            _ => {
                return Err(EngineError::Validation(
                    "window needs both times or neither",
                ));
            }
        }
        if let Some(reason) = &self.reason
            && reason.len() > MAX_REASON_LEN
        {
            return Err(EngineError::Validation("window reason too long"));
        }
        Ok(())
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Does this window rule out the given slot on `date`?
    ///
    /// A window with no times blocks its whole date range. A window whose
    /// times cannot form a valid slot (one bound missing, or start ≥ end)
    /// also blocks — malformed windows fail closed so a tutor is never
    /// double-booked on bad data.
    pub fn blocks(&self, date: NaiveDate, slot: &TimeSlot) -> bool {
        if !self.covers(date) {
            return false;
        }
        match (self.start_time, self.end_time) {
            (None, None) => true,
            (Some(start), Some(end)) if start < end => {
                TimeSlot::on_date(date, start, end).overlaps(slot)
            }
            _ => true,
        }
    }
}

/// Booking lifecycle states. `Confirmed`, `Cancelled`, and `TutorDeclined`
/// end the assignment workflow; see the lifecycle module for the exceptions
/// (cancellation of a confirmed booking, re-assignment after a decline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Assigned,
    AwaitingTutorConfirmation,
    TutorConfirmed,
    Confirmed,
    TutorDeclined,
    Cancelled,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Confirmed | BookingStatus::Cancelled | BookingStatus::TutorDeclined
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Assigned => "Assigned",
            BookingStatus::AwaitingTutorConfirmation => "Awaiting Tutor Confirmation",
            BookingStatus::TutorConfirmed => "Tutor Confirmed",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::TutorDeclined => "Tutor Declined",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

/// What a parent (or an admin on their behalf) submits to open a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub parent_id: Ulid,
    pub child_name: String,
    pub grade: String,
    pub school: String,
    pub subject: String,
    pub required_role: Role,
    pub exam_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub extra_time_minutes: i64,
}

/// A request for exam support at a fixed date/time. Never physically
/// deleted — cancellation is a terminal status, not a row removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub parent_id: Ulid,
    pub child_name: String,
    pub grade: String,
    pub school: String,
    pub subject: String,
    pub required_role: Role,
    pub exam_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub extra_time_minutes: i64,
    pub tutor_id: Option<Ulid>,
    pub status: BookingStatus,
    pub cancelled: bool,
    pub cancelled_at: Option<NaiveDateTime>,
    pub confirmed_at: Option<NaiveDateTime>,
    pub assigned_at: Option<NaiveDateTime>,
}

impl Booking {
    pub fn exam_start(&self) -> NaiveDateTime {
        self.exam_date.and_time(self.start_time)
    }

    /// The full slot a tutor must cover, extra time included.
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::from_start(
            self.exam_date,
            self.start_time,
            self.duration_minutes + self.extra_time_minutes,
        )
    }

    pub fn total_minutes(&self) -> i64 {
        self.duration_minutes + self.extra_time_minutes
    }
}
