//! Input bounds enforced at the public entry points.

/// Maximum candidates returned by a tutor search.
pub const MAX_CANDIDATES: usize = 5;

/// Maximum tutors a roster will hold.
pub const MAX_TUTORS: usize = 100_000;

/// Maximum unavailability windows per tutor.
pub const MAX_WINDOWS_PER_TUTOR: usize = 1_000;

/// Maximum length for names (child, tutor, school, town).
pub const MAX_NAME_LEN: usize = 256;

/// Maximum length for a booking subject.
pub const MAX_SUBJECT_LEN: usize = 256;

/// Maximum length for a window reason.
pub const MAX_REASON_LEN: usize = 512;

/// Longest bookable session.
pub const MAX_DURATION_MINUTES: i64 = 12 * 60;

/// Longest extra-time allowance.
pub const MAX_EXTRA_TIME_MINUTES: i64 = 4 * 60;

/// Bookings must be placed at least this far ahead of the exam.
/// Enforced by callers before driving an assignment, not inside the
/// transition functions themselves.
pub const MIN_BOOKING_LEAD_HOURS: i64 = 24;
