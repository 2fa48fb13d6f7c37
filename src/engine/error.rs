use ulid::Ulid;

use crate::model::BookingStatus;

#[derive(Debug)]
pub enum EngineError {
    /// Malformed input. Never retried internally.
    Validation(&'static str),
    /// The attempted transition is not permitted from the current state.
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },
    /// The tutor does not pass the eligibility filter for this booking.
    IneligibleTutor(Ulid),
    NotFound(Ulid),
    AlreadyExists(Ulid),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "validation failed: {msg}"),
            EngineError::InvalidTransition { from, action } => {
                write!(f, "cannot {action} a booking in state {}", from.as_str())
            }
            EngineError::IneligibleTutor(id) => {
                write!(f, "tutor {id} is not eligible for this booking")
            }
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
        }
    }
}

impl std::error::Error for EngineError {}
