mod billing;
mod error;
mod lifecycle;
mod matching;

pub use billing::{
    BillingPeriod, CancelActor, admin_penalty_applies, parent_penalty_applies,
};
pub use error::EngineError;
pub use lifecycle::{
    AdminAlert, Cancellation, Channel, Intent, Transition, TutorContact, assign, cancel,
    create_booking, finalize, hard_confirm, mark_notified, meets_booking_lead_time, reassign,
    tutor_accept, tutor_decline,
};
pub use matching::{is_available, is_eligible, select_candidates};
