//! Booking assignment engine for exam-support tutoring: candidate matching,
//! the booking lifecycle state machine, and the billing-period / cancellation
//! cutoff rules, plus the in-memory roster and intent plumbing around them.
//!
//! The engine itself is pure — every time-sensitive function takes `now`
//! explicitly and side effects come back as [`engine::Intent`] values for the
//! adapter layer to execute.

pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod roster;
pub mod sweep;
