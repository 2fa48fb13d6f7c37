use dashmap::DashMap;
use ulid::Ulid;

use crate::engine::{EngineError, select_candidates};
use crate::limits::*;
use crate::model::*;
use crate::observability;

/// In-memory side of the persistence collaborator: tutors and their
/// unavailability windows. The engine never reads this directly — callers
/// take snapshots from here and pass them into the pure functions, so a
/// database-backed implementation can swap in without touching the engine.
pub struct Roster {
    tutors: DashMap<Ulid, Tutor>,
    windows: DashMap<Ulid, UnavailabilityWindow>,
    windows_by_tutor: DashMap<Ulid, Vec<Ulid>>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    pub fn new() -> Self {
        Self {
            tutors: DashMap::new(),
            windows: DashMap::new(),
            windows_by_tutor: DashMap::new(),
        }
    }

    // ── Tutors ───────────────────────────────────────────────

    pub fn tutor_count(&self) -> usize {
        self.tutors.len()
    }

    /// Register a tutor. Self-registrations arrive unapproved; approval is a
    /// separate admin step.
    pub fn add_tutor(&self, tutor: Tutor) -> Result<(), EngineError> {
        validate_tutor(&tutor)?;
        if self.tutors.len() >= MAX_TUTORS {
            return Err(EngineError::Validation("roster is full"));
        }
        if self.tutors.contains_key(&tutor.id) {
            return Err(EngineError::AlreadyExists(tutor.id));
        }
        self.tutors.insert(tutor.id, tutor);
        Ok(())
    }

    pub fn get_tutor(&self, id: &Ulid) -> Option<Tutor> {
        self.tutors.get(id).map(|e| e.value().clone())
    }

    /// Replace a tutor's profile (admin edit). The tutor must already exist —
    /// tutors are never deleted, so a missing id is a caller error.
    pub fn update_tutor(&self, tutor: Tutor) -> Result<(), EngineError> {
        validate_tutor(&tutor)?;
        if !self.tutors.contains_key(&tutor.id) {
            return Err(EngineError::NotFound(tutor.id));
        }
        self.tutors.insert(tutor.id, tutor);
        Ok(())
    }

    /// Admin approval or denial.
    pub fn set_approved(&self, id: Ulid, approved: bool) -> Result<(), EngineError> {
        match self.tutors.get_mut(&id) {
            Some(mut entry) => {
                entry.approved = approved;
                Ok(())
            }
            None => Err(EngineError::NotFound(id)),
        }
    }

    /// Snapshot of approved tutors, ordered by id (ulids sort by creation
    /// time, so candidate ordering stays deterministic across calls).
    pub fn approved_tutors(&self) -> Vec<Tutor> {
        let mut tutors: Vec<Tutor> = self
            .tutors
            .iter()
            .filter(|e| e.value().approved)
            .map(|e| e.value().clone())
            .collect();
        tutors.sort_by_key(|t| t.id);
        tutors
    }

    // ── Unavailability windows ───────────────────────────────

    pub fn add_window(&self, window: UnavailabilityWindow) -> Result<(), EngineError> {
        window.validate()?;
        if !self.tutors.contains_key(&window.tutor_id) {
            return Err(EngineError::NotFound(window.tutor_id));
        }
        if self.windows.contains_key(&window.id) {
            return Err(EngineError::AlreadyExists(window.id));
        }
        let mut ids = self.windows_by_tutor.entry(window.tutor_id).or_default();
        if ids.len() >= MAX_WINDOWS_PER_TUTOR {
            return Err(EngineError::Validation("too many windows for tutor"));
        }
        ids.push(window.id);
        drop(ids);
        self.windows.insert(window.id, window);
        Ok(())
    }

    pub fn remove_window(&self, id: &Ulid) -> Result<(), EngineError> {
        let Some((_, window)) = self.windows.remove(id) else {
            return Err(EngineError::NotFound(*id));
        };
        if let Some(mut ids) = self.windows_by_tutor.get_mut(&window.tutor_id) {
            ids.retain(|w| w != id);
        }
        Ok(())
    }

    pub fn windows_for(&self, tutor_id: &Ulid) -> Vec<UnavailabilityWindow> {
        self.windows_by_tutor
            .get(tutor_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.windows.get(id).map(|e| e.value().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn all_windows(&self) -> Vec<UnavailabilityWindow> {
        self.windows.iter().map(|e| e.value().clone()).collect()
    }

    // ── Candidate search ─────────────────────────────────────

    /// Run the eligibility filter for a booking against the current roster
    /// snapshot. Empty means "no suitable tutor", never a failure.
    pub fn candidates(&self, booking: &Booking) -> Vec<Tutor> {
        let tutors = self.approved_tutors();
        let windows = self.all_windows();
        let found = select_candidates(booking, &tutors, &windows, MAX_CANDIDATES);
        metrics::counter!(
            observability::CANDIDATE_SEARCHES_TOTAL,
            "outcome" => if found.is_empty() { "empty" } else { "matched" }
        )
        .increment(1);
        metrics::histogram!(observability::CANDIDATES_RETURNED).record(found.len() as f64);
        found
    }
}

fn validate_tutor(tutor: &Tutor) -> Result<(), EngineError> {
    if tutor.name.is_empty() || tutor.name.len() > MAX_NAME_LEN {
        return Err(EngineError::Validation("tutor name empty or too long"));
    }
    if tutor.surname.is_empty() || tutor.surname.len() > MAX_NAME_LEN {
        return Err(EngineError::Validation("tutor surname empty or too long"));
    }
    if tutor.town.len() > MAX_NAME_LEN {
        return Err(EngineError::Validation("town name too long"));
    }
    Ok(())
}
