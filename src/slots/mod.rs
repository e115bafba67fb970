//! Time slot model - pure interval math, no I/O.
//!
//! This module owns the representation of availability windows, the
//! intersection of busy calendars into common free time, and deterministic
//! slot scoring. Everything here is a pure function of its inputs so it can
//! be tested without any collaborator.

pub mod intersect;
pub mod score;
pub mod window;

pub use intersect::intersect_availability;
pub use score::{rank_slots, score_slot, SlotPreferences};
pub use window::{AvailabilityWindow, TimeInterval};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A scored, duration-matching interval proposed as a meeting time.
///
/// Invariant: `end - start` equals the requested meeting duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSlot {
    /// Proposed start, UTC.
    pub start: DateTime<Utc>,
    /// Proposed end, UTC.
    pub end: DateTime<Utc>,
    /// Higher is better. Assigned by [`score_slot`], 0.0 until scored.
    pub score: f64,
    /// Emails of the participants for whom this slot is free.
    pub feasible_for: Vec<String>,
}

impl CandidateSlot {
    /// The candidate as a plain interval.
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.start, self.end)
    }

    /// Stable identifier for the feasible participant set.
    ///
    /// Used as the final tie-break when score and start time are equal.
    pub fn participant_key(&self) -> String {
        let mut emails: Vec<&str> = self.feasible_for.iter().map(String::as_str).collect();
        emails.sort_unstable();
        emails.join(",")
    }
}

/// Failure modes of the slot model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    /// No candidate of the required duration exists within bounds for all
    /// participants. A business outcome, not a system error: the session
    /// decides whether to relax constraints and retry.
    #[error("no {duration_minutes} minute slot fits all participants within the requested window")]
    InsufficientAvailability {
        /// The duration that could not be placed.
        duration_minutes: u32,
    },

    /// Granularity or duration was zero.
    #[error("duration and granularity must be positive minute counts")]
    InvalidParameters,
}
