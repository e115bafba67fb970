//! Deterministic slot scoring and ranking.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::model::MeetingPriority;

use super::window::AvailabilityWindow;
use super::CandidateSlot;

/// Scheduling preferences that feed [`score_slot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotPreferences {
    /// First working hour (0-23), slots inside working hours score higher.
    pub work_start_hour: u32,
    /// Last working hour (0-23, exclusive).
    pub work_end_hour: u32,
    /// Desired clearance before and after adjacent calendar events, minutes.
    pub buffer_minutes: u32,
    /// Weight of the earliness term: points subtracted per hour between the
    /// window start and the slot start.
    pub earliness_weight: f64,
    /// Meeting priority; high priorities bias toward earlier slots.
    pub priority: MeetingPriority,
}

impl Default for SlotPreferences {
    fn default() -> Self {
        Self {
            work_start_hour: 9,
            work_end_hour: 17,
            buffer_minutes: 15,
            earliness_weight: 1.0,
            priority: MeetingPriority::Medium,
        }
    }
}

/// Score a candidate slot. Pure: identical inputs always produce the
/// identical score.
///
/// The score combines, from a base of 100:
/// - proximity to preferred hours: mid-morning and early afternoon get the
///   largest bonus, the rest of the working day a smaller one;
/// - day of week: Tuesday through Thursday preferred, Monday and Friday
///   tolerated;
/// - priority: high/urgent pull the score toward earlier weekdays and
///   mornings, low tolerates later slots;
/// - buffer: the smallest gap between the slot and any participant's
///   adjacent busy interval, scaled against `buffer_minutes`;
/// - earliness: points per hour after `horizon_start`, so earlier candidates
///   win all else being equal.
pub fn score_slot(
    slot: &CandidateSlot,
    windows: &[AvailabilityWindow],
    prefs: &SlotPreferences,
    horizon_start: DateTime<Utc>,
) -> f64 {
    let mut score = 100.0;

    let hour = slot.start.hour();
    if (10..=11).contains(&hour) || (14..=15).contains(&hour) {
        score += 20.0;
    } else if (prefs.work_start_hour..=12).contains(&hour)
        || (13..prefs.work_end_hour).contains(&hour)
    {
        score += 10.0;
    }

    // 0 = Monday .. 6 = Sunday.
    let day = slot.start.weekday().num_days_from_monday();
    if (1..=3).contains(&day) {
        score += 15.0;
    } else if day == 0 || day == 4 {
        score += 5.0;
    }

    match prefs.priority {
        MeetingPriority::High | MeetingPriority::Urgent => {
            score += f64::from(7 - day) * 5.0;
            if hour <= 12 {
                score += 10.0;
            }
        }
        MeetingPriority::Low => {
            score += f64::from(day) * 2.0;
            if hour >= 14 {
                score += 5.0;
            }
        }
        MeetingPriority::Medium => {}
    }

    if prefs.buffer_minutes > 0 {
        let gap = smallest_adjacent_gap(slot, windows).min(i64::from(prefs.buffer_minutes));
        score += gap as f64 / f64::from(prefs.buffer_minutes) * 10.0;
    }

    let hours_in = (slot.start - horizon_start).num_minutes() as f64 / 60.0;
    score -= hours_in * prefs.earliness_weight;

    score
}

/// Minutes between the slot and the nearest busy interval across all
/// participants. Windows without busy time contribute nothing (unbounded
/// clearance).
fn smallest_adjacent_gap(slot: &CandidateSlot, windows: &[AvailabilityWindow]) -> i64 {
    let mut smallest = i64::MAX;
    for window in windows {
        for busy in window.busy() {
            if busy.end <= slot.start {
                smallest = smallest.min((slot.start - busy.end).num_minutes());
            } else if busy.start >= slot.end {
                smallest = smallest.min((busy.start - slot.end).num_minutes());
            }
            // Overlapping busy time never happens for candidates produced by
            // intersection; such a slot would not exist.
        }
    }
    smallest
}

/// Sort candidates best-first: score descending, then earlier start, then
/// lexicographically smaller participant-set key. Total and deterministic.
pub fn rank_slots(slots: &mut [CandidateSlot]) {
    slots.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.start.cmp(&b.start))
            .then_with(|| a.participant_key().cmp(&b.participant_key()))
    });
}
