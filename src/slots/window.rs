//! Availability windows and the interval primitive they are built from.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Create an interval. `end <= start` yields an empty interval.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Length of the interval; zero when empty.
    pub fn duration(&self) -> Duration {
        if self.end <= self.start {
            Duration::zero()
        } else {
            self.end - self.start
        }
    }

    /// True when the interval contains no time.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True when the two half-open intervals share any instant.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies entirely within this interval.
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The overlap with `other`, if any.
    pub fn intersection(&self, other: &TimeInterval) -> Option<TimeInterval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(TimeInterval::new(start, end))
        } else {
            None
        }
    }
}

/// One participant's busy intervals inside a queried range.
///
/// Invariant: stored intervals are sorted by start and non-overlapping.
/// The constructor merges whatever the calendar collaborator returned, so
/// the invariant holds regardless of input ordering or overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityWindow {
    /// Email of the participant this window belongs to.
    pub participant: String,
    busy: Vec<TimeInterval>,
}

impl AvailabilityWindow {
    /// Build a window from raw busy intervals, merging overlaps and dropping
    /// empty entries.
    pub fn new(participant: impl Into<String>, mut intervals: Vec<TimeInterval>) -> Self {
        intervals.retain(|i| !i.is_empty());
        intervals.sort_by_key(|i| i.start);

        let mut busy: Vec<TimeInterval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match busy.last_mut() {
                // Merge overlapping and back-to-back intervals: busy time is
                // contiguous either way.
                Some(last) if interval.start <= last.end => {
                    last.end = last.end.max(interval.end);
                }
                _ => busy.push(interval),
            }
        }

        Self {
            participant: participant.into(),
            busy,
        }
    }

    /// A window with no busy time at all.
    pub fn free_all_day(participant: impl Into<String>) -> Self {
        Self::new(participant, Vec::new())
    }

    /// The merged busy intervals, sorted by start.
    pub fn busy(&self) -> &[TimeInterval] {
        &self.busy
    }

    /// True when the participant has no busy time overlapping `interval`.
    pub fn is_free_during(&self, interval: &TimeInterval) -> bool {
        self.busy.iter().all(|b| !b.overlaps(interval))
    }

    /// Total busy time clipped to `bounds`. Used by relaxation policies to
    /// find the least-available participant.
    pub fn busy_minutes_within(&self, bounds: &TimeInterval) -> i64 {
        self.busy
            .iter()
            .filter_map(|b| b.intersection(bounds))
            .map(|i| i.duration().num_minutes())
            .sum()
    }
}

// Deserialization funnels through `new` so merged-and-sorted stays true even
// for windows that arrive over a tool payload.
impl<'de> Deserialize<'de> for AvailabilityWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            participant: String,
            busy: Vec<TimeInterval>,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(AvailabilityWindow::new(raw.participant, raw.busy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn overlapping_input_intervals_are_merged() {
        let window = AvailabilityWindow::new(
            "a@example.com",
            vec![
                TimeInterval::new(at(13, 0), at(14, 0)),
                TimeInterval::new(at(9, 0), at(11, 0)),
                TimeInterval::new(at(10, 30), at(12, 0)),
            ],
        );
        assert_eq!(
            window.busy(),
            &[
                TimeInterval::new(at(9, 0), at(12, 0)),
                TimeInterval::new(at(13, 0), at(14, 0)),
            ]
        );
    }

    #[test]
    fn adjacent_intervals_are_merged() {
        let window = AvailabilityWindow::new(
            "a@example.com",
            vec![
                TimeInterval::new(at(9, 0), at(10, 0)),
                TimeInterval::new(at(10, 0), at(11, 0)),
            ],
        );
        assert_eq!(window.busy().len(), 1);
        assert_eq!(window.busy()[0].end, at(11, 0));
    }

    #[test]
    fn empty_and_inverted_intervals_are_dropped() {
        let window = AvailabilityWindow::new(
            "a@example.com",
            vec![
                TimeInterval::new(at(10, 0), at(10, 0)),
                TimeInterval::new(at(12, 0), at(11, 0)),
            ],
        );
        assert!(window.busy().is_empty());
    }

    #[test]
    fn free_during_respects_half_open_ends() {
        let window =
            AvailabilityWindow::new("a@example.com", vec![TimeInterval::new(at(9, 0), at(12, 0))]);
        // A meeting starting exactly at the busy end does not overlap.
        assert!(window.is_free_during(&TimeInterval::new(at(12, 0), at(12, 30))));
        assert!(!window.is_free_during(&TimeInterval::new(at(11, 45), at(12, 15))));
    }

    #[test]
    fn busy_minutes_clipped_to_bounds() {
        let window =
            AvailabilityWindow::new("a@example.com", vec![TimeInterval::new(at(8, 0), at(11, 0))]);
        let bounds = TimeInterval::new(at(9, 0), at(18, 0));
        assert_eq!(window.busy_minutes_within(&bounds), 120);
    }

    #[test]
    fn deserialization_restores_invariant() {
        let json = r#"{
            "participant": "a@example.com",
            "busy": [
                {"start": "2025-03-10T10:00:00Z", "end": "2025-03-10T12:00:00Z"},
                {"start": "2025-03-10T09:00:00Z", "end": "2025-03-10T10:30:00Z"}
            ]
        }"#;
        let window: AvailabilityWindow = serde_json::from_str(json).unwrap();
        assert_eq!(window.busy().len(), 1);
    }
}
