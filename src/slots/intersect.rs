//! Intersection of participant availability into candidate slots.

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::window::{AvailabilityWindow, TimeInterval};
use super::{CandidateSlot, SlotError};

/// Compute the candidate slots common to all given participants.
///
/// The union of every participant's busy intervals is subtracted from
/// `bounds`; the remaining free gaps are sliced into consecutive
/// duration-sized candidates whose starts are aligned to
/// `granularity_minutes` boundaries (wall-clock aligned, e.g. :00/:15/:30/:45
/// for a 15 minute granularity). Candidates therefore never overlap each
/// other and never touch any participant's busy time.
///
/// Candidates are returned unscored, in start order; callers score and rank
/// them separately. Fails with [`SlotError::InsufficientAvailability`] when
/// no candidate fits - relaxing constraints and retrying is the session's
/// policy decision, not this function's.
pub fn intersect_availability(
    windows: &[AvailabilityWindow],
    duration_minutes: u32,
    bounds: TimeInterval,
    granularity_minutes: u32,
) -> Result<Vec<CandidateSlot>, SlotError> {
    if duration_minutes == 0 || granularity_minutes == 0 {
        return Err(SlotError::InvalidParameters);
    }

    let duration = Duration::minutes(i64::from(duration_minutes));
    let participants: Vec<String> = windows.iter().map(|w| w.participant.clone()).collect();

    // Union of all busy time, clipped to bounds and merged.
    let mut busy: Vec<TimeInterval> = windows
        .iter()
        .flat_map(|w| w.busy().iter())
        .filter_map(|b| b.intersection(&bounds))
        .collect();
    busy.sort_by_key(|i| i.start);
    let mut merged: Vec<TimeInterval> = Vec::with_capacity(busy.len());
    for interval in busy {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }

    // Free gaps between merged busy intervals.
    let mut free: Vec<TimeInterval> = Vec::new();
    let mut cursor = bounds.start;
    for interval in &merged {
        if cursor < interval.start {
            free.push(TimeInterval::new(cursor, interval.start));
        }
        cursor = cursor.max(interval.end);
    }
    if cursor < bounds.end {
        free.push(TimeInterval::new(cursor, bounds.end));
    }

    // Slice each gap into aligned, non-overlapping candidates.
    let mut candidates = Vec::new();
    for gap in free {
        let mut start = align_up(gap.start, granularity_minutes);
        while start + duration <= gap.end {
            candidates.push(CandidateSlot {
                start,
                end: start + duration,
                score: 0.0,
                feasible_for: participants.clone(),
            });
            start = align_up(start + duration, granularity_minutes);
        }
    }

    if candidates.is_empty() {
        return Err(SlotError::InsufficientAvailability { duration_minutes });
    }
    Ok(candidates)
}

/// Round `t` up to the next multiple of `granularity_minutes` since midnight.
fn align_up(t: DateTime<Utc>, granularity_minutes: u32) -> DateTime<Utc> {
    let step = i64::from(granularity_minutes) * 60;
    let ts = t.timestamp();
    let aligned = ts.div_euclid(step) * step;
    let aligned = if aligned < ts { aligned + step } else { aligned };
    // Aligned timestamps stay within chrono's range for any real calendar
    // input; fall back to the unaligned instant rather than panic.
    Utc.timestamp_opt(aligned, 0).single().unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn bounds() -> TimeInterval {
        TimeInterval::new(at(9, 0), at(18, 0))
    }

    /// Three participants, 30 minute meeting, bounds [09:00, 18:00):
    /// A busy 09:00-12:00, B busy 13:00-15:00, C free all day.
    fn three_participants() -> Vec<AvailabilityWindow> {
        vec![
            AvailabilityWindow::new(
                "a@example.com",
                vec![TimeInterval::new(at(9, 0), at(12, 0))],
            ),
            AvailabilityWindow::new(
                "b@example.com",
                vec![TimeInterval::new(at(13, 0), at(15, 0))],
            ),
            AvailabilityWindow::free_all_day("c@example.com"),
        ]
    }

    #[test]
    fn finds_gaps_common_to_all_participants() {
        let candidates = intersect_availability(&three_participants(), 30, bounds(), 15).unwrap();

        let starts: Vec<DateTime<Utc>> = candidates.iter().map(|c| c.start).collect();
        assert!(starts.contains(&at(12, 0)));
        assert!(starts.contains(&at(15, 0)));
        // Nothing may start inside either busy block.
        assert!(!starts.contains(&at(11, 30)));
        assert!(!starts.contains(&at(13, 0)));
        assert!(!starts.contains(&at(14, 30)));
    }

    #[test]
    fn candidates_avoid_every_busy_interval() {
        let windows = three_participants();
        let candidates = intersect_availability(&windows, 30, bounds(), 15).unwrap();
        for candidate in &candidates {
            for window in &windows {
                assert!(
                    window.is_free_during(&candidate.interval()),
                    "candidate {:?} overlaps busy time of {}",
                    candidate.start,
                    window.participant
                );
            }
        }
    }

    #[test]
    fn candidates_are_mutually_non_overlapping_and_sized() {
        let candidates = intersect_availability(&three_participants(), 30, bounds(), 15).unwrap();
        for pair in candidates.windows(2) {
            assert!(!pair[0].interval().overlaps(&pair[1].interval()));
        }
        for candidate in &candidates {
            assert_eq!((candidate.end - candidate.start).num_minutes(), 30);
        }
    }

    #[test]
    fn starts_are_granularity_aligned() {
        let windows = vec![AvailabilityWindow::new(
            "a@example.com",
            // Busy until 09:07, so the first aligned start is 09:15.
            vec![TimeInterval::new(at(9, 0), at(9, 7))],
        )];
        let candidates = intersect_availability(&windows, 30, bounds(), 15).unwrap();
        assert_eq!(candidates[0].start, at(9, 15));
        for candidate in &candidates {
            assert_eq!(candidate.start.timestamp() % (15 * 60), 0);
        }
    }

    #[test]
    fn insufficient_availability_when_fully_booked() {
        let windows = vec![
            AvailabilityWindow::new(
                "a@example.com",
                vec![TimeInterval::new(at(9, 0), at(13, 0))],
            ),
            AvailabilityWindow::new(
                "b@example.com",
                vec![TimeInterval::new(at(12, 45), at(18, 0))],
            ),
        ];
        assert_eq!(
            intersect_availability(&windows, 30, bounds(), 15),
            Err(SlotError::InsufficientAvailability {
                duration_minutes: 30
            })
        );
    }

    #[test]
    fn gap_shorter_than_duration_yields_nothing() {
        let windows = vec![AvailabilityWindow::new(
            "a@example.com",
            vec![
                TimeInterval::new(at(9, 0), at(12, 0)),
                TimeInterval::new(at(12, 20), at(18, 0)),
            ],
        )];
        assert!(intersect_availability(&windows, 30, bounds(), 15).is_err());
    }

    #[test]
    fn empty_windows_tile_the_whole_bounds() {
        let windows = vec![AvailabilityWindow::free_all_day("a@example.com")];
        let candidates = intersect_availability(&windows, 60, bounds(), 15).unwrap();
        assert_eq!(candidates.len(), 9);
        assert_eq!(candidates[0].start, at(9, 0));
        assert_eq!(candidates.last().unwrap().end, at(18, 0));
    }

    #[test]
    fn zero_parameters_are_rejected() {
        let windows = vec![AvailabilityWindow::free_all_day("a@example.com")];
        assert_eq!(
            intersect_availability(&windows, 0, bounds(), 15),
            Err(SlotError::InvalidParameters)
        );
        assert_eq!(
            intersect_availability(&windows, 30, bounds(), 0),
            Err(SlotError::InvalidParameters)
        );
    }
}
