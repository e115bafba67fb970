//! Domain types shared across the scheduling pipeline.
//!
//! These are the inputs and outputs of a scheduling session: who wants to
//! meet, for how long, inside which window, and what the participants replied.
//! Everything downstream (slot analysis, tool payloads, audit records) is
//! derived from the types in this module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A person involved in a meeting, identified by email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Email address, the canonical identity used everywhere downstream.
    pub email: String,
    /// Optional display name for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Participant {
    /// Create a participant from an email address.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Create a participant with a display name.
    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

/// Meeting priority, used by slot scoring to bias earlier or later slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingPriority {
    /// Flexible; later slots are acceptable.
    Low,
    /// Balance convenience and timing.
    #[default]
    Medium,
    /// Prefer earlier slots.
    High,
    /// Earliest workable slot wins.
    Urgent,
}

/// A request to schedule one meeting.
///
/// Immutable once a session starts; the session only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRequest {
    /// Meeting title.
    pub title: String,
    /// Optional free-text intent shown in notifications and event metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The requester. Their calendar credentials create the event.
    pub organizer: Participant,
    /// Additional participants, ordered, unique by email.
    pub participants: Vec<Participant>,
    /// Required meeting length in minutes.
    pub duration_minutes: u32,
    /// Earliest acceptable start, UTC.
    pub window_start: DateTime<Utc>,
    /// Latest acceptable end, UTC.
    pub window_end: DateTime<Utc>,
    /// Preferred timezone label for rendering, e.g. "America/New_York".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Scheduling priority.
    #[serde(default)]
    pub priority: MeetingPriority,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Bounds accepted for `duration_minutes`, matching what calendar providers
/// will actually book.
pub const MIN_DURATION_MINUTES: u32 = 15;
/// Upper bound for `duration_minutes`.
pub const MAX_DURATION_MINUTES: u32 = 480;

impl MeetingRequest {
    /// All attendees with the organizer first.
    pub fn all_participants(&self) -> Vec<&Participant> {
        let mut all = Vec::with_capacity(self.participants.len() + 1);
        all.push(&self.organizer);
        all.extend(self.participants.iter());
        all
    }

    /// All attendee email addresses with the organizer first.
    pub fn all_emails(&self) -> Vec<String> {
        self.all_participants()
            .into_iter()
            .map(|p| p.email.clone())
            .collect()
    }

    /// Check the request is internally consistent before a session starts.
    pub fn validate(&self) -> Result<(), RequestValidationError> {
        if self.title.trim().is_empty() {
            return Err(RequestValidationError::EmptyTitle);
        }
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&self.duration_minutes) {
            return Err(RequestValidationError::InvalidDuration {
                minutes: self.duration_minutes,
            });
        }
        if self.window_end <= self.window_start {
            return Err(RequestValidationError::InvertedWindow);
        }
        let window_minutes = (self.window_end - self.window_start).num_minutes();
        if window_minutes < i64::from(self.duration_minutes) {
            return Err(RequestValidationError::WindowTooNarrow {
                window_minutes,
                duration_minutes: self.duration_minutes,
            });
        }
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(self.organizer.email.as_str());
        for p in &self.participants {
            if !seen.insert(p.email.as_str()) {
                return Err(RequestValidationError::DuplicateParticipant {
                    email: p.email.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Why a [`MeetingRequest`] was rejected at intake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestValidationError {
    /// The title was empty or whitespace.
    #[error("meeting title must not be empty")]
    EmptyTitle,

    /// Duration outside the bookable range.
    #[error("duration of {minutes} minutes is outside {MIN_DURATION_MINUTES}..={MAX_DURATION_MINUTES}")]
    InvalidDuration {
        /// The rejected duration.
        minutes: u32,
    },

    /// `window_end` is not after `window_start`.
    #[error("window end must be after window start")]
    InvertedWindow,

    /// The acceptable window cannot fit the requested duration.
    #[error("window of {window_minutes} minutes cannot fit a {duration_minutes} minute meeting")]
    WindowTooNarrow {
        /// Minutes between window start and end.
        window_minutes: i64,
        /// Requested meeting length.
        duration_minutes: u32,
    },

    /// The same email appears twice in the attendee list.
    #[error("duplicate participant: {email}")]
    DuplicateParticipant {
        /// The duplicated email address.
        email: String,
    },
}

/// A participant's decision on a proposed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyDecision {
    /// The participant accepted the slot.
    Accept,
    /// The participant declined the slot.
    Decline,
    /// No reply yet, or the reply could not be classified.
    NoResponse,
}

const ACCEPT_PHRASES: &[&str] = &["confirm", "accept", "agree", "sounds good", "works for me"];
const DECLINE_PHRASES: &[&str] = &["decline", "reject", "won't work"];
const DECLINE_WORDS: &[&str] = &["no", "can't", "cannot"];

impl ReplyDecision {
    /// Classify a free-text reply body by keyword.
    ///
    /// Provided for reply collaborators that only surface raw text. Single
    /// words ("yes"/"no"/"can't"/"cannot") are matched on word boundaries so
    /// that "know" or "yesterday" do not misclassify.
    pub fn from_text(body: &str) -> Self {
        let lower = body.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();

        if DECLINE_WORDS.iter().any(|w| words.contains(w))
            || DECLINE_PHRASES.iter().any(|p| lower.contains(p))
        {
            return ReplyDecision::Decline;
        }
        if words.contains(&"yes") || ACCEPT_PHRASES.iter().any(|p| lower.contains(p)) {
            return ReplyDecision::Accept;
        }
        ReplyDecision::NoResponse
    }
}

/// A deduplicated participant reply for one proposed slot.
///
/// Produced by the response tracker, consumed by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEvent {
    /// Email of the participant who replied.
    pub participant: String,
    /// Start of the slot the reply refers to.
    pub slot_start: DateTime<Utc>,
    /// The classified decision.
    pub decision: ReplyDecision,
    /// Stable identifier supplied by the reply collaborator, used for dedup.
    pub reply_id: String,
    /// When the reply was observed.
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> MeetingRequest {
        MeetingRequest {
            title: "Quarterly sync".to_string(),
            description: None,
            organizer: Participant::named("ana@example.com", "Ana"),
            participants: vec![
                Participant::new("ben@example.com"),
                Participant::new("cho@example.com"),
            ],
            duration_minutes: 30,
            window_start: Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
            window_end: Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap(),
            timezone: "UTC".to_string(),
            priority: MeetingPriority::Medium,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn organizer_listed_first() {
        let req = request();
        let emails = req.all_emails();
        assert_eq!(emails[0], "ana@example.com");
        assert_eq!(emails.len(), 3);
    }

    #[test]
    fn duplicate_participant_rejected() {
        let mut req = request();
        req.participants.push(Participant::new("ben@example.com"));
        assert_eq!(
            req.validate(),
            Err(RequestValidationError::DuplicateParticipant {
                email: "ben@example.com".to_string()
            })
        );
    }

    #[test]
    fn organizer_duplicated_as_participant_rejected() {
        let mut req = request();
        req.participants.push(Participant::new("ana@example.com"));
        assert!(matches!(
            req.validate(),
            Err(RequestValidationError::DuplicateParticipant { .. })
        ));
    }

    #[test]
    fn window_must_fit_duration() {
        let mut req = request();
        req.window_end = req.window_start + chrono::Duration::minutes(20);
        assert!(matches!(
            req.validate(),
            Err(RequestValidationError::WindowTooNarrow { .. })
        ));
    }

    #[test]
    fn duration_bounds_enforced() {
        let mut req = request();
        req.duration_minutes = 5;
        assert!(matches!(
            req.validate(),
            Err(RequestValidationError::InvalidDuration { minutes: 5 })
        ));
    }

    #[test]
    fn reply_classification() {
        assert_eq!(
            ReplyDecision::from_text("Yes, works for me!"),
            ReplyDecision::Accept
        );
        assert_eq!(
            ReplyDecision::from_text("Sorry, I can't make that time"),
            ReplyDecision::Decline
        );
        // Bare "can't"/"cannot" are declines even without a trailing verb.
        assert_eq!(
            ReplyDecision::from_text("Sorry, I can't"),
            ReplyDecision::Decline
        );
        assert_eq!(
            ReplyDecision::from_text("Cannot on Monday, unfortunately"),
            ReplyDecision::Decline
        );
        assert_eq!(
            ReplyDecision::from_text("Let me get back to you"),
            ReplyDecision::NoResponse
        );
        // Word-boundary matching: "know" must not read as "no".
        assert_eq!(
            ReplyDecision::from_text("I'll let you know"),
            ReplyDecision::NoResponse
        );
    }
}
