//! Collaborator contracts the orchestrator depends on.
//!
//! Concrete wire formats (Google, Microsoft, SMTP, model APIs) live behind
//! these traits in other crates; the core only needs the shapes below. Every
//! method fails with a [`ProviderError`](super::ProviderError) carrying the
//! retryable/non-retryable classification the retry policy consumes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Participant, ReplyDecision};
use crate::slots::{AvailabilityWindow, CandidateSlot, TimeInterval};

use super::ProviderError;

/// Metadata attached to a created calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Event title.
    pub title: String,
    /// Event description body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Email of the organizer whose calendar hosts the event.
    pub organizer: String,
}

/// A raw participant reply as observed by the email collaborator.
///
/// Carries the collaborator's stable `reply_id`; the response tracker uses it
/// to deduplicate repeated observations of the same underlying reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyObservation {
    /// Stable identifier of the underlying reply message.
    pub reply_id: String,
    /// Email of the replying participant.
    pub participant: String,
    /// Start of the slot the reply refers to.
    pub slot_start: DateTime<Utc>,
    /// The collaborator's classification of the reply.
    pub decision: ReplyDecision,
    /// When the reply was received.
    pub received_at: DateTime<Utc>,
}

/// The reasoning model's pick for the next tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChoice {
    /// Name of the chosen tool; must appear in the offered schemas.
    pub tool_name: String,
    /// Optional free-text note, e.g. notification phrasing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Read-only access to a participant's calendar availability.
#[async_trait]
pub trait AvailabilityProvider: Send + Sync {
    /// Fetch the participant's busy intervals within `range`.
    async fn fetch_availability(
        &self,
        participant: &Participant,
        range: TimeInterval,
    ) -> Result<AvailabilityWindow, ProviderError>;
}

/// Event creation on the organizer's calendar.
#[async_trait]
pub trait EventProvider: Send + Sync {
    /// Create the event and return the collaborator's event id.
    async fn create_event(
        &self,
        slot: TimeInterval,
        attendees: &[Participant],
        metadata: &EventMetadata,
    ) -> Result<String, ProviderError>;
}

/// Outbound proposal and confirmation messages.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Send the proposed slots to the participants and return a message id.
    ///
    /// `session_ref` identifies the session so replies can be correlated;
    /// `note` is optional phrasing chosen by the planning strategy.
    async fn send_proposal(
        &self,
        participants: &[Participant],
        slots: &[CandidateSlot],
        session_ref: &str,
        note: Option<&str>,
    ) -> Result<String, ProviderError>;
}

/// Observation of participant replies.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Return replies for the session observed since `since`.
    ///
    /// May return the same underlying reply more than once across polls; the
    /// response tracker deduplicates by `reply_id`.
    async fn poll_replies(
        &self,
        session_ref: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ReplyObservation>, ProviderError>;
}

/// Optional reasoning model backing the planning step engine.
///
/// The snapshot is a serialized session view and `tool_schemas` are the
/// registry's declared definitions; the provider picks one of them. The
/// planner validates the pick against the state machine's whitelist, so a
/// misbehaving model can never force an out-of-order tool.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Propose the next tool to invoke for the given session snapshot.
    async fn propose_next_tool(
        &self,
        snapshot: Value,
        tool_schemas: &[Value],
    ) -> Result<ToolChoice, ProviderError>;
}
