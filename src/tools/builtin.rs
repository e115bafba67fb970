//! Built-in handlers bridging the collaborator traits into the registry.
//!
//! Each handler owns a typed input/output pair and one provider trait
//! object. `analyze_slots` is the exception: it is pure and wraps the slot
//! model directly.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::model::Participant;
use crate::provider::{
    AvailabilityProvider, EventMetadata, EventProvider, NotificationProvider, ReplyObservation,
    ReplyProvider,
};
use crate::slots::{
    intersect_availability, rank_slots, score_slot, AvailabilityWindow, CandidateSlot, SlotError,
    SlotPreferences, TimeInterval,
};

use super::definition::ToolDefinition;
use super::error::ToolError;
use super::registry::{ToolHandler, ToolRegistry};
use super::SchedulingTool;

fn parse_input<T: DeserializeOwned>(tool: SchedulingTool, input: Value) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|e| ToolError::invalid_input(tool.name(), e.to_string()))
}

fn to_output<T: Serialize>(tool: SchedulingTool, output: &T) -> Result<Value, ToolError> {
    serde_json::to_value(output)
        .map_err(|e| ToolError::invalid_input(tool.name(), format!("output serialization: {e}")))
}

/// Input for [`FetchAvailabilityHandler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchAvailabilityInput {
    /// Whose calendar to read.
    pub participant: Participant,
    /// The range to query.
    pub range: TimeInterval,
}

/// Output of [`FetchAvailabilityHandler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchAvailabilityOutput {
    /// The participant's merged busy intervals.
    pub window: AvailabilityWindow,
}

/// `fetch_availability`: one participant's busy calendar via the
/// availability collaborator.
pub struct FetchAvailabilityHandler {
    provider: Arc<dyn AvailabilityProvider>,
}

impl FetchAvailabilityHandler {
    /// Wrap an availability provider.
    pub fn new(provider: Arc<dyn AvailabilityProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for FetchAvailabilityHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            SchedulingTool::FetchAvailability.name(),
            "Fetch one participant's busy calendar intervals within a time range",
            json!({
                "type": "object",
                "properties": {
                    "participant": { "type": "object" },
                    "range": { "type": "object" }
                },
                "required": ["participant", "range"]
            }),
        )
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let tool = SchedulingTool::FetchAvailability;
        let input: FetchAvailabilityInput = parse_input(tool, input)?;
        let window = self
            .provider
            .fetch_availability(&input.participant, input.range)
            .await
            .map_err(|e| ToolError::failed(tool.name(), e))?;
        to_output(tool, &FetchAvailabilityOutput { window })
    }
}

/// Input for [`AnalyzeSlotsHandler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeSlotsInput {
    /// Windows of every participant still being considered.
    pub windows: Vec<AvailabilityWindow>,
    /// Required meeting length in minutes.
    pub duration_minutes: u32,
    /// Acceptable scheduling bounds.
    pub bounds: TimeInterval,
    /// Candidate alignment in minutes.
    pub granularity_minutes: u32,
    /// How many top candidates to return.
    pub max_suggestions: usize,
    /// Scoring preferences.
    pub preferences: SlotPreferences,
    /// Slot starts already declined in earlier proposal rounds.
    #[serde(default)]
    pub excluded_starts: Vec<DateTime<Utc>>,
}

/// Output of [`AnalyzeSlotsHandler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeSlotsOutput {
    /// The top candidates, scored, best first.
    pub candidates: Vec<CandidateSlot>,
    /// How many candidates existed before truncation.
    pub total_found: usize,
}

/// `analyze_slots`: pure intersection and scoring over already-fetched
/// windows.
#[derive(Default)]
pub struct AnalyzeSlotsHandler;

#[async_trait]
impl ToolHandler for AnalyzeSlotsHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            SchedulingTool::AnalyzeSlots.name(),
            "Intersect participant availability and recommend scored meeting slots",
            json!({
                "type": "object",
                "properties": {
                    "windows": { "type": "array" },
                    "duration_minutes": { "type": "integer" },
                    "bounds": { "type": "object" },
                    "granularity_minutes": { "type": "integer" },
                    "max_suggestions": { "type": "integer" },
                    "preferences": { "type": "object" },
                    "excluded_starts": { "type": "array" }
                },
                "required": ["windows", "duration_minutes", "bounds", "granularity_minutes", "max_suggestions", "preferences"]
            }),
        )
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let tool = SchedulingTool::AnalyzeSlots;
        let input: AnalyzeSlotsInput = parse_input(tool, input)?;

        let mut candidates = match intersect_availability(
            &input.windows,
            input.duration_minutes,
            input.bounds,
            input.granularity_minutes,
        ) {
            Ok(candidates) => candidates,
            Err(SlotError::InsufficientAvailability { duration_minutes }) => {
                return Err(ToolError::InsufficientAvailability { duration_minutes });
            }
            Err(SlotError::InvalidParameters) => {
                return Err(ToolError::invalid_input(
                    tool.name(),
                    "duration and granularity must be positive",
                ));
            }
        };

        candidates.retain(|c| !input.excluded_starts.contains(&c.start));
        if candidates.is_empty() {
            return Err(ToolError::InsufficientAvailability {
                duration_minutes: input.duration_minutes,
            });
        }

        for candidate in &mut candidates {
            candidate.score = score_slot(
                candidate,
                &input.windows,
                &input.preferences,
                input.bounds.start,
            );
        }
        rank_slots(&mut candidates);

        let total_found = candidates.len();
        candidates.truncate(input.max_suggestions.max(1));

        to_output(
            tool,
            &AnalyzeSlotsOutput {
                candidates,
                total_found,
            },
        )
    }
}

/// Input for [`CreateEventHandler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventInput {
    /// The confirmed slot.
    pub slot: TimeInterval,
    /// Everyone to invite, organizer included.
    pub attendees: Vec<Participant>,
    /// Title, description, organizer.
    pub metadata: EventMetadata,
}

/// Output of [`CreateEventHandler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventOutput {
    /// The collaborator's event identifier.
    pub event_id: String,
}

/// `create_event`: books the confirmed slot on the organizer's calendar.
pub struct CreateEventHandler {
    provider: Arc<dyn EventProvider>,
}

impl CreateEventHandler {
    /// Wrap an event provider.
    pub fn new(provider: Arc<dyn EventProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for CreateEventHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            SchedulingTool::CreateEvent.name(),
            "Create the confirmed calendar event for all attendees",
            json!({
                "type": "object",
                "properties": {
                    "slot": { "type": "object" },
                    "attendees": { "type": "array" },
                    "metadata": { "type": "object" }
                },
                "required": ["slot", "attendees", "metadata"]
            }),
        )
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let tool = SchedulingTool::CreateEvent;
        let input: CreateEventInput = parse_input(tool, input)?;
        let event_id = self
            .provider
            .create_event(input.slot, &input.attendees, &input.metadata)
            .await
            .map_err(|e| ToolError::failed(tool.name(), e))?;
        to_output(tool, &CreateEventOutput { event_id })
    }
}

/// Input for [`SendProposalHandler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendProposalInput {
    /// Recipients.
    pub participants: Vec<Participant>,
    /// The candidate slots being proposed.
    pub slots: Vec<CandidateSlot>,
    /// Session reference for reply correlation.
    pub session_ref: String,
    /// Optional phrasing from the planning strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Output of [`SendProposalHandler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendProposalOutput {
    /// The collaborator's message identifier.
    pub message_id: String,
}

/// `send_proposal`: notifies participants of the proposed slots.
pub struct SendProposalHandler {
    provider: Arc<dyn NotificationProvider>,
}

impl SendProposalHandler {
    /// Wrap a notification provider.
    pub fn new(provider: Arc<dyn NotificationProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for SendProposalHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            SchedulingTool::SendProposal.name(),
            "Send the proposed meeting slots to all participants",
            json!({
                "type": "object",
                "properties": {
                    "participants": { "type": "array" },
                    "slots": { "type": "array" },
                    "session_ref": { "type": "string" },
                    "note": { "type": "string" }
                },
                "required": ["participants", "slots", "session_ref"]
            }),
        )
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let tool = SchedulingTool::SendProposal;
        let input: SendProposalInput = parse_input(tool, input)?;
        let message_id = self
            .provider
            .send_proposal(
                &input.participants,
                &input.slots,
                &input.session_ref,
                input.note.as_deref(),
            )
            .await
            .map_err(|e| ToolError::failed(tool.name(), e))?;
        to_output(tool, &SendProposalOutput { message_id })
    }
}

/// Input for [`CheckRepliesHandler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRepliesInput {
    /// Session reference the replies belong to.
    pub session_ref: String,
    /// Only replies observed after this instant.
    pub since: DateTime<Utc>,
}

/// Output of [`CheckRepliesHandler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRepliesOutput {
    /// Raw observations; the tracker deduplicates them.
    pub replies: Vec<ReplyObservation>,
}

/// `check_replies`: polls the reply collaborator for the session.
pub struct CheckRepliesHandler {
    provider: Arc<dyn ReplyProvider>,
}

impl CheckRepliesHandler {
    /// Wrap a reply provider.
    pub fn new(provider: Arc<dyn ReplyProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for CheckRepliesHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            SchedulingTool::CheckReplies.name(),
            "Check for participant replies to a proposal",
            json!({
                "type": "object",
                "properties": {
                    "session_ref": { "type": "string" },
                    "since": { "type": "string", "format": "date-time" }
                },
                "required": ["session_ref", "since"]
            }),
        )
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let tool = SchedulingTool::CheckReplies;
        let input: CheckRepliesInput = parse_input(tool, input)?;
        let replies = self
            .provider
            .poll_replies(&input.session_ref, input.since)
            .await
            .map_err(|e| ToolError::failed(tool.name(), e))?;
        to_output(tool, &CheckRepliesOutput { replies })
    }
}

/// Build a registry with all five scheduling tools wired to the given
/// collaborators.
pub fn scheduling_registry(
    availability: Arc<dyn AvailabilityProvider>,
    events: Arc<dyn EventProvider>,
    notifications: Arc<dyn NotificationProvider>,
    replies: Arc<dyn ReplyProvider>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    // A fresh registry cannot contain duplicates; registration is infallible here.
    let _ = registry.register(Arc::new(FetchAvailabilityHandler::new(availability)));
    let _ = registry.register(Arc::new(AnalyzeSlotsHandler));
    let _ = registry.register(Arc::new(CreateEventHandler::new(events)));
    let _ = registry.register(Arc::new(SendProposalHandler::new(notifications)));
    let _ = registry.register(Arc::new(CheckRepliesHandler::new(replies)));
    registry
}
