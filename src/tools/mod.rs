//! Tool registry: named scheduling capabilities behind typed contracts.
//!
//! The session state machine never talks to a collaborator directly; it
//! dispatches through this registry so concrete providers stay swappable and
//! every invocation is observable. The registry is a pure dispatch table -
//! retries and timeouts are layered on by the retry policy, side effects
//! happen only inside handlers.

pub mod builtin;
pub mod definition;
pub mod error;
pub mod registry;

pub use builtin::{
    scheduling_registry, AnalyzeSlotsHandler, AnalyzeSlotsInput, AnalyzeSlotsOutput,
    CheckRepliesHandler, CheckRepliesInput, CheckRepliesOutput, CreateEventHandler,
    CreateEventInput, CreateEventOutput, FetchAvailabilityHandler, FetchAvailabilityInput,
    FetchAvailabilityOutput, SendProposalHandler, SendProposalInput, SendProposalOutput,
};
pub use definition::ToolDefinition;
pub use error::ToolError;
pub use registry::{ToolHandler, ToolRegistry};

use serde::{Deserialize, Serialize};

/// The five scheduling capabilities for strongly-typed dispatch.
///
/// String names cross the reasoning-provider boundary; everywhere inside the
/// crate this enum keeps tool selection checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingTool {
    /// Fetch one participant's availability window.
    FetchAvailability,
    /// Intersect windows into scored candidate slots.
    AnalyzeSlots,
    /// Send the proposed slots to participants.
    SendProposal,
    /// Create the confirmed calendar event.
    CreateEvent,
    /// Poll for participant replies.
    CheckReplies,
}

impl SchedulingTool {
    /// The registry name of this tool.
    pub fn name(&self) -> &'static str {
        match self {
            SchedulingTool::FetchAvailability => "fetch_availability",
            SchedulingTool::AnalyzeSlots => "analyze_slots",
            SchedulingTool::SendProposal => "send_proposal",
            SchedulingTool::CreateEvent => "create_event",
            SchedulingTool::CheckReplies => "check_replies",
        }
    }

    /// Parse a registry name back into a tool.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fetch_availability" => Some(SchedulingTool::FetchAvailability),
            "analyze_slots" => Some(SchedulingTool::AnalyzeSlots),
            "send_proposal" => Some(SchedulingTool::SendProposal),
            "create_event" => Some(SchedulingTool::CreateEvent),
            "check_replies" => Some(SchedulingTool::CheckReplies),
            _ => None,
        }
    }

    /// All scheduling tools.
    pub fn all() -> &'static [SchedulingTool] {
        &[
            SchedulingTool::FetchAvailability,
            SchedulingTool::AnalyzeSlots,
            SchedulingTool::SendProposal,
            SchedulingTool::CreateEvent,
            SchedulingTool::CheckReplies,
        ]
    }
}

impl std::fmt::Display for SchedulingTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for tool in SchedulingTool::all() {
            assert_eq!(SchedulingTool::from_name(tool.name()), Some(*tool));
        }
        assert_eq!(SchedulingTool::from_name("launch_rocket"), None);
    }
}
