//! Session lifecycle states and the legal transitions between them.

use serde::{Deserialize, Serialize};

use crate::tools::SchedulingTool;

/// Lifecycle state of a scheduling session.
///
/// Transitions are validated by [`SessionState::can_transition_to`]; the
/// runner never mutates state except through that check, so an illegal edge
/// is a bug surfaced immediately rather than a silently corrupt session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Request received, not yet validated.
    Intake,
    /// Fetching participant availability windows.
    FetchingAvailability,
    /// Intersecting and scoring candidate slots.
    Analyzing,
    /// Candidates chosen, proposal being sent.
    Proposed,
    /// Proposal sent, collecting participant replies.
    AwaitingResponses,
    /// Quorum reached, creating the calendar event.
    Confirming,
    /// Event created. Terminal.
    Scheduled,
    /// Unrecoverable failure. Terminal.
    Failed,
    /// Cancelled by the caller. Terminal.
    Cancelled,
}

impl SessionState {
    /// Whether the session has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Scheduled | SessionState::Failed | SessionState::Cancelled
        )
    }

    /// Whether moving from `self` to `next` is a legal lifecycle edge.
    ///
    /// `Failed` and `Cancelled` are reachable from any non-terminal state.
    /// `AwaitingResponses -> Analyzing` is the all-declined re-proposal edge
    /// and `Confirming -> Analyzing` the booking-conflict edge.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(next, SessionState::Failed | SessionState::Cancelled) {
            return true;
        }
        matches!(
            (self, next),
            (SessionState::Intake, SessionState::FetchingAvailability)
                | (SessionState::FetchingAvailability, SessionState::Analyzing)
                | (SessionState::Analyzing, SessionState::Proposed)
                | (SessionState::Proposed, SessionState::AwaitingResponses)
                | (SessionState::AwaitingResponses, SessionState::Confirming)
                | (SessionState::AwaitingResponses, SessionState::Analyzing)
                | (SessionState::Confirming, SessionState::Scheduled)
                | (SessionState::Confirming, SessionState::Analyzing)
        )
    }

    /// The tools a planning strategy may legally pick in this state.
    ///
    /// Empty for `Intake` (validation is pure) and for terminal states.
    pub fn allowed_tools(&self) -> &'static [SchedulingTool] {
        match self {
            SessionState::FetchingAvailability => &[SchedulingTool::FetchAvailability],
            SessionState::Analyzing => &[SchedulingTool::AnalyzeSlots],
            SessionState::Proposed => &[SchedulingTool::SendProposal],
            SessionState::AwaitingResponses => &[SchedulingTool::CheckReplies],
            SessionState::Confirming => &[SchedulingTool::CreateEvent],
            SessionState::Intake
            | SessionState::Scheduled
            | SessionState::Failed
            | SessionState::Cancelled => &[],
        }
    }

    /// Human-readable label used in logs and session summaries.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Intake => "intake",
            SessionState::FetchingAvailability => "fetching_availability",
            SessionState::Analyzing => "analyzing",
            SessionState::Proposed => "proposed",
            SessionState::AwaitingResponses => "awaiting_responses",
            SessionState::Confirming => "confirming",
            SessionState::Scheduled => "scheduled",
            SessionState::Failed => "failed",
            SessionState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Why a session ended in [`SessionState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The request failed validation at intake.
    InvalidRequest {
        /// Validation message.
        message: String,
    },
    /// Too few availability windows arrived to proceed.
    AvailabilityUnavailable,
    /// No common free slot exists, even after relaxation.
    InsufficientAvailability,
    /// A retryable tool failure persisted through the whole retry budget.
    RetriesExhausted {
        /// The tool that kept failing.
        tool: String,
        /// Classification of the final error.
        kind: String,
    },
    /// A collaborator rejected our credentials.
    AuthRejected {
        /// The tool whose provider rejected authentication.
        tool: String,
    },
    /// A tool failed non-retryably for a reason other than authentication.
    ToolFailed {
        /// The failing tool.
        tool: String,
        /// Classification of the failure.
        kind: String,
    },
    /// The response horizon elapsed without enough acceptances.
    NoResponses,
    /// All proposed slots were declined too many times.
    ProposalsExhausted,
    /// The session deadline elapsed before scheduling completed.
    DeadlineExceeded,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::InvalidRequest { message } => {
                write!(f, "invalid request: {message}")
            }
            FailureReason::AvailabilityUnavailable => {
                write!(f, "not enough availability data to proceed")
            }
            FailureReason::InsufficientAvailability => {
                write!(f, "no common free slot for the requested duration")
            }
            FailureReason::RetriesExhausted { tool, kind } => {
                write!(f, "retries exhausted for {tool} ({kind})")
            }
            FailureReason::AuthRejected { tool } => {
                write!(f, "authentication rejected while invoking {tool}")
            }
            FailureReason::ToolFailed { tool, kind } => {
                write!(f, "{tool} failed non-retryably ({kind})")
            }
            FailureReason::NoResponses => {
                write!(f, "response horizon elapsed without enough acceptances")
            }
            FailureReason::ProposalsExhausted => {
                write!(f, "all proposed slots declined, re-proposal budget spent")
            }
            FailureReason::DeadlineExceeded => write!(f, "session deadline exceeded"),
        }
    }
}
