//! Planning step engine: decides which tool a session invokes next.
//!
//! The state machine owns correctness; a strategy only picks the next tool
//! from the state's whitelist. [`RuleBasedStrategy`] is the deterministic
//! default, [`ReasoningStrategy`] delegates the pick to a reasoning model
//! under the shared retry policy and falls back to the rules whenever the
//! model misbehaves, so swapping strategies can never change which
//! transitions are possible.

pub mod reasoning;
pub mod rule_based;

pub use reasoning::ReasoningStrategy;
pub use rule_based::RuleBasedStrategy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::session::SessionState;
use crate::slots::CandidateSlot;
use crate::tools::{SchedulingTool, ToolDefinition};

/// A read-only view of a session handed to planning strategies.
///
/// Serialized as JSON for reasoning providers; strategies never get a handle
/// to the live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// The session id.
    pub session_id: Uuid,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Meeting title.
    pub title: String,
    /// Number of participants, organizer included.
    pub participant_count: usize,
    /// Requested duration in minutes.
    pub duration_minutes: u32,
    /// Availability windows fetched so far.
    pub windows_fetched: usize,
    /// Current candidate slots, best first.
    pub candidates: Vec<CandidateSlot>,
    /// Acceptances recorded for the leading slot.
    pub leading_slot_accepts: usize,
    /// Completed re-proposal cycles.
    pub reproposal_round: u32,
    /// Audit records written so far.
    pub audit_len: usize,
}

/// The step a strategy decided on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStep {
    /// The tool to invoke.
    pub tool: SchedulingTool,
    /// Optional free-text note, e.g. phrasing for the proposal message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PlannedStep {
    /// A step with no note.
    pub fn tool(tool: SchedulingTool) -> Self {
        Self { tool, note: None }
    }
}

/// Planning failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The state has no tool to plan; the runner handles it directly.
    #[error("no tool is planned in state {state}")]
    NoStepForState {
        /// The state that has no associated tool.
        state: SessionState,
    },
}

/// Picks the next tool for a session.
#[async_trait]
pub trait PlanStrategy: Send + Sync {
    /// Decide the next step given a snapshot and the registry's declared
    /// tools. Implementations must return a tool from
    /// `snapshot.state.allowed_tools()`.
    async fn next_step(
        &self,
        snapshot: &SessionSnapshot,
        tools: &[ToolDefinition],
    ) -> Result<PlannedStep, PlanError>;
}

#[cfg(test)]
pub(crate) fn snapshot_in(state: SessionState) -> SessionSnapshot {
    SessionSnapshot {
        session_id: Uuid::new_v4(),
        state,
        title: "Roadmap review".to_string(),
        participant_count: 3,
        duration_minutes: 30,
        windows_fetched: 0,
        candidates: Vec::new(),
        leading_slot_accepts: 0,
        reproposal_round: 0,
        audit_len: 0,
    }
}
