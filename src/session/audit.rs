//! Append-only audit trail of everything a session did.
//!
//! Every tool attempt becomes exactly one [`ToolInvocation`] record, including
//! retried failures and timeouts, so a session's history is reconstructable
//! after the fact. Records are never mutated or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tools::SchedulingTool;

/// Outcome of a single tool attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// The attempt returned a payload.
    Succeeded {
        /// The tool's output payload.
        output: serde_json::Value,
    },
    /// The attempt failed.
    Failed {
        /// Stable error classification label, e.g. `rate_limited`.
        kind: String,
        /// Human-readable error message.
        message: String,
    },
}

impl InvocationOutcome {
    /// Whether this attempt succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationOutcome::Succeeded { .. })
    }
}

/// One tool attempt: which tool, with what input, and how it went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Unique id of this attempt.
    pub id: Uuid,
    /// The tool invoked.
    pub tool: SchedulingTool,
    /// The input payload handed to the registry.
    pub input: serde_json::Value,
    /// How the attempt ended.
    pub outcome: InvocationOutcome,
    /// 1-based attempt number within one logical invocation.
    pub attempt: u32,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// When the attempt finished.
    pub finished_at: DateTime<Utc>,
}

impl ToolInvocation {
    /// Record a new attempt.
    pub fn new(
        tool: SchedulingTool,
        input: serde_json::Value,
        outcome: InvocationOutcome,
        attempt: u32,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool,
            input,
            outcome,
            attempt,
            started_at,
            finished_at,
        }
    }
}

/// A lifecycle event that is not a tool attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRecord {
    /// Short event name, e.g. `transition` or `relaxation`.
    pub event: String,
    /// Free-form detail.
    pub detail: String,
    /// When the event happened.
    pub at: DateTime<Utc>,
}

impl ControlRecord {
    /// Record a control event at the current time.
    pub fn now(event: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            detail: detail.into(),
            at: Utc::now(),
        }
    }
}

/// One entry in the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditRecord {
    /// A tool attempt.
    Invocation(ToolInvocation),
    /// A lifecycle event.
    Control(ControlRecord),
}

/// The append-only per-session audit log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tool attempt.
    pub fn push_invocation(&mut self, invocation: ToolInvocation) {
        self.records.push(AuditRecord::Invocation(invocation));
    }

    /// Append a control event.
    pub fn push_control(&mut self, event: impl Into<String>, detail: impl Into<String>) {
        self.records
            .push(AuditRecord::Control(ControlRecord::now(event, detail)));
    }

    /// All records in append order.
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of attempts recorded for one tool, including failures.
    pub fn invocation_count_for(&self, tool: SchedulingTool) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, AuditRecord::Invocation(inv) if inv.tool == tool))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attempt(tool: SchedulingTool, attempt: u32, ok: bool) -> ToolInvocation {
        let now = Utc::now();
        let outcome = if ok {
            InvocationOutcome::Succeeded { output: json!({}) }
        } else {
            InvocationOutcome::Failed {
                kind: "rate_limited".to_string(),
                message: "slow down".to_string(),
            }
        };
        ToolInvocation::new(tool, json!({}), outcome, attempt, now, now)
    }

    #[test]
    fn counts_attempts_per_tool_including_failures() {
        let mut log = AuditLog::new();
        log.push_invocation(attempt(SchedulingTool::FetchAvailability, 1, false));
        log.push_invocation(attempt(SchedulingTool::FetchAvailability, 2, true));
        log.push_invocation(attempt(SchedulingTool::AnalyzeSlots, 1, true));
        log.push_control("transition", "analyzing -> proposed");

        assert_eq!(log.invocation_count_for(SchedulingTool::FetchAvailability), 2);
        assert_eq!(log.invocation_count_for(SchedulingTool::AnalyzeSlots), 1);
        assert_eq!(log.invocation_count_for(SchedulingTool::CreateEvent), 0);
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn records_preserve_append_order() {
        let mut log = AuditLog::new();
        log.push_control("transition", "intake -> fetching_availability");
        log.push_invocation(attempt(SchedulingTool::FetchAvailability, 1, true));

        assert!(matches!(log.records()[0], AuditRecord::Control(_)));
        assert!(matches!(log.records()[1], AuditRecord::Invocation(_)));
    }
}
