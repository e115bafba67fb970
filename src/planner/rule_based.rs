//! The deterministic default strategy.

use async_trait::async_trait;

use crate::tools::ToolDefinition;

use super::{PlanError, PlanStrategy, PlannedStep, SessionSnapshot};

/// Maps each active state to its single legal tool.
///
/// This is the authoritative baseline: every other strategy must agree with
/// the state machine's whitelist, and the reasoning strategy falls back here.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedStrategy;

#[async_trait]
impl PlanStrategy for RuleBasedStrategy {
    async fn next_step(
        &self,
        snapshot: &SessionSnapshot,
        _tools: &[ToolDefinition],
    ) -> Result<PlannedStep, PlanError> {
        match snapshot.state.allowed_tools().first() {
            Some(tool) => Ok(PlannedStep::tool(*tool)),
            None => Err(PlanError::NoStepForState {
                state: snapshot.state,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::snapshot_in;
    use crate::session::SessionState;
    use crate::tools::SchedulingTool;

    #[tokio::test]
    async fn each_active_state_maps_to_its_tool() {
        let cases = [
            (
                SessionState::FetchingAvailability,
                SchedulingTool::FetchAvailability,
            ),
            (SessionState::Analyzing, SchedulingTool::AnalyzeSlots),
            (SessionState::Proposed, SchedulingTool::SendProposal),
            (SessionState::AwaitingResponses, SchedulingTool::CheckReplies),
            (SessionState::Confirming, SchedulingTool::CreateEvent),
        ];
        for (state, expected) in cases {
            let step = RuleBasedStrategy
                .next_step(&snapshot_in(state), &[])
                .await
                .unwrap();
            assert_eq!(step.tool, expected, "wrong tool for {state}");
            assert_eq!(step.note, None);
        }
    }

    #[tokio::test]
    async fn toolless_states_yield_no_step() {
        for state in [
            SessionState::Intake,
            SessionState::Scheduled,
            SessionState::Failed,
            SessionState::Cancelled,
        ] {
            let err = RuleBasedStrategy
                .next_step(&snapshot_in(state), &[])
                .await
                .unwrap_err();
            assert_eq!(err, PlanError::NoStepForState { state });
        }
    }
}
