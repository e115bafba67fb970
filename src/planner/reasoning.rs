//! Model-backed planning with a validated, rule-based safety net.

use std::sync::Arc;

use async_trait::async_trait;

use crate::provider::{ProviderError, ReasoningProvider};
use crate::retry::{run_retrying, RetryPolicy};
use crate::tools::{SchedulingTool, ToolDefinition};

use super::{PlanError, PlanStrategy, PlannedStep, RuleBasedStrategy, SessionSnapshot};

/// Lets a reasoning model pick the next tool, within the state's whitelist.
///
/// The model sees the serialized snapshot and the registry's schemas, and the
/// call runs under the same retry policy as every tool invocation: each
/// attempt is bounded by the policy's per-invocation timeout, and retryable
/// failures back off and retry up to the attempt ceiling. The model's pick is
/// accepted only when it names a known tool that the current state allows; on
/// any other outcome (unknown name, out-of-order tool, exhausted or
/// non-retryable provider failure, unserializable snapshot) the strategy logs
/// a warning and defers to [`RuleBasedStrategy`]. A misbehaving model can
/// therefore stall nothing and skip nothing.
pub struct ReasoningStrategy {
    provider: Arc<dyn ReasoningProvider>,
    policy: RetryPolicy,
    fallback: RuleBasedStrategy,
}

impl ReasoningStrategy {
    /// Wrap a reasoning provider, retrying its calls under `policy`.
    pub fn new(provider: Arc<dyn ReasoningProvider>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            fallback: RuleBasedStrategy,
        }
    }

    fn validate_choice(
        snapshot: &SessionSnapshot,
        tool_name: &str,
    ) -> Option<SchedulingTool> {
        let tool = SchedulingTool::from_name(tool_name)?;
        if snapshot.state.allowed_tools().contains(&tool) {
            Some(tool)
        } else {
            None
        }
    }
}

#[async_trait]
impl PlanStrategy for ReasoningStrategy {
    async fn next_step(
        &self,
        snapshot: &SessionSnapshot,
        tools: &[ToolDefinition],
    ) -> Result<PlannedStep, PlanError> {
        let snapshot_value = match serde_json::to_value(snapshot) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("session snapshot not serializable, using rules: {e}");
                return self.fallback.next_step(snapshot, tools).await;
            }
        };
        let schemas: Vec<serde_json::Value> = tools.iter().map(|d| d.schema()).collect();

        let outcome = run_retrying(
            &self.policy,
            |_| {
                let snapshot_value = snapshot_value.clone();
                let schemas = &schemas;
                async move {
                    match tokio::time::timeout(
                        self.policy.invocation_timeout(),
                        self.provider.propose_next_tool(snapshot_value, schemas),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::timeout(format!(
                            "reasoning call exceeded {}s",
                            self.policy.invocation_timeout_secs
                        ))),
                    }
                }
            },
            |attempt| {
                if let Err(e) = attempt.outcome {
                    tracing::debug!(attempt = attempt.number, "reasoning attempt failed: {e}");
                }
            },
        )
        .await;

        match outcome {
            Ok(choice) => match Self::validate_choice(snapshot, &choice.tool_name) {
                Some(tool) => Ok(PlannedStep {
                    tool,
                    note: choice.note,
                }),
                None => {
                    tracing::warn!(
                        tool = %choice.tool_name,
                        state = %snapshot.state,
                        "reasoning provider picked a disallowed tool, using rules"
                    );
                    self.fallback.next_step(snapshot, tools).await
                }
            },
            Err(e) => {
                tracing::warn!("reasoning provider failed, using rules: {e}");
                self.fallback.next_step(snapshot, tools).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::snapshot_in;
    use crate::provider::{ProviderError, ToolChoice};
    use crate::session::SessionState;
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 1,
            backoff_multiplier: 2.0,
            max_backoff_ms: 5,
            invocation_timeout_secs: 1,
        }
    }

    struct FixedChoice(&'static str, Option<&'static str>);

    #[async_trait]
    impl ReasoningProvider for FixedChoice {
        async fn propose_next_tool(
            &self,
            _snapshot: Value,
            _tool_schemas: &[Value],
        ) -> Result<ToolChoice, ProviderError> {
            Ok(ToolChoice {
                tool_name: self.0.to_string(),
                note: self.1.map(str::to_string),
            })
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl ReasoningProvider for AlwaysFails {
        async fn propose_next_tool(
            &self,
            _snapshot: Value,
            _tool_schemas: &[Value],
        ) -> Result<ToolChoice, ProviderError> {
            Err(ProviderError::unknown("model returned garbage"))
        }
    }

    /// Times out once, then answers with a valid pick.
    struct FlakyChoice {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ReasoningProvider for FlakyChoice {
        async fn propose_next_tool(
            &self,
            _snapshot: Value,
            _tool_schemas: &[Value],
        ) -> Result<ToolChoice, ProviderError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ProviderError::timeout("model did not answer"));
            }
            Ok(ToolChoice {
                tool_name: "send_proposal".to_string(),
                note: Some("Friday works best.".to_string()),
            })
        }
    }

    /// Never resolves; only the per-attempt timeout gets rid of it.
    struct NeverAnswers {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ReasoningProvider for NeverAnswers {
        async fn propose_next_tool(
            &self,
            _snapshot: Value,
            _tool_schemas: &[Value],
        ) -> Result<ToolChoice, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn accepts_a_whitelisted_pick_with_note() {
        let strategy = ReasoningStrategy::new(
            Arc::new(FixedChoice(
                "send_proposal",
                Some("Please pick a slot by Friday."),
            )),
            fast_policy(),
        );
        let step = strategy
            .next_step(&snapshot_in(SessionState::Proposed), &[])
            .await
            .unwrap();
        assert_eq!(step.tool, SchedulingTool::SendProposal);
        assert_eq!(step.note.as_deref(), Some("Please pick a slot by Friday."));
    }

    #[tokio::test]
    async fn out_of_order_pick_falls_back_to_rules() {
        // Model tries to create the event while still fetching availability.
        let strategy = ReasoningStrategy::new(
            Arc::new(FixedChoice("create_event", None)),
            fast_policy(),
        );
        let step = strategy
            .next_step(&snapshot_in(SessionState::FetchingAvailability), &[])
            .await
            .unwrap();
        assert_eq!(step.tool, SchedulingTool::FetchAvailability);
    }

    #[tokio::test]
    async fn unknown_tool_name_falls_back_to_rules() {
        let strategy = ReasoningStrategy::new(
            Arc::new(FixedChoice("summon_demon", None)),
            fast_policy(),
        );
        let step = strategy
            .next_step(&snapshot_in(SessionState::Analyzing), &[])
            .await
            .unwrap();
        assert_eq!(step.tool, SchedulingTool::AnalyzeSlots);
    }

    #[tokio::test]
    async fn non_retryable_failure_falls_back_to_rules() {
        let strategy = ReasoningStrategy::new(Arc::new(AlwaysFails), fast_policy());
        let step = strategy
            .next_step(&snapshot_in(SessionState::AwaitingResponses), &[])
            .await
            .unwrap();
        assert_eq!(step.tool, SchedulingTool::CheckReplies);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_retried_and_the_note_survives() {
        let provider = Arc::new(FlakyChoice {
            calls: AtomicU32::new(0),
        });
        let strategy = ReasoningStrategy::new(
            Arc::clone(&provider) as Arc<dyn ReasoningProvider>,
            fast_policy(),
        );
        let step = strategy
            .next_step(&snapshot_in(SessionState::Proposed), &[])
            .await
            .unwrap();

        // The second attempt's answer is used, note intact.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(step.tool, SchedulingTool::SendProposal);
        assert_eq!(step.note.as_deref(), Some("Friday works best."));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_provider_exhausts_attempts_then_falls_back_to_rules() {
        let provider = Arc::new(NeverAnswers {
            calls: AtomicU32::new(0),
        });
        let strategy = ReasoningStrategy::new(
            Arc::clone(&provider) as Arc<dyn ReasoningProvider>,
            fast_policy(),
        );
        let step = strategy
            .next_step(&snapshot_in(SessionState::Analyzing), &[])
            .await
            .unwrap();

        // Every attempt was cut off by the per-call timeout; planning still
        // resolved instead of hanging the session.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(step.tool, SchedulingTool::AnalyzeSlots);
        assert!(step.note.is_none());
    }
}
