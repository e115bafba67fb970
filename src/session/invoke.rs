//! Retry-wrapped tool dispatch that records every attempt.

use serde_json::Value;

use crate::retry::{run_retrying, RetryPolicy};
use crate::tools::{SchedulingTool, ToolError, ToolRegistry};

use super::audit::{InvocationOutcome, ToolInvocation};

/// Invoke one tool under the retry policy and per-attempt timeout.
///
/// Returns the final outcome together with one [`ToolInvocation`] record per
/// attempt, in attempt order. Callers append the records to their audit log;
/// the records exist even when every attempt failed.
pub(crate) async fn invoke_recorded(
    registry: &ToolRegistry,
    policy: &RetryPolicy,
    tool: SchedulingTool,
    input: Value,
) -> (Result<Value, ToolError>, Vec<ToolInvocation>) {
    let mut records = Vec::new();
    let result = run_retrying(
        policy,
        |_| {
            let input = input.clone();
            async move {
                match tokio::time::timeout(
                    policy.invocation_timeout(),
                    registry.invoke(tool.name(), input),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ToolError::invocation_timeout(
                        tool.name(),
                        policy.invocation_timeout_secs,
                    )),
                }
            }
        },
        |attempt| {
            let outcome = match attempt.outcome {
                Ok(output) => InvocationOutcome::Succeeded {
                    output: output.clone(),
                },
                Err(err) => InvocationOutcome::Failed {
                    kind: err.kind_label().to_string(),
                    message: err.to_string(),
                },
            };
            records.push(ToolInvocation::new(
                tool,
                input.clone(),
                outcome,
                attempt.number,
                attempt.started_at,
                attempt.finished_at,
            ));
        },
    )
    .await;
    (result, records)
}
