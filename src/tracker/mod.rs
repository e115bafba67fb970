//! Response tracker: periodic reply polling with deduplication.
//!
//! The tracker is a background task owned by one session. It polls the
//! `check_replies` tool on a fixed interval, deduplicates raw observations,
//! and streams batches to the session runner over a bounded channel. The
//! channel closing is the signal: either the polling horizon elapsed or the
//! session was cancelled. The tracker never interprets replies; tallying and
//! quorum decisions stay in the state machine.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::ResponseConfig;
use crate::model::ResponseEvent;
use crate::retry::RetryPolicy;
use crate::session::audit::ToolInvocation;
use crate::session::invoke_recorded;
use crate::tools::{CheckRepliesInput, CheckRepliesOutput, SchedulingTool, ToolRegistry};

/// One polling cycle's yield.
///
/// `invocations` carries the audit records for every attempt of this poll;
/// `events` carries only replies not seen in any earlier poll.
#[derive(Debug, Clone)]
pub struct TrackerBatch {
    /// Audit records for the poll's attempts, in attempt order.
    pub invocations: Vec<ToolInvocation>,
    /// Newly observed, deduplicated replies.
    pub events: Vec<ResponseEvent>,
}

/// Spawns the polling task for one session.
pub struct ResponseTracker;

impl ResponseTracker {
    /// Start polling replies for `session_ref`.
    ///
    /// One batch is sent per poll, even when it yielded nothing new, so the
    /// runner's audit log stays complete. The returned receiver closes when
    /// the horizon elapses, the token is cancelled, or the runner drops its
    /// end. Poll failures are reported in the batch records and polling
    /// continues; a dead reply collaborator degrades to "nobody answered",
    /// which the runner resolves at the horizon.
    pub fn spawn(
        registry: Arc<ToolRegistry>,
        policy: RetryPolicy,
        session_ref: String,
        config: ResponseConfig,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<TrackerBatch> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let since = Utc::now();
            let horizon = tokio::time::Instant::now() + config.poll_horizon();
            let mut interval = tokio::time::interval(config.poll_interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            let mut seen_ids: HashSet<String> = HashSet::new();
            let mut seen_pairs: HashSet<(String, DateTime<Utc>)> = HashSet::new();

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep_until(horizon) => break,
                    _ = interval.tick() => {}
                }

                let batch =
                    poll_once(&registry, &policy, &session_ref, since, &mut seen_ids, &mut seen_pairs)
                        .await;
                if tx.send(batch).await.is_err() {
                    break;
                }
            }
        });
        rx
    }
}

async fn poll_once(
    registry: &ToolRegistry,
    policy: &RetryPolicy,
    session_ref: &str,
    since: DateTime<Utc>,
    seen_ids: &mut HashSet<String>,
    seen_pairs: &mut HashSet<(String, DateTime<Utc>)>,
) -> TrackerBatch {
    let input = CheckRepliesInput {
        session_ref: session_ref.to_string(),
        since,
    };
    let input = match serde_json::to_value(&input) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("check_replies input not serializable: {e}");
            return TrackerBatch {
                invocations: Vec::new(),
                events: Vec::new(),
            };
        }
    };

    let (result, invocations) =
        invoke_recorded(registry, policy, SchedulingTool::CheckReplies, input).await;

    let mut events = Vec::new();
    match result {
        Ok(output) => match serde_json::from_value::<CheckRepliesOutput>(output) {
            Ok(output) => {
                for reply in output.replies {
                    // Dedupe on the collaborator's id and, independently, on
                    // the (participant, slot) pair: a participant changing
                    // their answer still counts once.
                    let pair = (reply.participant.clone(), reply.slot_start);
                    if !seen_ids.insert(reply.reply_id.clone()) || !seen_pairs.insert(pair) {
                        continue;
                    }
                    events.push(ResponseEvent {
                        participant: reply.participant,
                        slot_start: reply.slot_start,
                        decision: reply.decision,
                        reply_id: reply.reply_id,
                        received_at: reply.received_at,
                    });
                }
            }
            Err(e) => tracing::error!("check_replies output malformed: {e}"),
        },
        Err(e) => {
            tracing::warn!(session = session_ref, "reply poll failed: {e}");
        }
    }

    TrackerBatch {
        invocations,
        events,
    }
}
