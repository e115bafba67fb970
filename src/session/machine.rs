//! The per-session runner driving the scheduling state machine.
//!
//! One runner task owns one session's data exclusively; observers read the
//! [`SessionView`] it publishes over a watch channel after every change, so
//! there is no shared mutable session state anywhere.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::model::{MeetingRequest, Participant, ReplyDecision, ResponseEvent};
use crate::observability::SessionLogWriter;
use crate::planner::{PlanStrategy, PlannedStep};
use crate::planner::SessionSnapshot;
use crate::provider::{EventMetadata, ProviderErrorKind};
use crate::retry::Retryable;
use crate::slots::{AvailabilityWindow, CandidateSlot, TimeInterval};
use crate::tools::{
    AnalyzeSlotsInput, AnalyzeSlotsOutput, CreateEventInput, CreateEventOutput,
    FetchAvailabilityInput, FetchAvailabilityOutput, SchedulingTool, SendProposalInput,
    SendProposalOutput, ToolError, ToolRegistry,
};
use crate::tracker::ResponseTracker;

use super::audit::{AuditLog, AuditRecord};
use super::invoke::invoke_recorded;
use super::state::{FailureReason, SessionState};

/// A point-in-time, read-only copy of a session, published after every
/// state change and reply batch.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    /// The session id.
    pub session_id: Uuid,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Meeting title.
    pub title: String,
    /// Current candidate slots, best first.
    pub candidates: Vec<CandidateSlot>,
    /// The slot being booked or already booked.
    pub confirmed_slot: Option<TimeInterval>,
    /// Calendar event id once scheduled.
    pub event_id: Option<String>,
    /// Why the session failed, when it did.
    pub failure: Option<FailureReason>,
    /// Completed re-proposal cycles.
    pub reproposal_round: u32,
    /// Completed constraint relaxations.
    pub relaxation_round: u32,
    /// Participants dropped by relaxation, in drop order.
    pub dropped_participants: Vec<String>,
    /// The complete audit trail so far.
    pub audit: Vec<AuditRecord>,
    /// When this view was published.
    pub updated_at: DateTime<Utc>,
}

impl SessionView {
    pub(crate) fn initial(session_id: Uuid, title: String) -> Self {
        Self {
            session_id,
            state: SessionState::Intake,
            title,
            candidates: Vec::new(),
            confirmed_slot: None,
            event_id: None,
            failure: None,
            reproposal_round: 0,
            relaxation_round: 0,
            dropped_participants: Vec::new(),
            audit: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Picks which optional participant to give up on when no common slot exists.
pub trait RelaxationStrategy: Send + Sync {
    /// Return the email of the next participant to drop, or `None` when no
    /// further relaxation is acceptable. The organizer is never a valid
    /// answer.
    fn next_drop(
        &self,
        request: &MeetingRequest,
        windows: &[AvailabilityWindow],
        already_dropped: &[String],
    ) -> Option<String>;
}

/// Default relaxation: drop the participant with the most busy time inside
/// the request window, on the grounds that they were the least likely to
/// attend anyway.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropLeastAvailable;

impl RelaxationStrategy for DropLeastAvailable {
    fn next_drop(
        &self,
        request: &MeetingRequest,
        windows: &[AvailabilityWindow],
        already_dropped: &[String],
    ) -> Option<String> {
        let bounds = TimeInterval::new(request.window_start, request.window_end);
        request
            .participants
            .iter()
            .filter(|p| !already_dropped.contains(&p.email))
            .map(|p| {
                let busy = windows
                    .iter()
                    .find(|w| w.participant == p.email)
                    .map_or(0, |w| w.busy_minutes_within(&bounds));
                (busy, p.email.clone())
            })
            .max()
            .map(|(_, email)| email)
    }
}

/// Why the main loop stopped before reaching `Scheduled`.
enum Interrupt {
    Failed(FailureReason),
    Cancelled,
}

/// How a response-collection round ended.
enum CollectOutcome {
    Confirmed(CandidateSlot),
    AllDeclined,
    HorizonElapsed,
    Cancelled,
    DeadlineExceeded,
}

/// Owns and drives one session from intake to a terminal state.
pub struct SessionRunner {
    id: Uuid,
    request: MeetingRequest,
    config: SchedulerConfig,
    registry: Arc<ToolRegistry>,
    strategy: Arc<dyn PlanStrategy>,
    relaxation: Arc<dyn RelaxationStrategy>,
    cancel: CancellationToken,
    views: watch::Sender<SessionView>,
    log: Option<SessionLogWriter>,

    state: SessionState,
    audit: AuditLog,
    windows: Vec<AvailabilityWindow>,
    candidates: Vec<CandidateSlot>,
    excluded_starts: Vec<DateTime<Utc>>,
    accepts: HashMap<DateTime<Utc>, HashSet<String>>,
    declines: HashMap<DateTime<Utc>, HashSet<String>>,
    dropped: Vec<String>,
    reproposal_round: u32,
    relaxation_round: u32,
    chosen: Option<CandidateSlot>,
    event_id: Option<String>,
    failure: Option<FailureReason>,
    deadline: DateTime<Utc>,
}

impl SessionRunner {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: Uuid,
        request: MeetingRequest,
        config: SchedulerConfig,
        registry: Arc<ToolRegistry>,
        strategy: Arc<dyn PlanStrategy>,
        relaxation: Arc<dyn RelaxationStrategy>,
        cancel: CancellationToken,
        views: watch::Sender<SessionView>,
        log: Option<SessionLogWriter>,
    ) -> Self {
        let deadline = Utc::now()
            + chrono::Duration::seconds(config.scheduling.session_deadline().as_secs() as i64);
        Self {
            id,
            request,
            config,
            registry,
            strategy,
            relaxation,
            cancel,
            views,
            log,
            state: SessionState::Intake,
            audit: AuditLog::new(),
            windows: Vec::new(),
            candidates: Vec::new(),
            excluded_starts: Vec::new(),
            accepts: HashMap::new(),
            declines: HashMap::new(),
            dropped: Vec::new(),
            reproposal_round: 0,
            relaxation_round: 0,
            chosen: None,
            event_id: None,
            failure: None,
            deadline,
        }
    }

    /// Drive the session to a terminal state and publish the final view.
    pub(crate) async fn run(mut self) {
        match self.drive().await {
            Ok(()) => {}
            Err(Interrupt::Failed(reason)) => {
                tracing::warn!(session = %self.id, "session failed: {reason}");
                self.audit.push_control("failure", reason.to_string());
                self.failure = Some(reason);
                self.transition(SessionState::Failed);
            }
            Err(Interrupt::Cancelled) => {
                self.audit.push_control("cancelled", "cancelled by caller");
                self.transition(SessionState::Cancelled);
            }
        }
        self.publish();
        if let Some(log) = &self.log {
            if let Err(e) = log.write(&self.view()) {
                tracing::warn!(session = %self.id, "session log write failed: {e:#}");
            }
        }
    }

    async fn drive(&mut self) -> Result<(), Interrupt> {
        if let Err(e) = self.request.validate() {
            return Err(Interrupt::Failed(FailureReason::InvalidRequest {
                message: e.to_string(),
            }));
        }
        self.transition(SessionState::FetchingAvailability);

        while !self.state.is_terminal() {
            self.checkpoint()?;
            match self.state {
                SessionState::FetchingAvailability => self.fetch_availability().await?,
                SessionState::Analyzing => self.analyze().await?,
                SessionState::Proposed => self.send_proposal().await?,
                SessionState::AwaitingResponses => self.collect_responses().await?,
                SessionState::Confirming => self.create_event().await?,
                SessionState::Intake
                | SessionState::Scheduled
                | SessionState::Failed
                | SessionState::Cancelled => break,
            }
        }
        Ok(())
    }

    fn checkpoint(&self) -> Result<(), Interrupt> {
        if self.cancel.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }
        if Utc::now() >= self.deadline {
            return Err(Interrupt::Failed(FailureReason::DeadlineExceeded));
        }
        Ok(())
    }

    /// Ask the strategy for the next step, holding it to the state machine's
    /// whitelist. A strategy that disagrees is overruled, not trusted.
    async fn plan_step(&self, expected: SchedulingTool) -> PlannedStep {
        let snapshot = self.snapshot();
        match self
            .strategy
            .next_step(&snapshot, &self.registry.definitions())
            .await
        {
            Ok(step) if step.tool == expected => step,
            Ok(step) => {
                tracing::warn!(
                    session = %self.id,
                    planned = %step.tool,
                    expected = %expected,
                    "strategy disagreed with the state machine; overruled"
                );
                PlannedStep::tool(expected)
            }
            Err(e) => {
                tracing::warn!(session = %self.id, "planning failed, using state default: {e}");
                PlannedStep::tool(expected)
            }
        }
    }

    async fn fetch_availability(&mut self) -> Result<(), Interrupt> {
        let _ = self.plan_step(SchedulingTool::FetchAvailability).await;
        let bounds = self.bounds();
        let participants = self.active_participants();
        let total = participants.len();
        let registry = Arc::clone(&self.registry);
        let policy = self.config.retry.clone();

        let fetches: Vec<_> = participants
            .into_iter()
            .map(|participant| {
                let registry = &registry;
                let policy = &policy;
                async move {
                    let input = FetchAvailabilityInput {
                        participant: participant.clone(),
                        range: bounds,
                    };
                    let payload = match encode_input(SchedulingTool::FetchAvailability, &input) {
                        Ok(payload) => payload,
                        Err(err) => return (participant, Err(err), Vec::new()),
                    };
                    let (result, records) = invoke_recorded(
                        registry,
                        policy,
                        SchedulingTool::FetchAvailability,
                        payload,
                    )
                    .await;
                    (participant, result, records)
                }
            })
            .collect();

        let results = tokio::select! {
            _ = self.cancel.cancelled() => return Err(Interrupt::Cancelled),
            results = join_all(fetches) => results,
        };

        let mut all_records = Vec::new();
        let mut fetched = Vec::new();
        let mut auth_failed = false;
        let mut failures = 0usize;
        for (participant, result, records) in results {
            all_records.extend(records);
            match result {
                Ok(output) => match serde_json::from_value::<FetchAvailabilityOutput>(output) {
                    Ok(out) => fetched.push(out.window),
                    Err(e) => {
                        failures += 1;
                        tracing::error!(
                            participant = %participant.email,
                            "availability output malformed: {e}"
                        );
                    }
                },
                Err(err) => {
                    failures += 1;
                    if err.provider_kind() == Some(ProviderErrorKind::Auth) {
                        auth_failed = true;
                    }
                    tracing::warn!(
                        participant = %participant.email,
                        "availability fetch failed: {err}"
                    );
                }
            }
        }
        // Fan-in: interleave concurrent attempt records back into one
        // time-ordered trail.
        all_records.sort_by_key(|r| r.started_at);
        for record in all_records {
            self.audit.push_invocation(record);
        }

        if auth_failed {
            return Err(Interrupt::Failed(FailureReason::AuthRejected {
                tool: SchedulingTool::FetchAvailability.name().to_string(),
            }));
        }
        let required = self
            .config
            .scheduling
            .availability_quorum
            .unwrap_or(total)
            .clamp(1, total.max(1));
        if fetched.len() < required {
            return Err(Interrupt::Failed(FailureReason::AvailabilityUnavailable));
        }
        if failures > 0 {
            self.audit.push_control(
                "degraded_availability",
                format!("{failures} of {total} fetches failed; proceeding with {}", fetched.len()),
            );
        }

        self.windows = fetched;
        self.transition(SessionState::Analyzing);
        Ok(())
    }

    async fn analyze(&mut self) -> Result<(), Interrupt> {
        let _ = self.plan_step(SchedulingTool::AnalyzeSlots).await;
        let tool = SchedulingTool::AnalyzeSlots;
        let input = AnalyzeSlotsInput {
            windows: self.windows.clone(),
            duration_minutes: self.request.duration_minutes,
            bounds: self.bounds(),
            granularity_minutes: self.config.scheduling.granularity_minutes,
            max_suggestions: self.config.scheduling.max_suggestions,
            preferences: self
                .config
                .preferences
                .slot_preferences(self.request.priority),
            excluded_starts: self.excluded_starts.clone(),
        };
        let payload = encode_input(tool, &input).map_err(|e| self.interrupt_for(tool, e))?;
        let (result, records) =
            invoke_recorded(&self.registry, &self.config.retry, tool, payload).await;
        for record in records {
            self.audit.push_invocation(record);
        }

        match result {
            Ok(output) => {
                let out: AnalyzeSlotsOutput = self.decode(tool, output)?;
                self.audit.push_control(
                    "analysis",
                    format!(
                        "proposing {} of {} candidates",
                        out.candidates.len(),
                        out.total_found
                    ),
                );
                self.candidates = out.candidates;
                self.accepts.clear();
                self.declines.clear();
                self.transition(SessionState::Proposed);
                Ok(())
            }
            Err(ToolError::InsufficientAvailability { .. }) => self.try_relax(),
            Err(err) => Err(self.interrupt_for(tool, err)),
        }
    }

    /// No common slot: drop one participant and stay in `Analyzing`, or give
    /// up once the relaxation budget is spent.
    fn try_relax(&mut self) -> Result<(), Interrupt> {
        if self.relaxation_round >= self.config.scheduling.max_relaxation_rounds {
            return Err(Interrupt::Failed(FailureReason::InsufficientAvailability));
        }
        match self
            .relaxation
            .next_drop(&self.request, &self.windows, &self.dropped)
        {
            Some(email) => {
                self.relaxation_round += 1;
                self.windows.retain(|w| w.participant != email);
                self.audit
                    .push_control("relaxation", format!("dropped {email}"));
                self.dropped.push(email);
                self.publish();
                Ok(())
            }
            None => Err(Interrupt::Failed(FailureReason::InsufficientAvailability)),
        }
    }

    async fn send_proposal(&mut self) -> Result<(), Interrupt> {
        let step = self.plan_step(SchedulingTool::SendProposal).await;
        let tool = SchedulingTool::SendProposal;
        let input = SendProposalInput {
            participants: self.active_participants(),
            slots: self.candidates.clone(),
            session_ref: self.id.to_string(),
            note: step.note,
        };
        let payload = encode_input(tool, &input).map_err(|e| self.interrupt_for(tool, e))?;
        let (result, records) =
            invoke_recorded(&self.registry, &self.config.retry, tool, payload).await;
        for record in records {
            self.audit.push_invocation(record);
        }

        match result {
            Ok(output) => {
                let out: SendProposalOutput = self.decode(tool, output)?;
                self.audit
                    .push_control("proposal_sent", format!("message {}", out.message_id));
                self.transition(SessionState::AwaitingResponses);
                Ok(())
            }
            Err(err) => Err(self.interrupt_for(tool, err)),
        }
    }

    async fn collect_responses(&mut self) -> Result<(), Interrupt> {
        let _ = self.plan_step(SchedulingTool::CheckReplies).await;

        // A meeting with nobody to ask confirms its best candidate outright.
        if let Some(slot) = self.quorum_slot() {
            return self.confirm(slot, "quorum met without polling");
        }

        let tracker_cancel = self.cancel.child_token();
        let mut rx = ResponseTracker::spawn(
            Arc::clone(&self.registry),
            self.config.retry.clone(),
            self.id.to_string(),
            self.config.responses.clone(),
            tracker_cancel.clone(),
        );

        let outcome = loop {
            let batch = tokio::select! {
                _ = self.cancel.cancelled() => break CollectOutcome::Cancelled,
                batch = rx.recv() => batch,
            };
            let Some(batch) = batch else {
                break CollectOutcome::HorizonElapsed;
            };
            for record in batch.invocations {
                self.audit.push_invocation(record);
            }
            for event in batch.events {
                self.record_reply(event);
            }
            self.publish();

            if let Some(slot) = self.quorum_slot() {
                break CollectOutcome::Confirmed(slot);
            }
            if self.all_declined() {
                break CollectOutcome::AllDeclined;
            }
            if Utc::now() >= self.deadline {
                break CollectOutcome::DeadlineExceeded;
            }
        };
        tracker_cancel.cancel();

        match outcome {
            CollectOutcome::Confirmed(slot) => self.confirm(slot, "acceptance quorum met"),
            CollectOutcome::AllDeclined => self.repropose(),
            CollectOutcome::HorizonElapsed => {
                if self.config.responses.accept_on_deadline {
                    if let Some(slot) = self.best_accepted_slot() {
                        return self.confirm(slot, "horizon elapsed; taking best accepted slot");
                    }
                }
                Err(Interrupt::Failed(FailureReason::NoResponses))
            }
            CollectOutcome::Cancelled => Err(Interrupt::Cancelled),
            CollectOutcome::DeadlineExceeded => {
                Err(Interrupt::Failed(FailureReason::DeadlineExceeded))
            }
        }
    }

    fn confirm(&mut self, slot: CandidateSlot, why: &str) -> Result<(), Interrupt> {
        self.audit
            .push_control("confirming", format!("slot {} - {}: {why}", slot.start, slot.end));
        self.chosen = Some(slot);
        self.transition(SessionState::Confirming);
        Ok(())
    }

    fn record_reply(&mut self, event: ResponseEvent) {
        match event.decision {
            ReplyDecision::Accept => {
                self.accepts
                    .entry(event.slot_start)
                    .or_default()
                    .insert(event.participant);
            }
            ReplyDecision::Decline => {
                self.declines
                    .entry(event.slot_start)
                    .or_default()
                    .insert(event.participant);
            }
            ReplyDecision::NoResponse => {}
        }
    }

    /// The best candidate whose acceptances meet the quorum, if any.
    fn quorum_slot(&self) -> Option<CandidateSlot> {
        let required = self.config.responses.quorum.required(self.responder_count());
        self.candidates
            .iter()
            .find(|c| {
                self.accepts
                    .get(&c.start)
                    .map_or(required == 0, |s| s.len() >= required)
            })
            .cloned()
    }

    fn best_accepted_slot(&self) -> Option<CandidateSlot> {
        self.candidates
            .iter()
            .find(|c| self.accepts.get(&c.start).is_some_and(|s| !s.is_empty()))
            .cloned()
    }

    fn all_declined(&self) -> bool {
        let responders = self.responder_count();
        responders > 0
            && !self.candidates.is_empty()
            && self.candidates.iter().all(|c| {
                self.declines
                    .get(&c.start)
                    .is_some_and(|s| s.len() >= responders)
            })
    }

    fn repropose(&mut self) -> Result<(), Interrupt> {
        if self.reproposal_round >= self.config.scheduling.max_reproposal_cycles {
            return Err(Interrupt::Failed(FailureReason::ProposalsExhausted));
        }
        self.reproposal_round += 1;
        self.excluded_starts
            .extend(self.candidates.iter().map(|c| c.start));
        self.audit.push_control(
            "reproposal",
            format!("all slots declined; starting round {}", self.reproposal_round),
        );
        self.transition(SessionState::Analyzing);
        Ok(())
    }

    async fn create_event(&mut self) -> Result<(), Interrupt> {
        let _ = self.plan_step(SchedulingTool::CreateEvent).await;
        let tool = SchedulingTool::CreateEvent;
        // Confirming is only ever entered through confirm(), which sets the
        // chosen slot first.
        let Some(slot) = self.chosen.clone() else {
            return Err(Interrupt::Failed(FailureReason::ToolFailed {
                tool: tool.name().to_string(),
                kind: "no_confirmed_slot".to_string(),
            }));
        };
        let input = CreateEventInput {
            slot: slot.interval(),
            attendees: self.active_participants(),
            metadata: EventMetadata {
                title: self.request.title.clone(),
                description: self.request.description.clone(),
                organizer: self.request.organizer.email.clone(),
            },
        };
        let payload = encode_input(tool, &input).map_err(|e| self.interrupt_for(tool, e))?;
        let (result, records) =
            invoke_recorded(&self.registry, &self.config.retry, tool, payload).await;
        for record in records {
            self.audit.push_invocation(record);
        }

        match result {
            Ok(output) => {
                let out: CreateEventOutput = self.decode(tool, output)?;
                self.audit
                    .push_control("scheduled", format!("event {}", out.event_id));
                self.event_id = Some(out.event_id);
                self.transition(SessionState::Scheduled);
                Ok(())
            }
            // Someone booked the slot between proposal and confirmation.
            // Exclude it and analyze again on the re-proposal budget.
            Err(err) if err.provider_kind() == Some(ProviderErrorKind::Conflict) => {
                if self.reproposal_round >= self.config.scheduling.max_reproposal_cycles {
                    return Err(Interrupt::Failed(FailureReason::ProposalsExhausted));
                }
                self.reproposal_round += 1;
                self.excluded_starts.push(slot.start);
                self.chosen = None;
                self.audit.push_control(
                    "conflict",
                    format!("slot {} was booked elsewhere; re-analyzing", slot.start),
                );
                self.transition(SessionState::Analyzing);
                Ok(())
            }
            Err(err) => Err(self.interrupt_for(tool, err)),
        }
    }

    fn interrupt_for(&self, tool: SchedulingTool, err: ToolError) -> Interrupt {
        let tool = tool.name().to_string();
        if err.provider_kind() == Some(ProviderErrorKind::Auth) {
            Interrupt::Failed(FailureReason::AuthRejected { tool })
        } else if err.is_retryable() {
            Interrupt::Failed(FailureReason::RetriesExhausted {
                tool,
                kind: err.kind_label().to_string(),
            })
        } else {
            Interrupt::Failed(FailureReason::ToolFailed {
                tool,
                kind: err.kind_label().to_string(),
            })
        }
    }

    fn decode<T: DeserializeOwned>(
        &self,
        tool: SchedulingTool,
        output: Value,
    ) -> Result<T, Interrupt> {
        serde_json::from_value(output).map_err(|e| {
            tracing::error!(session = %self.id, tool = %tool, "malformed tool output: {e}");
            Interrupt::Failed(FailureReason::ToolFailed {
                tool: tool.name().to_string(),
                kind: "malformed_output".to_string(),
            })
        })
    }

    fn bounds(&self) -> TimeInterval {
        TimeInterval::new(self.request.window_start, self.request.window_end)
    }

    fn active_participants(&self) -> Vec<Participant> {
        self.request
            .all_participants()
            .into_iter()
            .filter(|p| !self.dropped.contains(&p.email))
            .cloned()
            .collect()
    }

    /// Participants whose reply we wait for: everyone active except the
    /// organizer, who implicitly accepts their own request.
    fn responder_count(&self) -> usize {
        self.request
            .participants
            .iter()
            .filter(|p| !self.dropped.contains(&p.email))
            .count()
    }

    fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            tracing::error!(
                session = %self.id,
                from = %self.state,
                to = %next,
                "illegal session transition ignored"
            );
            return;
        }
        self.audit
            .push_control("transition", format!("{} -> {next}", self.state));
        self.state = next;
        self.publish();
    }

    fn publish(&self) {
        let _ = self.views.send_replace(self.view());
    }

    fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            state: self.state,
            title: self.request.title.clone(),
            candidates: self.candidates.clone(),
            confirmed_slot: self.chosen.as_ref().map(CandidateSlot::interval),
            event_id: self.event_id.clone(),
            failure: self.failure.clone(),
            reproposal_round: self.reproposal_round,
            relaxation_round: self.relaxation_round,
            dropped_participants: self.dropped.clone(),
            audit: self.audit.records().to_vec(),
            updated_at: Utc::now(),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            state: self.state,
            title: self.request.title.clone(),
            participant_count: self.active_participants().len(),
            duration_minutes: self.request.duration_minutes,
            windows_fetched: self.windows.len(),
            candidates: self.candidates.clone(),
            leading_slot_accepts: self
                .candidates
                .first()
                .and_then(|c| self.accepts.get(&c.start))
                .map_or(0, HashSet::len),
            reproposal_round: self.reproposal_round,
            audit_len: self.audit.len(),
        }
    }
}

fn encode_input<T: Serialize>(tool: SchedulingTool, input: &T) -> Result<Value, ToolError> {
    serde_json::to_value(input)
        .map_err(|e| ToolError::invalid_input(tool.name(), format!("input serialization: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn request() -> MeetingRequest {
        MeetingRequest {
            title: "Planning".to_string(),
            description: None,
            organizer: Participant::new("organizer@example.com"),
            participants: vec![
                Participant::new("busy@example.com"),
                Participant::new("free@example.com"),
            ],
            duration_minutes: 30,
            window_start: at(9, 0),
            window_end: at(17, 0),
            timezone: "UTC".to_string(),
            priority: Default::default(),
        }
    }

    #[test]
    fn relaxation_drops_the_busiest_participant_first() {
        let request = request();
        let windows = vec![
            AvailabilityWindow::free_all_day("organizer@example.com"),
            AvailabilityWindow::new(
                "busy@example.com",
                vec![TimeInterval::new(at(9, 0), at(16, 0))],
            ),
            AvailabilityWindow::new(
                "free@example.com",
                vec![TimeInterval::new(at(9, 0), at(10, 0))],
            ),
        ];

        let first = DropLeastAvailable.next_drop(&request, &windows, &[]);
        assert_eq!(first.as_deref(), Some("busy@example.com"));

        let dropped = vec!["busy@example.com".to_string()];
        let second = DropLeastAvailable.next_drop(&request, &windows, &dropped);
        assert_eq!(second.as_deref(), Some("free@example.com"));

        let all = vec![
            "busy@example.com".to_string(),
            "free@example.com".to_string(),
        ];
        assert_eq!(DropLeastAvailable.next_drop(&request, &windows, &all), None);
    }

    #[test]
    fn relaxation_never_names_the_organizer() {
        let mut request = request();
        request.participants.clear();
        let windows = vec![AvailabilityWindow::new(
            "organizer@example.com",
            vec![TimeInterval::new(at(9, 0), at(17, 0))],
        )];
        assert_eq!(DropLeastAvailable.next_drop(&request, &windows, &[]), None);
    }
}
