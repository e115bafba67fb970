//! The public entry point: session creation, observation, and cancellation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::model::{MeetingRequest, RequestValidationError};
use crate::observability::SessionLogWriter;
use crate::planner::{PlanStrategy, RuleBasedStrategy};
use crate::tools::ToolRegistry;

use super::machine::{DropLeastAvailable, RelaxationStrategy, SessionRunner, SessionView};
use super::state::SessionState;

struct SessionHandle {
    views: watch::Receiver<SessionView>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Runs scheduling sessions against one tool registry and config.
///
/// Each session is one spawned task that owns its state exclusively; the
/// service only holds a watch receiver and a cancellation token per session,
/// so every method is cheap and never blocks on session work.
pub struct SchedulerService {
    config: SchedulerConfig,
    registry: Arc<ToolRegistry>,
    strategy: Arc<dyn PlanStrategy>,
    relaxation: Arc<dyn RelaxationStrategy>,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SchedulerService {
    /// Create a service with the rule-based planner and default relaxation.
    pub fn new(config: SchedulerConfig, registry: Arc<ToolRegistry>) -> Self {
        Self {
            config,
            registry,
            strategy: Arc::new(RuleBasedStrategy),
            relaxation: Arc::new(DropLeastAvailable),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the planning strategy.
    pub fn with_strategy(mut self, strategy: Arc<dyn PlanStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replace the relaxation strategy.
    pub fn with_relaxation(mut self, relaxation: Arc<dyn RelaxationStrategy>) -> Self {
        self.relaxation = relaxation;
        self
    }

    /// Validate the request and start a session for it.
    ///
    /// Returns immediately with the session id; the session runs in its own
    /// task and is observed through [`session_status`](Self::session_status)
    /// or awaited with [`wait_for_terminal`](Self::wait_for_terminal).
    pub async fn create_session(
        &self,
        request: MeetingRequest,
    ) -> Result<Uuid, RequestValidationError> {
        request.validate()?;

        let id = Uuid::new_v4();
        let (tx, rx) = watch::channel(SessionView::initial(id, request.title.clone()));
        let cancel = CancellationToken::new();

        let log = match &self.config.logging.session_log_dir {
            Some(dir) => match SessionLogWriter::new(dir, id) {
                Ok(writer) => Some(writer),
                Err(e) => {
                    tracing::warn!(session = %id, "session log disabled: {e:#}");
                    None
                }
            },
            None => None,
        };

        let runner = SessionRunner::new(
            id,
            request,
            self.config.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.strategy),
            Arc::clone(&self.relaxation),
            cancel.clone(),
            tx,
            log,
        );
        let task = tokio::spawn(runner.run());

        self.sessions.write().await.insert(
            id,
            SessionHandle {
                views: rx,
                cancel,
                task,
            },
        );
        tracing::info!(session = %id, "session created");
        Ok(id)
    }

    /// The latest published view of a session, if it exists.
    pub async fn session_status(&self, id: Uuid) -> Option<SessionView> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).map(|h| h.views.borrow().clone())
    }

    /// Wait until the session reaches a terminal state and return that view.
    ///
    /// Returns `None` for an unknown session id.
    pub async fn wait_for_terminal(&self, id: Uuid) -> Option<SessionView> {
        let mut views = {
            let sessions = self.sessions.read().await;
            sessions.get(&id)?.views.clone()
        };
        loop {
            let view = views.borrow_and_update().clone();
            if view.state.is_terminal() {
                return Some(view);
            }
            // A closed channel means the runner is gone; its final view was
            // published before the sender dropped.
            if views.changed().await.is_err() {
                return Some(views.borrow().clone());
            }
        }
    }

    /// Request cancellation of a session.
    ///
    /// Returns whether the session exists and was still running. The session
    /// reaches `Cancelled` asynchronously; no tool is invoked on its behalf
    /// after the runner observes the token.
    pub async fn cancel_session(&self, id: Uuid) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(&id) {
            Some(handle) if !handle.views.borrow().state.is_terminal() => {
                handle.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// All known sessions and their current states.
    pub async fn list_sessions(&self) -> Vec<(Uuid, SessionState)> {
        let sessions = self.sessions.read().await;
        let mut out: Vec<(Uuid, SessionState)> = sessions
            .iter()
            .map(|(id, h)| (*id, h.views.borrow().state))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    /// Drop a terminal session's handle, releasing its resources.
    ///
    /// Returns the final view, or `None` when the session is unknown or has
    /// not finished.
    pub async fn remove_session(&self, id: Uuid) -> Option<SessionView> {
        let mut sessions = self.sessions.write().await;
        let terminal = sessions
            .get(&id)
            .is_some_and(|h| h.views.borrow().state.is_terminal());
        if !terminal {
            return None;
        }
        sessions.remove(&id).map(|handle| {
            handle.task.abort();
            let view = handle.views.borrow().clone();
            view
        })
    }
}
