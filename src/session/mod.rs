//! Scheduling sessions: the state machine, its audit trail, and the service
//! that runs them.
//!
//! A session moves `intake -> fetching_availability -> analyzing -> proposed
//! -> awaiting_responses -> confirming -> scheduled`, with bounded loops back
//! to `analyzing` for all-declined proposals and booking conflicts, and with
//! `failed`/`cancelled` reachable from any active state. The runner task owns
//! all session data; callers observe through published [`SessionView`]s.

pub mod audit;
pub mod machine;
pub mod service;
pub mod state;

mod invoke;

pub(crate) use invoke::invoke_recorded;

pub use audit::{AuditLog, AuditRecord, ControlRecord, InvocationOutcome, ToolInvocation};
pub use machine::{DropLeastAvailable, RelaxationStrategy, SessionView};
pub use service::SchedulerService;
pub use state::{FailureReason, SessionState};
