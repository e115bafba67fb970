//! # schedai
//!
//! A scheduling agent orchestrator: given a meeting request, it fetches
//! participant availability, intersects and scores candidate slots, proposes
//! them, tracks replies, and books the confirmed slot - all as one supervised
//! state machine per session.
//!
//! ## Modules
//!
//! - [`model`] - meeting requests, participants, replies
//! - [`slots`] - pure interval math: windows, intersection, scoring
//! - [`provider`] - collaborator traits (calendar, email, reasoning) and
//!   their error taxonomy
//! - [`tools`] - the tool registry and the five built-in scheduling tools
//! - [`retry`] - bounded retry with exponential backoff and per-call timeouts
//! - [`planner`] - rule-based and reasoning-backed step planning
//! - [`session`] - the state machine, audit trail, and scheduler service
//! - [`tracker`] - background reply polling with deduplication
//! - [`config`] - TOML configuration and environment overrides
//! - [`observability`] - per-session markdown logs
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use schedai::config::SchedulerConfig;
//! use schedai::session::SchedulerService;
//! use schedai::tools::scheduling_registry;
//!
//! let registry = Arc::new(scheduling_registry(calendar, events, email, replies));
//! let service = SchedulerService::new(SchedulerConfig::default(), registry);
//! let id = service.create_session(request).await?;
//! let outcome = service.wait_for_terminal(id).await;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod model;
pub mod observability;
pub mod planner;
pub mod provider;
pub mod retry;
pub mod session;
pub mod slots;
pub mod tools;
pub mod tracker;

pub use config::SchedulerConfig;
pub use model::{MeetingPriority, MeetingRequest, Participant, ReplyDecision};
pub use session::{FailureReason, SchedulerService, SessionState, SessionView};
pub use tools::{scheduling_registry, ToolRegistry};
