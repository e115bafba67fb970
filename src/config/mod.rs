//! Configuration loading for the scheduling orchestrator.
//!
//! Configuration is an immutable value handed to each session at creation.
//! Nothing reads ambient process state mid-session, so two sessions with
//! different effective configs coexist safely.

pub mod config;
pub mod environment;

pub use config::{
    LoggingConfig, PreferencesConfig, QuorumRule, ResponseConfig, SchedulerConfig,
    SchedulingConfig,
};
pub use environment::EnvironmentLoader;
