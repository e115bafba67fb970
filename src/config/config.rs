//! TOML configuration for sessions, retries, responses, and preferences.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::MeetingPriority;
use crate::retry::RetryPolicy;
use crate::slots::SlotPreferences;

/// Top-level configuration, one value per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Slot analysis and session lifecycle knobs.
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    /// Retry and timeout policy applied to every tool and reasoning call.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Reply tracking and acceptance quorum policy.
    #[serde(default)]
    pub responses: ResponseConfig,
    /// Scoring preferences.
    #[serde(default)]
    pub preferences: PreferencesConfig,
    /// Session log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SchedulerConfig {
    /// Load configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Invalid scheduler configuration")
    }
}

/// Slot analysis and session lifecycle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Candidate start alignment, minutes.
    #[serde(default = "default_granularity_minutes")]
    pub granularity_minutes: u32,
    /// Top-K candidates proposed per cycle.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// How many times all-declined candidates trigger re-analysis before the
    /// session fails.
    #[serde(default = "default_max_reproposal_cycles")]
    pub max_reproposal_cycles: u32,
    /// How many constraint relaxations to try when no common slot exists.
    #[serde(default = "default_max_relaxation_rounds")]
    pub max_relaxation_rounds: u32,
    /// Sessions not scheduled within this many hours fail.
    #[serde(default = "default_session_deadline_hours")]
    pub session_deadline_hours: u64,
    /// Minimum number of participants whose availability must arrive to
    /// proceed in degraded mode. Absent means all participants are required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_quorum: Option<usize>,
}

fn default_granularity_minutes() -> u32 {
    15
}

fn default_max_suggestions() -> usize {
    3
}

fn default_max_reproposal_cycles() -> u32 {
    2
}

fn default_max_relaxation_rounds() -> u32 {
    2
}

fn default_session_deadline_hours() -> u64 {
    24
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            granularity_minutes: default_granularity_minutes(),
            max_suggestions: default_max_suggestions(),
            max_reproposal_cycles: default_max_reproposal_cycles(),
            max_relaxation_rounds: default_max_relaxation_rounds(),
            session_deadline_hours: default_session_deadline_hours(),
            availability_quorum: None,
        }
    }
}

impl SchedulingConfig {
    /// The session deadline as a [`Duration`].
    pub fn session_deadline(&self) -> Duration {
        Duration::from_secs(self.session_deadline_hours * 3600)
    }
}

/// How many acceptances confirm a slot.
///
/// The original service never pinned this down, so it is explicit
/// configuration rather than assumed unanimity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// Every participant must accept.
    All,
    /// At least this many participants must accept.
    AtLeast(usize),
}

impl QuorumRule {
    /// The number of accepts required for `participant_count` attendees.
    pub fn required(&self, participant_count: usize) -> usize {
        match self {
            QuorumRule::All => participant_count,
            QuorumRule::AtLeast(n) => (*n).min(participant_count).max(1),
        }
    }
}

/// Reply tracking and confirmation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Accepts required to confirm a slot.
    #[serde(default = "default_quorum")]
    pub quorum: QuorumRule,
    /// When the polling horizon elapses with at least one accept, confirm
    /// the best accepted slot instead of failing.
    #[serde(default = "default_accept_on_deadline")]
    pub accept_on_deadline: bool,
    /// Seconds between reply polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Seconds after which non-repliers are treated as no-response.
    #[serde(default = "default_poll_horizon_secs")]
    pub poll_horizon_secs: u64,
}

fn default_quorum() -> QuorumRule {
    QuorumRule::All
}

fn default_accept_on_deadline() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_poll_horizon_secs() -> u64 {
    86_400
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            quorum: default_quorum(),
            accept_on_deadline: default_accept_on_deadline(),
            poll_interval_secs: default_poll_interval_secs(),
            poll_horizon_secs: default_poll_horizon_secs(),
        }
    }
}

impl ResponseConfig {
    /// The poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// The polling horizon as a [`Duration`].
    pub fn poll_horizon(&self) -> Duration {
        Duration::from_secs(self.poll_horizon_secs)
    }
}

/// Scoring preferences shared by all sessions under this config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// First working hour (0-23).
    #[serde(default = "default_work_start_hour")]
    pub work_start_hour: u32,
    /// Last working hour (0-23, exclusive).
    #[serde(default = "default_work_end_hour")]
    pub work_end_hour: u32,
    /// Desired clearance around adjacent events, minutes.
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: u32,
    /// Points subtracted per hour of lateness within the window.
    #[serde(default = "default_earliness_weight")]
    pub earliness_weight: f64,
}

fn default_work_start_hour() -> u32 {
    9
}

fn default_work_end_hour() -> u32 {
    17
}

fn default_buffer_minutes() -> u32 {
    15
}

fn default_earliness_weight() -> f64 {
    1.0
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            work_start_hour: default_work_start_hour(),
            work_end_hour: default_work_end_hour(),
            buffer_minutes: default_buffer_minutes(),
            earliness_weight: default_earliness_weight(),
        }
    }
}

impl PreferencesConfig {
    /// Combine the configured preferences with a request's priority.
    pub fn slot_preferences(&self, priority: MeetingPriority) -> SlotPreferences {
        SlotPreferences {
            work_start_hour: self.work_start_hour,
            work_end_hour: self.work_end_hour,
            buffer_minutes: self.buffer_minutes,
            earliness_weight: self.earliness_weight,
            priority,
        }
    }
}

/// Session log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for per-session markdown logs. Absent disables file logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_log_dir: Option<PathBuf>,
    /// Log level hint for the embedding application.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            session_log_dir: None,
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SchedulerConfig::default();
        assert_eq!(config.scheduling.granularity_minutes, 15);
        assert_eq!(config.scheduling.max_suggestions, 3);
        assert_eq!(config.scheduling.session_deadline_hours, 24);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.responses.quorum, QuorumRule::All);
        assert_eq!(config.responses.poll_interval_secs, 60);
        assert_eq!(config.preferences.work_start_hour, 9);
        assert_eq!(config.preferences.work_end_hour, 17);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            [scheduling]
            max_suggestions = 5
            availability_quorum = 2

            [responses]
            quorum = { at_least = 2 }
            poll_interval_secs = 30

            [retry]
            max_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduling.max_suggestions, 5);
        assert_eq!(config.scheduling.availability_quorum, Some(2));
        assert_eq!(config.scheduling.granularity_minutes, 15);
        assert_eq!(config.responses.quorum, QuorumRule::AtLeast(2));
        assert_eq!(config.responses.poll_interval_secs, 30);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_backoff_ms, 200);
    }

    #[test]
    fn quorum_all_parses_from_string() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            [responses]
            quorum = "all"
            "#,
        )
        .unwrap();
        assert_eq!(config.responses.quorum, QuorumRule::All);
    }

    #[test]
    fn quorum_required_counts() {
        assert_eq!(QuorumRule::All.required(3), 3);
        assert_eq!(QuorumRule::AtLeast(2).required(3), 2);
        // Clamped to the attendee count and to at least one.
        assert_eq!(QuorumRule::AtLeast(9).required(3), 3);
        assert_eq!(QuorumRule::AtLeast(0).required(3), 1);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scheduler.toml");
        std::fs::write(&path, "[scheduling]\ngranularity_minutes = 30\n").unwrap();
        let config = SchedulerConfig::from_path(&path).unwrap();
        assert_eq!(config.scheduling.granularity_minutes, 30);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(SchedulerConfig::from_toml_str("scheduling = 7").is_err());
    }
}
