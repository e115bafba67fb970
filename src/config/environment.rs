//! Environment variable loading and overrides.
//!
//! Only host-level knobs live here: where the config file is and where
//! session logs go. Collaborator credentials are the providers' own concern.

use std::env;
use std::path::{Path, PathBuf};

use super::config::SchedulerConfig;

/// Loads environment variables from a .env file and the system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    #[allow(dead_code)]
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to a .env file. Only loaded when explicitly
    ///   provided, so unit tests never pick up a repository .env by accident.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    tracing::warn!("failed to load .env file {}: {e}", path.display());
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// Path to the scheduler TOML config, from `SCHEDAI_CONFIG`.
    pub fn config_path(&self) -> Option<PathBuf> {
        env::var("SCHEDAI_CONFIG").ok().map(PathBuf::from)
    }

    /// Session log directory override, from `SCHEDAI_LOG_DIR`.
    pub fn session_log_dir(&self) -> Option<PathBuf> {
        env::var("SCHEDAI_LOG_DIR").ok().map(PathBuf::from)
    }

    /// Apply environment overrides on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut SchedulerConfig) {
        if let Some(dir) = self.session_log_dir() {
            config.logging.session_log_dir = Some(dir);
        }
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
