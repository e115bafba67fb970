//! The failure taxonomy shared by every collaborator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::Retryable;

/// Classification of a collaborator failure.
///
/// The kind decides the session's reaction: `RateLimited` and `Timeout` are
/// retried under the policy, `Auth` fails the session immediately, `Conflict`
/// sends a confirmed slot back to analysis, and the rest fail the current
/// invocation without retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Credentials rejected or expired.
    Auth,
    /// The requested resource does not exist.
    NotFound,
    /// The collaborator asked us to slow down.
    RateLimited,
    /// The collaborator did not answer in time.
    Timeout,
    /// The operation conflicts with current state, e.g. the slot is taken.
    Conflict,
    /// Anything the collaborator could not classify.
    Unknown,
}

impl ProviderErrorKind {
    /// Whether a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderErrorKind::RateLimited | ProviderErrorKind::Timeout)
    }

    /// Stable label for audit records and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderErrorKind::Auth => "auth",
            ProviderErrorKind::NotFound => "not_found",
            ProviderErrorKind::RateLimited => "rate_limited",
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Conflict => "conflict",
            ProviderErrorKind::Unknown => "unknown",
        }
    }
}

/// A collaborator failure with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{} error: {message}", kind.label())]
pub struct ProviderError {
    /// What class of failure this is.
    pub kind: ProviderErrorKind,
    /// Human-readable detail from the collaborator.
    pub message: String,
}

impl ProviderError {
    /// A failure of the given kind.
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// An authentication failure. Never retried.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Auth, message)
    }

    /// A missing-resource failure.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message)
    }

    /// A rate-limit rejection. Retried with backoff.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message)
    }

    /// A timeout. Retried with backoff.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    /// A state conflict, e.g. the slot was booked elsewhere.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Conflict, message)
    }

    /// An unclassified failure.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unknown, message)
    }
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limits_and_timeouts_are_retryable() {
        assert!(ProviderError::rate_limited("429").is_retryable());
        assert!(ProviderError::timeout("deadline").is_retryable());
        assert!(!ProviderError::auth("expired token").is_retryable());
        assert!(!ProviderError::not_found("no such calendar").is_retryable());
        assert!(!ProviderError::conflict("slot taken").is_retryable());
        assert!(!ProviderError::unknown("???").is_retryable());
    }

    #[test]
    fn display_carries_the_kind_label() {
        let err = ProviderError::rate_limited("too many requests");
        assert_eq!(err.to_string(), "rate_limited error: too many requests");
    }
}
