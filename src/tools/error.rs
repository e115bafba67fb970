//! Error types for tool dispatch and execution.

use thiserror::Error;

use crate::provider::{ProviderError, ProviderErrorKind};
use crate::retry::Retryable;

/// Errors surfaced by [`ToolRegistry::invoke`](super::ToolRegistry::invoke).
///
/// `UnknownTool`, `InvalidInput`, and `DuplicateTool` are programming-contract
/// errors: never retryable, always fatal to the current invocation.
/// `InsufficientAvailability` is a business outcome the session handles with
/// its relaxation policy. `Failed` wraps a collaborator failure and inherits
/// its retryable classification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    /// The requested tool is not registered.
    #[error("unknown tool: {name}")]
    UnknownTool {
        /// Name of the missing tool.
        name: String,
    },

    /// The payload does not satisfy the tool's input schema.
    #[error("invalid input for {tool}: {message}")]
    InvalidInput {
        /// The tool that rejected the payload.
        tool: String,
        /// What was wrong with it.
        message: String,
    },

    /// A tool with the same name is already registered.
    #[error("tool already registered: {name}")]
    DuplicateTool {
        /// Name of the duplicate tool.
        name: String,
    },

    /// Slot analysis found no candidate for all participants within bounds.
    #[error("no {duration_minutes} minute slot fits all participants within the requested window")]
    InsufficientAvailability {
        /// The duration that could not be placed.
        duration_minutes: u32,
    },

    /// The handler's collaborator failed.
    #[error("tool {tool} failed")]
    Failed {
        /// The tool whose handler failed.
        tool: String,
        /// The underlying collaborator failure.
        #[source]
        source: ProviderError,
    },
}

impl ToolError {
    /// Create an UnknownTool error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a DuplicateTool error.
    pub fn duplicate_tool(name: impl Into<String>) -> Self {
        Self::DuplicateTool { name: name.into() }
    }

    /// Wrap a collaborator failure.
    pub fn failed(tool: impl Into<String>, source: ProviderError) -> Self {
        Self::Failed {
            tool: tool.into(),
            source,
        }
    }

    /// A per-invocation timeout, expressed as a retryable Timeout failure.
    pub fn invocation_timeout(tool: impl Into<String>, timeout_secs: u64) -> Self {
        let tool = tool.into();
        let message = format!("{tool} did not complete within {timeout_secs}s");
        Self::Failed {
            tool,
            source: ProviderError::timeout(message),
        }
    }

    /// The provider failure kind, if this error wraps one.
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            ToolError::Failed { source, .. } => Some(source.kind),
            _ => None,
        }
    }

    /// Stable label for audit records and logs.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ToolError::UnknownTool { .. } => "unknown_tool",
            ToolError::InvalidInput { .. } => "invalid_input",
            ToolError::DuplicateTool { .. } => "duplicate_tool",
            ToolError::InsufficientAvailability { .. } => "insufficient_availability",
            ToolError::Failed { source, .. } => source.kind.label(),
        }
    }
}

impl Retryable for ToolError {
    fn is_retryable(&self) -> bool {
        match self {
            ToolError::Failed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
