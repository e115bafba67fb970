//! The dispatch table mapping tool names to handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::definition::ToolDefinition;
use super::error::ToolError;

/// A callable capability with a declared input/output contract.
///
/// Handlers are the only place side effects happen; the registry and
/// everything above it treat them as opaque.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The tool's declared contract.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool. The payload has already passed the registry's
    /// required-field check; handlers still own full deserialization.
    async fn invoke(&self, input: Value) -> Result<Value, ToolError>;
}

/// Maps tool names to handlers and dispatches invocations.
///
/// Holds only `Arc`s and configuration, so one registry is shared freely
/// across concurrent sessions without synchronization. The registry performs
/// no retries; the retry policy wraps it.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its declared name.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<(), ToolError> {
        let name = handler.definition().name;
        if self.tools.contains_key(&name) {
            return Err(ToolError::duplicate_tool(name));
        }
        self.tools.insert(name, handler);
        Ok(())
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// The definition of one registered tool.
    pub fn definition(&self, name: &str) -> Option<ToolDefinition> {
        self.tools.get(name).map(|h| h.definition())
    }

    /// All declared definitions, sorted by name for stable output.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|h| h.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// All definitions as schema documents for a reasoning provider.
    pub fn schemas(&self) -> Vec<Value> {
        self.definitions().iter().map(|d| d.schema()).collect()
    }

    /// Dispatch one invocation.
    ///
    /// Fails with [`ToolError::UnknownTool`] when no handler is registered
    /// under `name`, [`ToolError::InvalidInput`] when the payload is not an
    /// object or misses a required field, and otherwise propagates the
    /// handler's own failure.
    pub async fn invoke(&self, name: &str, input: Value) -> Result<Value, ToolError> {
        let handler = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::unknown_tool(name))?;

        let definition = handler.definition();
        let object = input
            .as_object()
            .ok_or_else(|| ToolError::invalid_input(name, "input payload must be a JSON object"))?;
        for field in definition.required_fields() {
            if !object.contains_key(field) {
                return Err(ToolError::invalid_input(
                    name,
                    format!("missing required field: {field}"),
                ));
            }
        }

        handler.invoke(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(
                "echo",
                "Echo the message back",
                json!({
                    "type": "object",
                    "properties": { "message": { "type": "string" } },
                    "required": ["message"]
                }),
            )
        }

        async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
            Ok(json!({ "echoed": input["message"] }))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoHandler)).unwrap();
        registry
    }

    #[tokio::test]
    async fn dispatches_to_registered_handler() {
        let out = registry()
            .invoke("echo", json!({ "message": "hi" }))
            .await
            .unwrap();
        assert_eq!(out, json!({ "echoed": "hi" }));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let err = registry().invoke("nope", json!({})).await.unwrap_err();
        assert_eq!(
            err,
            ToolError::UnknownTool {
                name: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_required_field_is_rejected() {
        let err = registry().invoke("echo", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn non_object_payload_is_rejected() {
        let err = registry().invoke("echo", json!(42)).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = registry();
        let err = registry.register(Arc::new(EchoHandler)).unwrap_err();
        assert_eq!(
            err,
            ToolError::DuplicateTool {
                name: "echo".to_string()
            }
        );
    }
}
