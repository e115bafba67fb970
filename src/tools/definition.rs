//! Tool definition: name, description, and input schema.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Declared contract of one registered tool.
///
/// `parameters` is a JSON Schema object; its `required` list is enforced by
/// the registry before a handler ever sees the payload, and the full schema
/// is what a reasoning provider is shown when asked to pick a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique registry name.
    pub name: String,
    /// What the tool does, phrased for reasoning-provider consumption.
    pub description: String,
    /// JSON Schema for the input payload.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// The schema's `required` property names.
    pub fn required_fields(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// The definition as a single schema document offered to reasoning
    /// providers.
    pub fn schema(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_extracted() {
        let def = ToolDefinition::new(
            "create_event",
            "Create a calendar event",
            json!({
                "type": "object",
                "properties": {
                    "slot": { "type": "object" },
                    "attendees": { "type": "array" }
                },
                "required": ["slot", "attendees"]
            }),
        );
        assert_eq!(def.required_fields(), vec!["slot", "attendees"]);
    }

    #[test]
    fn missing_required_list_means_no_requirements() {
        let def = ToolDefinition::new("ping", "Liveness check", json!({ "type": "object" }));
        assert!(def.required_fields().is_empty());
    }

    #[test]
    fn schema_embeds_name_and_parameters() {
        let def = ToolDefinition::new("ping", "Liveness check", json!({ "type": "object" }));
        let schema = def.schema();
        assert_eq!(schema["name"], "ping");
        assert_eq!(schema["parameters"]["type"], "object");
    }
}
