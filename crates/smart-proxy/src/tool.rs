use serde::Serialize;
use serde_json::Value;

/// A single parameter described in a tool's input schema, used only to
/// derive `parameterDescriptions` for the lexical index and canonical
/// embedding text. The orchestrator never interprets the schema itself.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    /// Parameter name, as it appears in the JSON schema's `properties`.
    pub name: String,
    /// Human-readable description, if the schema carries one.
    pub description: Option<String>,
}

/// Post-transform descriptor for a single downstream tool, as handed to
/// [`crate::Orchestrator::bind`].
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Owning server name, e.g. `"weather"`.
    pub server_name: String,
    /// Post-transform tool name, e.g. `"get_forecast"`.
    pub original_name: String,
    /// Post-transform human description.
    pub description: String,
    /// JSON schema for the tool's arguments.
    pub input_schema: Value,
    /// Parameters extracted from `input_schema`, used for indexing only.
    pub parameters: Vec<ParameterDescriptor>,
    /// Stable identifier assigned by the external catalogue store; the sole
    /// key joining this entry to any persisted embedding row.
    pub tool_uuid: uuid::Uuid,
}

impl ToolDescriptor {
    /// `serverName::originalName`, the in-memory tool table's key.
    pub fn unique_id(&self) -> String {
        format!("{}::{}", self.server_name, self.original_name)
    }

    /// Parameter descriptions concatenated newline-joined, or `"none"` if
    /// there are none or none carry a description.
    pub fn parameter_descriptions(&self) -> String {
        let joined = self
            .parameters
            .iter()
            .filter_map(|p| p.description.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        if joined.is_empty() { "none".to_string() } else { joined }
    }
}

/// A bound tool: the descriptor plus the handle of the connection it came
/// from. Stored in the orchestrator's in-memory tool table.
#[derive(Debug, Clone)]
pub struct BoundTool {
    /// The descriptor as supplied at bind time.
    pub descriptor: ToolDescriptor,
    /// Opaque handle resolved through the external connection manager.
    pub connection: crate::downstream::ConnectionHandle,
}

/// A single entry in a `discover` response, matching the historical
/// response shape (no `score` field — that's stripped before encoding).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDescriptorView {
    /// The owning server name; `execute` takes this as `toolId`.
    pub tool_id: String,
    /// The tool's post-transform method name.
    pub method: String,
    /// The tool's post-transform description.
    pub description: String,
    /// The tool's JSON input schema.
    pub input_schema: Value,
}

impl From<&BoundTool> for ToolDescriptorView {
    fn from(tool: &BoundTool) -> Self {
        Self {
            tool_id: tool.descriptor.server_name.clone(),
            method: tool.descriptor.original_name.clone(),
            description: tool.descriptor.description.clone(),
            input_schema: tool.descriptor.input_schema.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(description: &str, params: Vec<ParameterDescriptor>) -> ToolDescriptor {
        ToolDescriptor {
            server_name: "weather".to_string(),
            original_name: "get_forecast".to_string(),
            description: description.to_string(),
            input_schema: serde_json::json!({"type": "object"}),
            parameters: params,
            tool_uuid: uuid::Uuid::nil(),
        }
    }

    #[test]
    fn unique_id_joins_server_and_method() {
        let tool = descriptor("Returns the forecast for a city.", vec![]);
        assert_eq!(tool.unique_id(), "weather::get_forecast");
    }

    #[test]
    fn parameter_descriptions_default_to_none() {
        let tool = descriptor("x", vec![]);
        assert_eq!(tool.parameter_descriptions(), "none");
    }

    #[test]
    fn parameter_descriptions_join_with_newline() {
        let tool = descriptor(
            "x",
            vec![
                ParameterDescriptor {
                    name: "city".to_string(),
                    description: Some("City name".to_string()),
                },
                ParameterDescriptor {
                    name: "days".to_string(),
                    description: Some("Number of days".to_string()),
                },
            ],
        );

        assert_eq!(tool.parameter_descriptions(), "City name\nNumber of days");
    }

    #[test]
    fn parameters_without_descriptions_are_skipped() {
        let tool = descriptor(
            "x",
            vec![ParameterDescriptor {
                name: "city".to_string(),
                description: None,
            }],
        );

        assert_eq!(tool.parameter_descriptions(), "none");
    }
}
