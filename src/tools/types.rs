//! Tool parameter schemas.

use serde::{Deserialize, Serialize};

/// Arguments of a tool call: parameter name to JSON value, in declaration order.
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

/// JSON Schema-based parameter definition for a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    /// JSON Schema object describing the parameters.
    pub schema: serde_json::Value,
}

impl ToolParameters {
    /// Create from a raw JSON Schema value.
    pub fn from_schema(schema: serde_json::Value) -> Self {
        Self { schema }
    }

    /// Create an empty parameter schema (no parameters).
    pub fn empty() -> Self {
        Self {
            schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": [],
            }),
        }
    }

    /// Builder: create an object schema with properties.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder {
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }

    /// Declared parameter names, in declaration order.
    pub fn property_names(&self) -> Vec<&str> {
        self.schema
            .get("properties")
            .and_then(|v| v.as_object())
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Names of the parameters a call must supply.
    pub fn required_names(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(|v| v.as_array())
            .map(|names| names.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    /// Description of a single parameter, if declared.
    pub fn describe(&self, name: &str) -> Option<&str> {
        self.schema
            .get("properties")?
            .get(name)?
            .get("description")?
            .as_str()
    }
}

/// Builder for constructing tool parameter schemas.
pub struct ParameterBuilder {
    properties: serde_json::Map<String, serde_json::Value>,
    required: Vec<String>,
}

impl ParameterBuilder {
    /// Add a string property.
    pub fn string(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.property(name, "string", description, required)
    }

    /// Add a boolean property.
    pub fn boolean(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.property(name, "boolean", description, required)
    }

    fn property(
        mut self,
        name: impl Into<String>,
        json_type: &str,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            serde_json::json!({
                "type": json_type,
                "description": description.into(),
            }),
        );
        if required {
            self.required.push(name);
        }
        self
    }

    /// Build into ToolParameters.
    pub fn build(self) -> ToolParameters {
        ToolParameters {
            schema: serde_json::json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_declaration_order() {
        let params = ToolParameters::object()
            .string("recipient", "Email address", true)
            .string("subject", "Subject line", true)
            .boolean("urgent", "Flag as urgent", false)
            .build();

        assert_eq!(params.property_names(), vec!["recipient", "subject", "urgent"]);
        assert_eq!(params.required_names(), vec!["recipient", "subject"]);
        assert_eq!(params.describe("subject"), Some("Subject line"));
        assert_eq!(params.describe("cc"), None);
    }

    #[test]
    fn empty_schema_has_no_names() {
        let params = ToolParameters::empty();
        assert!(params.property_names().is_empty());
        assert!(params.required_names().is_empty());
    }
}
