//! Typed access to tool call arguments.

use super::types::ToolArgs;
use crate::error::MailgateError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: ToolArgs,
}

impl ToolArguments {
    pub fn new(values: ToolArgs) -> Self {
        Self { values }
    }

    /// Build from any JSON value; non-objects yield an error.
    pub fn from_value(value: serde_json::Value) -> Result<Self, MailgateError> {
        match value {
            serde_json::Value::Object(values) => Ok(Self { values }),
            other => Err(MailgateError::InvalidArgument(format!(
                "tool arguments must be a JSON object, got {other}"
            ))),
        }
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, MailgateError> {
        self.values
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                MailgateError::InvalidArgument(format!("Missing string argument: {key}"))
            })
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Get a boolean argument.
    pub fn get_bool(&self, key: &str) -> Result<bool, MailgateError> {
        self.values
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| {
                MailgateError::InvalidArgument(format!("Missing boolean argument: {key}"))
            })
    }
}

impl From<ToolArgs> for ToolArguments {
    fn from(values: ToolArgs) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_rejects_non_objects() {
        let err = ToolArguments::from_value(json!(["a"])).unwrap_err();
        assert!(matches!(err, MailgateError::InvalidArgument(_)));
    }

    #[test]
    fn typed_getters_read_values() {
        let args = ToolArguments::from_value(json!({"to": "a@x.com", "urgent": true})).unwrap();
        assert_eq!(args.get_str("to").unwrap(), "a@x.com");
        assert!(args.get_bool("urgent").unwrap());
        assert_eq!(args.get_str_opt("cc"), None);
        assert!(args.get_str("cc").is_err());
    }
}
