//! Validate tool call arguments against JSON Schema.

use super::types::ToolArgs;

/// Every way a set of arguments falls short of a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentReport {
    /// Required parameters that were not supplied, in schema order.
    pub missing: Vec<String>,
    /// Supplied keys the schema does not declare, in argument order.
    pub unknown: Vec<String>,
    /// Supplied keys whose value has the wrong JSON type.
    pub mistyped: Vec<String>,
}

impl ArgumentReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unknown.is_empty() && self.mistyped.is_empty()
    }
}

/// Check a complete argument map against a JSON Schema.
///
/// Unlike [`validate_arguments`], this is strict about undeclared keys: when
/// the schema lists `properties`, any other key is reported as unknown.
pub fn check_arguments(args: &ToolArgs, schema: &serde_json::Value) -> ArgumentReport {
    let mut report = ArgumentReport::default();

    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        report.missing = required
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|name| !args.contains_key(*name))
            .map(str::to_string)
            .collect();
    }

    if let Some(properties) = schema.get("properties").and_then(|v| v.as_object()) {
        for (key, value) in args {
            match properties.get(key) {
                None => report.unknown.push(key.clone()),
                Some(prop_schema) => {
                    let expected = prop_schema.get("type").and_then(|v| v.as_str());
                    if let Some(expected) = expected {
                        if !value_matches_type(value, expected) {
                            report.mistyped.push(key.clone());
                        }
                    }
                }
            }
        }
    }

    report
}

/// Pre-execution check: the first problem with `args`, if any.
///
/// Lenient where [`check_arguments`] is strict: undeclared keys pass.
pub fn validate_arguments(
    args: &serde_json::Value,
    schema: &serde_json::Value,
) -> Result<(), String> {
    let Some(map) = args.as_object() else {
        if schema.get("type").and_then(|v| v.as_str()) == Some("object") {
            return Err(format!("expected object arguments, got {}", json_type_name(args)));
        }
        return Ok(());
    };

    let report = check_arguments(map, schema);
    if let Some(name) = report.missing.first() {
        return Err(format!("missing required field '{name}'"));
    }
    match report.mistyped.first() {
        Some(name) => {
            let expected = schema
                .get("properties")
                .and_then(|props| props.get(name))
                .and_then(|prop| prop.get("type"))
                .and_then(|v| v.as_str())
                .unwrap_or("?");
            Err(format!(
                "field '{name}' expected type '{expected}', got {}",
                json_type_name(&map[name.as_str()])
            ))
        }
        None => Ok(()),
    }
}

fn value_matches_type(value: &serde_json::Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn email_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "recipient": { "type": "string" },
                "subject": { "type": "string" },
                "body": { "type": "string" },
            },
            "required": ["recipient", "subject", "body"],
        })
    }

    fn args(value: serde_json::Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn check_reports_all_missing_fields_in_schema_order() {
        let report = check_arguments(&args(json!({ "recipient": "b@y.com" })), &email_schema());

        assert_eq!(report.missing, vec!["subject", "body"]);
        assert!(report.unknown.is_empty());
        assert!(!report.is_clean());
    }

    #[test]
    fn check_reports_undeclared_keys_as_unknown() {
        let report = check_arguments(
            &args(json!({ "recipient": "b@y.com", "subject": "Hi", "body": "x", "cc": "c@z.com" })),
            &email_schema(),
        );

        assert_eq!(report.unknown, vec!["cc"]);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn check_reports_wrong_types() {
        let report = check_arguments(
            &args(json!({ "recipient": "b@y.com", "subject": 7, "body": "x" })),
            &email_schema(),
        );

        assert_eq!(report.mistyped, vec!["subject"]);
    }

    #[test]
    fn check_accepts_complete_arguments() {
        let report = check_arguments(
            &args(json!({ "recipient": "b@y.com", "subject": "Hi", "body": "Updated" })),
            &email_schema(),
        );

        assert!(report.is_clean());
    }

    #[test]
    fn check_without_properties_does_not_flag_unknown() {
        let report = check_arguments(&args(json!({ "anything": 1 })), &json!({}));
        assert!(report.is_clean());
    }

    #[test]
    fn rejects_non_object_args_when_schema_expects_object() {
        let schema = json!({ "type": "object", "properties": {}, "required": [] });
        let result = validate_arguments(&json!("not an object"), &schema);

        assert!(result.unwrap_err().contains("expected object"));
    }

    #[test]
    fn rejects_when_any_required_field_is_absent() {
        let result = validate_arguments(&json!({ "recipient": "a@x.com" }), &email_schema());

        assert!(result
            .unwrap_err()
            .contains("missing required field 'subject'"));
    }

    #[test]
    fn rejects_field_with_wrong_type() {
        let result = validate_arguments(
            &json!({ "recipient": "a@x.com", "subject": 1, "body": "b" }),
            &email_schema(),
        );

        let err = result.unwrap_err();
        assert!(err.contains("field 'subject'"));
        assert!(err.contains("expected type 'string'"));
    }

    #[test]
    fn validate_accepts_extra_fields_not_in_schema_properties() {
        let result = validate_arguments(
            &json!({ "recipient": "a@x.com", "subject": "s", "body": "b", "extra": true }),
            &email_schema(),
        );

        assert!(result.is_ok());
    }
}
