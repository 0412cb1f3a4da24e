use crate::{EventError, EventResult};
use serde_json::Value;
use std::collections::HashMap;

/// A schema compiled from a JSON Schema document.
///
/// Compilation happens once at registration; validation on the publish
/// path only walks the precomputed checks. The supported subset covers
/// root/property types, required fields, string formats and length
/// bounds, numeric ranges, enums, and array item types.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    name: String,
    document: Value,
    root_type: Option<JsonType>,
    required: Vec<String>,
    properties: HashMap<String, PropertyChecks>,
}

/// JSON value types recognized by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl JsonType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(JsonType::String),
            "number" => Some(JsonType::Number),
            "integer" => Some(JsonType::Integer),
            "boolean" => Some(JsonType::Boolean),
            "array" => Some(JsonType::Array),
            "object" => Some(JsonType::Object),
            "null" => Some(JsonType::Null),
            _ => None,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Number => value.is_number(),
            JsonType::Integer => value.is_i64() || value.is_u64(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Array => value.is_array(),
            JsonType::Object => value.is_object(),
            JsonType::Null => value.is_null(),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Null => "null",
        }
    }
}

/// Precompiled checks for a single property.
#[derive(Debug, Clone, Default)]
struct PropertyChecks {
    expected_type: Option<JsonType>,
    format: Option<String>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    allowed_values: Option<Vec<Value>>,
    item_type: Option<JsonType>,
}

impl PropertyChecks {
    fn compile(schema: &Value) -> Self {
        Self {
            expected_type: schema
                .get("type")
                .and_then(|t| t.as_str())
                .and_then(JsonType::parse),
            format: schema
                .get("format")
                .and_then(|f| f.as_str())
                .map(str::to_string),
            minimum: schema.get("minimum").and_then(|m| m.as_f64()),
            maximum: schema.get("maximum").and_then(|m| m.as_f64()),
            min_length: schema
                .get("minLength")
                .and_then(|m| m.as_u64())
                .map(|m| m as usize),
            max_length: schema
                .get("maxLength")
                .and_then(|m| m.as_u64())
                .map(|m| m as usize),
            allowed_values: schema
                .get("enum")
                .and_then(|e| e.as_array())
                .map(|v| v.to_vec()),
            item_type: schema
                .get("items")
                .and_then(|i| i.get("type"))
                .and_then(|t| t.as_str())
                .and_then(JsonType::parse),
        }
    }
}

impl CompiledSchema {
    /// Compiles a JSON Schema document.
    ///
    /// Fails when the document is not an object or declares `required`
    /// with non-string entries; these are the malformed-schema cases a
    /// startup registration must surface instead of swallowing.
    pub fn compile(name: impl Into<String>, document: Value) -> EventResult<Self> {
        let name = name.into();
        let obj = document.as_object().ok_or_else(|| EventError::SchemaCompile {
            name: name.clone(),
            reason: "schema document must be a JSON object".to_string(),
        })?;

        let root_type = obj
            .get("type")
            .and_then(|t| t.as_str())
            .and_then(JsonType::parse);

        let mut required = Vec::new();
        if let Some(req) = obj.get("required") {
            let entries = req.as_array().ok_or_else(|| EventError::SchemaCompile {
                name: name.clone(),
                reason: "'required' must be an array".to_string(),
            })?;
            for entry in entries {
                let field = entry.as_str().ok_or_else(|| EventError::SchemaCompile {
                    name: name.clone(),
                    reason: "'required' entries must be strings".to_string(),
                })?;
                required.push(field.to_string());
            }
        }

        let mut properties = HashMap::new();
        if let Some(props) = obj.get("properties").and_then(|p| p.as_object()) {
            for (field, field_schema) in props {
                properties.insert(field.clone(), PropertyChecks::compile(field_schema));
            }
        }

        Ok(Self {
            name,
            document,
            root_type,
            required,
            properties,
        })
    }

    /// The catalog name this schema is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original JSON Schema document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Validates a payload against the compiled checks.
    pub fn validate(&self, payload: &Value) -> ValidationOutcome {
        let mut issues = Vec::new();

        if let Some(root_type) = self.root_type {
            if !root_type.accepts(payload) {
                issues.push(
                    ValidationIssue::new("$", "Type mismatch")
                        .with_expected(root_type.as_str())
                        .with_actual(json_type_name(payload)),
                );
                return ValidationOutcome::invalid(issues);
            }
        }

        if let Some(obj) = payload.as_object() {
            for field in &self.required {
                if !obj.contains_key(field) {
                    issues.push(ValidationIssue::new(
                        field,
                        format!("Required field '{field}' is missing"),
                    ));
                }
            }

            for (field, checks) in &self.properties {
                if let Some(value) = obj.get(field) {
                    self.check_property(field, value, checks, &mut issues);
                }
            }
        } else if !self.required.is_empty() {
            issues.push(ValidationIssue::new("$", "Payload must be an object"));
        }

        if issues.is_empty() {
            ValidationOutcome::valid()
        } else {
            ValidationOutcome::invalid(issues)
        }
    }

    fn check_property(
        &self,
        field: &str,
        value: &Value,
        checks: &PropertyChecks,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if let Some(expected) = checks.expected_type {
            if !expected.accepts(value) {
                issues.push(
                    ValidationIssue::new(field, "Type mismatch")
                        .with_expected(expected.as_str())
                        .with_actual(json_type_name(value)),
                );
                return;
            }
        }

        if let Some(format) = &checks.format {
            if let Some(s) = value.as_str() {
                if !format_matches(s, format) {
                    issues.push(ValidationIssue::new(
                        field,
                        format!("Invalid format: expected {format}"),
                    ));
                }
            }
        }

        if let Some(s) = value.as_str() {
            if let Some(min) = checks.min_length {
                if s.chars().count() < min {
                    issues.push(ValidationIssue::new(
                        field,
                        format!("String is shorter than minLength {min}"),
                    ));
                }
            }
            if let Some(max) = checks.max_length {
                if s.chars().count() > max {
                    issues.push(ValidationIssue::new(
                        field,
                        format!("String is longer than maxLength {max}"),
                    ));
                }
            }
        }

        if let Some(num) = value.as_f64() {
            if let Some(min) = checks.minimum {
                if num < min {
                    issues.push(ValidationIssue::new(
                        field,
                        format!("Value {num} is less than minimum {min}"),
                    ));
                }
            }
            if let Some(max) = checks.maximum {
                if num > max {
                    issues.push(ValidationIssue::new(
                        field,
                        format!("Value {num} is greater than maximum {max}"),
                    ));
                }
            }
        }

        if let Some(allowed) = &checks.allowed_values {
            if !allowed.contains(value) {
                issues.push(ValidationIssue::new(field, "Value is not in the allowed enum"));
            }
        }

        if let Some(item_type) = checks.item_type {
            if let Some(array) = value.as_array() {
                for (i, item) in array.iter().enumerate() {
                    if !item_type.accepts(item) {
                        issues.push(
                            ValidationIssue::new(format!("{field}[{i}]"), "Type mismatch")
                                .with_expected(item_type.as_str())
                                .with_actual(json_type_name(item)),
                        );
                    }
                }
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "null",
    }
}

fn format_matches(value: &str, format: &str) -> bool {
    match format {
        "email" => value.contains('@'),
        "uri" | "url" => value.starts_with("http://") || value.starts_with("https://"),
        "uuid" => uuid::Uuid::parse_str(value).is_ok(),
        "date-time" => chrono::DateTime::parse_from_rfc3339(value).is_ok(),
        _ => true, // Unknown format, skip validation
    }
}

/// Result of schema validation.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            issues: vec![],
        }
    }

    pub fn invalid(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: false,
            issues,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Collapses the issue list into a typed validation error.
    pub fn into_event_result(self, event_type: &str) -> EventResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(EventError::Validation {
                event_type: event_type.to_string(),
                reason: self
                    .issues
                    .iter()
                    .map(|i| i.message.clone())
                    .collect::<Vec<_>>()
                    .join("; "),
            })
        }
    }
}

/// A single validation failure with its location in the payload.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(document: Value) -> CompiledSchema {
        CompiledSchema::compile("test-schema", document).unwrap()
    }

    #[test]
    fn test_validate_simple_schema() {
        let schema = compile(json!({
            "type": "object",
            "required": ["session_id", "player_count"],
            "properties": {
                "session_id": {"type": "string"},
                "player_count": {"type": "integer"}
            }
        }));

        let result = schema.validate(&json!({
            "session_id": "s-1",
            "player_count": 8
        }));
        assert!(result.is_valid());
    }

    #[test]
    fn test_validate_missing_required() {
        let schema = compile(json!({
            "type": "object",
            "required": ["session_id"],
            "properties": {
                "session_id": {"type": "string"}
            }
        }));

        let result = schema.validate(&json!({"player_count": 8}));
        assert!(!result.is_valid());
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].message.contains("session_id"));
    }

    #[test]
    fn test_validate_type_mismatch() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "player_count": {"type": "integer"}
            }
        }));

        let result = schema.validate(&json!({"player_count": "eight"}));
        assert!(!result.is_valid());
        assert_eq!(result.issues[0].expected.as_deref(), Some("integer"));
        assert_eq!(result.issues[0].actual.as_deref(), Some("string"));
    }

    #[test]
    fn test_validate_root_type() {
        let schema = compile(json!({"type": "object"}));
        assert!(!schema.validate(&json!([1, 2, 3])).is_valid());
        assert!(schema.validate(&json!({})).is_valid());
    }

    #[test]
    fn test_validate_format_uuid() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "session_id": {"type": "string", "format": "uuid"}
            }
        }));

        let ok = schema.validate(&json!({
            "session_id": "7f8b1c3e-2d4a-4b5c-8d6e-9f0a1b2c3d4e"
        }));
        assert!(ok.is_valid());

        let bad = schema.validate(&json!({"session_id": "not-a-uuid"}));
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_validate_numeric_range() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "damage": {"type": "number", "minimum": 0, "maximum": 10000}
            }
        }));

        assert!(schema.validate(&json!({"damage": 250.5})).is_valid());
        assert!(!schema.validate(&json!({"damage": -1})).is_valid());
        assert!(!schema.validate(&json!({"damage": 10001})).is_valid());
    }

    #[test]
    fn test_validate_enum_and_items() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "outcome": {"type": "string", "enum": ["win", "loss", "draw"]},
                "participants": {"type": "array", "items": {"type": "string"}}
            }
        }));

        let ok = schema.validate(&json!({
            "outcome": "win",
            "participants": ["p-1", "p-2"]
        }));
        assert!(ok.is_valid());

        let bad = schema.validate(&json!({
            "outcome": "forfeit",
            "participants": ["p-1", 2]
        }));
        assert!(!bad.is_valid());
        assert_eq!(bad.issues.len(), 2);
    }

    #[test]
    fn test_compile_rejects_malformed_document() {
        assert!(CompiledSchema::compile("bad", json!("not an object")).is_err());
        assert!(CompiledSchema::compile("bad", json!({"required": "session_id"})).is_err());
        assert!(CompiledSchema::compile("bad", json!({"required": [42]})).is_err());
    }

    #[test]
    fn test_outcome_into_event_result() {
        let outcome = ValidationOutcome::invalid(vec![ValidationIssue::new(
            "session_id",
            "Required field 'session_id' is missing",
        )]);

        let err = outcome.into_event_result("combat.session.start").unwrap_err();
        match err {
            EventError::Validation { event_type, reason } => {
                assert_eq!(event_type, "combat.session.start");
                assert!(reason.contains("session_id"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
