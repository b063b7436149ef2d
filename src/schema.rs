//! Argument contracts for the three tools.
//!
//! Each tool receives an untyped JSON object. The `parse` functions here turn
//! it into a typed, defaulted input or a [`ValidationError`] that names every
//! offending field. Unknown keys are ignored; a missing or `null` argument
//! object is treated as `{}`.

use std::collections::BTreeMap;

use fixhive_core::models::VoteValue;
use serde_json::{Map, Value};

use crate::error::{FieldError, ValidationError};

pub const DEFAULT_SEARCH_LIMIT: u32 = 5;
pub const MAX_SEARCH_LIMIT: u32 = 20;
pub const MIN_SIGNATURE_LEN: usize = 5;

/// Validated `fixhive_search_cases` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchInput {
    pub error_message: String,
    pub error_signature: Option<String>,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub packages: Option<BTreeMap<String, String>>,
    pub limit: u32,
}

/// Validated `fixhive_report_resolution` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportInput {
    pub error_message: String,
    pub error_signature: String,
    pub stack_trace: Option<String>,
    pub cause: Option<String>,
    pub solution: Option<String>,
    pub solution_steps: Option<Vec<String>>,
    pub code_diff: Option<String>,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub packages: Option<BTreeMap<String, String>>,
    pub solved: bool,
    pub used_variant_id: Option<String>,
    pub what_was_tried: Option<String>,
    pub time_spent: Option<u64>,
}

/// Validated `fixhive_vote` arguments. `reason` is not yet checked against
/// `value`; that rule belongs to the vote handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteInput {
    pub variant_id: String,
    pub value: VoteValue,
    pub reason: Option<String>,
}

pub fn parse_search(args: &Value) -> Result<SearchInput, ValidationError> {
    let mut r = ArgReader::new(args);
    let error_message = r.required_string("error_message", 1);
    let error_signature = r.optional_string("error_signature");
    let language = r.optional_string("language");
    let framework = r.optional_string("framework");
    let packages = r.optional_string_map("packages");
    let limit = r
        .optional_integer("limit", 1, u64::from(MAX_SEARCH_LIMIT))
        .map(|v| v as u32)
        .unwrap_or(DEFAULT_SEARCH_LIMIT);
    r.finish()?;

    Ok(SearchInput {
        error_message: error_message.unwrap_or_default(),
        error_signature,
        language,
        framework,
        packages,
        limit,
    })
}

pub fn parse_report(args: &Value) -> Result<ReportInput, ValidationError> {
    let mut r = ArgReader::new(args);
    let error_message = r.required_string("error_message", 1);
    let error_signature = r.required_string("error_signature", MIN_SIGNATURE_LEN);
    let stack_trace = r.optional_string("stack_trace");
    let cause = r.optional_string("cause");
    let solution = r.optional_string("solution");
    let solution_steps = r.optional_string_list("solution_steps");
    let code_diff = r.optional_string("code_diff");
    let language = r.optional_string("language");
    let framework = r.optional_string("framework");
    let packages = r.optional_string_map("packages");
    let solved = r.optional_bool("solved").unwrap_or(true);
    let used_variant_id = r.optional_uuid("used_variant_id");
    let what_was_tried = r.optional_string("what_was_tried");
    let time_spent = r.optional_integer("time_spent", 0, u64::MAX);
    r.finish()?;

    Ok(ReportInput {
        error_message: error_message.unwrap_or_default(),
        error_signature: error_signature.unwrap_or_default(),
        stack_trace,
        cause,
        solution,
        solution_steps,
        code_diff,
        language,
        framework,
        packages,
        solved,
        used_variant_id,
        what_was_tried,
        time_spent,
    })
}

pub fn parse_vote(args: &Value) -> Result<VoteInput, ValidationError> {
    let mut r = ArgReader::new(args);
    let variant_id = r.required_uuid("variant_id");
    let value = r.required_vote_value("value");
    let reason = r.optional_string("reason");
    r.finish()?;

    match (variant_id, value) {
        (Some(variant_id), Some(value)) => Ok(VoteInput {
            variant_id,
            value,
            reason,
        }),
        // finish() already reported the missing field
        _ => Err(ValidationError { fields: Vec::new() }),
    }
}

/// Reads typed fields out of a JSON object, collecting a [`FieldError`] for
/// each field that breaks its contract.
struct ArgReader<'a> {
    args: Option<&'a Map<String, Value>>,
    not_object: Option<&'static str>,
    errors: Vec<FieldError>,
}

impl<'a> ArgReader<'a> {
    fn new(args: &'a Value) -> Self {
        match args {
            Value::Object(map) => Self {
                args: Some(map),
                not_object: None,
                errors: Vec::new(),
            },
            Value::Null => Self {
                args: None,
                not_object: None,
                errors: Vec::new(),
            },
            other => Self {
                args: None,
                not_object: Some(json_type_name(other)),
                errors: Vec::new(),
            },
        }
    }

    /// Returns the value for `field`, treating JSON `null` as absent.
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.args?.get(field).filter(|v| !v.is_null())
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn type_error(&mut self, field: &str, expected: &str, got: &Value) {
        self.fail(
            field,
            format!("expected {}, got {}", expected, json_type_name(got)),
        );
    }

    fn required_string(&mut self, field: &str, min_len: usize) -> Option<String> {
        match self.get(field) {
            None => {
                self.fail(field, "is required");
                None
            }
            Some(Value::String(s)) if s.chars().count() < min_len => {
                if min_len <= 1 {
                    self.fail(field, "must not be empty");
                } else {
                    self.fail(field, format!("must be at least {} characters", min_len));
                }
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.type_error(field, "string", other);
                None
            }
        }
    }

    fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.type_error(field, "string", other);
                None
            }
        }
    }

    fn optional_bool(&mut self, field: &str) -> Option<bool> {
        match self.get(field)? {
            Value::Bool(b) => Some(*b),
            other => {
                self.type_error(field, "boolean", other);
                None
            }
        }
    }

    /// Integers in `[min, max]`. Floats with no fractional part are accepted.
    fn optional_integer(&mut self, field: &str, min: u64, max: u64) -> Option<u64> {
        let value = self.get(field)?;
        let Value::Number(n) = value else {
            self.type_error(field, "integer", value);
            return None;
        };

        let integer = if let Some(u) = n.as_u64() {
            Some(i128::from(u))
        } else if let Some(i) = n.as_i64() {
            Some(i128::from(i))
        } else {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 1e18)
                .map(|f| f as i128)
        };

        let Some(integer) = integer else {
            self.fail(field, "must be an integer");
            return None;
        };

        if integer < i128::from(min) || integer > i128::from(max) {
            if max == u64::MAX {
                self.fail(field, format!("must be at least {}", min));
            } else {
                self.fail(field, format!("must be between {} and {}", min, max));
            }
            return None;
        }
        Some(integer as u64)
    }

    fn optional_string_list(&mut self, field: &str) -> Option<Vec<String>> {
        let value = self.get(field)?;
        let Value::Array(items) = value else {
            self.type_error(field, "array of strings", value);
            return None;
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item {
                Value::String(s) => out.push(s.clone()),
                other => {
                    self.type_error(&format!("{}[{}]", field, i), "string", other);
                    return None;
                }
            }
        }
        Some(out)
    }

    fn optional_string_map(&mut self, field: &str) -> Option<BTreeMap<String, String>> {
        let value = self.get(field)?;
        let Value::Object(entries) = value else {
            self.type_error(field, "object", value);
            return None;
        };
        let mut out = BTreeMap::new();
        for (name, version) in entries {
            match version {
                Value::String(v) => {
                    out.insert(name.clone(), v.clone());
                }
                other => {
                    self.type_error(&format!("{}.{}", field, name), "string", other);
                    return None;
                }
            }
        }
        Some(out)
    }

    fn optional_uuid(&mut self, field: &str) -> Option<String> {
        let id = self.optional_string(field)?;
        self.check_uuid(field, id)
    }

    fn required_uuid(&mut self, field: &str) -> Option<String> {
        let id = self.required_string(field, 1)?;
        self.check_uuid(field, id)
    }

    fn check_uuid(&mut self, field: &str, id: String) -> Option<String> {
        if uuid::Uuid::parse_str(&id).is_ok() {
            Some(id)
        } else {
            self.fail(field, "must be a valid UUID");
            None
        }
    }

    fn required_vote_value(&mut self, field: &str) -> Option<VoteValue> {
        let raw = self.required_string(field, 1)?;
        match VoteValue::parse(&raw) {
            Some(v) => Some(v),
            None => {
                self.fail(
                    field,
                    format!("must be one of up, down, report, got '{}'", raw),
                );
                None
            }
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        let mut fields = self.errors;
        if let Some(kind) = self.not_object {
            fields.insert(
                0,
                FieldError::new("arguments", format!("expected object, got {}", kind)),
            );
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VARIANT: &str = "6f1c2a4e-3b7d-4c21-9a5e-0d8f7b6c5a41";

    #[test]
    fn search_limit_defaults_to_five() {
        let input = parse_search(&json!({ "error_message": "boom" })).unwrap();
        assert_eq!(input.limit, 5);
        assert_eq!(input.error_signature, None);
    }

    #[test]
    fn search_limit_bounds() {
        for ok in [1u32, 7, 20] {
            let input = parse_search(&json!({ "error_message": "x", "limit": ok })).unwrap();
            assert_eq!(input.limit, ok);
        }
        for bad in [json!(0), json!(21), json!(-3), json!(2.5), json!("5")] {
            let err = parse_search(&json!({ "error_message": "x", "limit": bad })).unwrap_err();
            assert_eq!(err.field_names(), vec!["limit"], "limit {bad}");
        }
        let input = parse_search(&json!({ "error_message": "x", "limit": 3.0 })).unwrap();
        assert_eq!(input.limit, 3);
    }

    #[test]
    fn search_requires_message() {
        for args in [json!({}), json!(null), json!({ "error_message": "" })] {
            let err = parse_search(&args).unwrap_err();
            assert_eq!(err.field_names(), vec!["error_message"]);
        }
        let err = parse_search(&json!("boom")).unwrap_err();
        assert_eq!(err.field_names(), vec!["arguments", "error_message"]);
    }

    #[test]
    fn search_packages_must_map_to_strings() {
        let input = parse_search(&json!({
            "error_message": "x",
            "packages": { "react": "18.2.0", "next": "14.0.0" }
        }))
        .unwrap();
        let packages = input.packages.unwrap();
        assert_eq!(packages.get("react").map(String::as_str), Some("18.2.0"));

        let err = parse_search(&json!({ "error_message": "x", "packages": { "react": 18 } }))
            .unwrap_err();
        assert_eq!(err.field_names(), vec!["packages.react"]);
    }

    #[test]
    fn report_defaults_and_contract() {
        let input = parse_report(&json!({
            "error_message": "TypeError: x is undefined",
            "error_signature": "TypeError: {value} is undefined"
        }))
        .unwrap();
        assert!(input.solved);
        assert_eq!(input.used_variant_id, None);

        let err = parse_report(&json!({
            "error_message": "",
            "error_signature": "abcd",
            "used_variant_id": "not-a-uuid",
            "time_spent": -1,
            "solution_steps": ["ok", 3]
        }))
        .unwrap_err();
        assert_eq!(
            err.field_names(),
            vec![
                "error_message",
                "error_signature",
                "solution_steps[1]",
                "used_variant_id",
                "time_spent"
            ]
        );
    }

    #[test]
    fn report_accepts_full_payload() {
        let input = parse_report(&json!({
            "error_message": "boom",
            "error_signature": "Error: {value}",
            "solution_steps": ["a", "b"],
            "solved": false,
            "used_variant_id": VARIANT,
            "time_spent": 0
        }))
        .unwrap();
        assert!(!input.solved);
        assert_eq!(input.time_spent, Some(0));
        assert_eq!(input.solution_steps.unwrap().len(), 2);
        assert_eq!(input.used_variant_id.as_deref(), Some(VARIANT));
    }

    #[test]
    fn vote_contract() {
        let input = parse_vote(&json!({ "variant_id": VARIANT, "value": "report" })).unwrap();
        assert_eq!(input.value, VoteValue::Report);
        assert_eq!(input.reason, None);

        let err = parse_vote(&json!({ "variant_id": "v1", "value": "sideways" })).unwrap_err();
        assert_eq!(err.field_names(), vec!["variant_id", "value"]);
        assert!(err.to_string().contains("must be one of up, down, report"));

        let err = parse_vote(&json!({})).unwrap_err();
        assert_eq!(err.field_names(), vec!["variant_id", "value"]);
    }
}
