//! # Validation Results
//!
//! A [`ValidationResult`] is the complete report for one evaluated value:
//! every violated rule found in a single pass, in traversal order. Validity
//! is derived from the error list, so the two can never disagree.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::path::InstancePath;

/// Category of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// The value's runtime type is not among the declared types.
    TypeMismatch,
    /// A `required` property is absent.
    RequiredMissing,
    /// A property not declared in `properties` under `additionalProperties: false`.
    AdditionalPropertyNotAllowed,
    /// Any other failed rule, built-in or custom.
    ConstraintViolation,
    /// A custom keyword failed to evaluate.
    KeywordInternalError,
}

impl ErrorKind {
    /// Stable kebab-case code.
    pub fn code(self) -> &'static str {
        match self {
            Self::TypeMismatch => "type-mismatch",
            Self::RequiredMissing => "required-missing",
            Self::AdditionalPropertyNotAllowed => "additional-property-not-allowed",
            Self::ConstraintViolation => "constraint-violation",
            Self::KeywordInternalError => "keyword-internal-error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single violated rule with structured context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Path to the offending value.
    pub instance_path: InstancePath,
    /// Location of the schema node that owns the keyword.
    pub schema_path: String,
    /// The violated keyword (`type`, `minimum`, a custom name, ...).
    pub keyword: String,
    /// Violation category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Keyword-specific parameters, always a JSON object.
    pub params: Value,
}

impl ValidationError {
    pub(crate) fn new(
        kind: ErrorKind,
        keyword: &str,
        instance_path: &InstancePath,
        schema_path: &str,
        message: impl Into<String>,
        params: Value,
    ) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = format!("must pass \"{keyword}\" keyword validation");
        }
        let params = match params {
            Value::Object(_) => params,
            Value::Null => Value::Object(Map::new()),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Value::Object(map)
            }
        };
        Self {
            instance_path: instance_path.clone(),
            schema_path: schema_path.to_string(),
            keyword: keyword.to_string(),
            kind,
            message,
            params,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {} [{}]", self.instance_path, self.message, self.keyword)
    }
}

/// Verdict plus every violation found for one value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub(crate) fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// True iff no violation was found.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Violations in traversal order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Violations raised by `keyword`.
    pub fn by_keyword<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.keyword == keyword)
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return f.write_str("valid");
        }
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(path: InstancePath) -> ValidationError {
        ValidationError::new(
            ErrorKind::ConstraintViolation,
            "pattern",
            &path,
            "#/properties/ASIN",
            r#"must match pattern "^[A-Z0-9]{10}$""#,
            json!({"pattern": "^[A-Z0-9]{10}$"}),
        )
    }

    #[test]
    fn validity_follows_errors() {
        assert!(ValidationResult::from_errors(Vec::new()).is_valid());
        let r = ValidationResult::from_errors(vec![sample(InstancePath::root())]);
        assert!(!r.is_valid());
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn display_root_marker() {
        let display = sample(InstancePath::root()).to_string();
        assert!(display.contains("(root)"));
        assert!(display.contains("[pattern]"));
    }

    #[test]
    fn display_nested_path() {
        let display = sample(InstancePath::root().property("ASIN")).to_string();
        assert!(display.contains("/ASIN"));
        assert!(display.contains("must match pattern"));
    }

    #[test]
    fn empty_message_gets_default() {
        let e = ValidationError::new(
            ErrorKind::ConstraintViolation,
            "custom",
            &InstancePath::root(),
            "#",
            "  ",
            Value::Null,
        );
        assert_eq!(e.message, "must pass \"custom\" keyword validation");
        assert_eq!(e.params, json!({}));
    }

    #[test]
    fn non_object_params_are_wrapped() {
        let e = ValidationError::new(
            ErrorKind::ConstraintViolation,
            "custom",
            &InstancePath::root(),
            "#",
            "bad",
            json!(5),
        );
        assert_eq!(e.params, json!({"value": 5}));
    }

    #[test]
    fn serializes_kind_as_code() {
        let e = sample(InstancePath::root().property("ASIN"));
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["kind"], "constraint-violation");
        assert_eq!(v["instancePath"], "/ASIN");
        assert_eq!(v["schemaPath"], "#/properties/ASIN");
    }
}
