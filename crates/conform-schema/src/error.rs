//! # Error Types
//!
//! Compile-time failures are fatal to the compile call and surface as
//! [`SchemaError`]. Data-time failures are never errors in the `Result`
//! sense: they are collected as [`ValidationError`](crate::ValidationError)
//! values inside a [`ValidationResult`](crate::ValidationResult).
//!
//! [`KeywordError`] is the channel a custom keyword uses to report that it
//! could not evaluate at all (as opposed to reporting a violation). The
//! evaluator converts it into a single `keyword-internal-error` violation.

use thiserror::Error;

/// Error raised while parsing or compiling a schema document.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema document could not be parsed as JSON or YAML.
    #[error("schema document parse error: {0}")]
    Parse(String),

    /// A keyword carried a value of the wrong shape.
    #[error("malformed schema at '{location}': {reason}")]
    Malformed {
        /// Schema location of the offending node.
        location: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A key is neither a built-in keyword, an annotation, nor registered.
    #[error("unknown keyword '{keyword}' at '{location}'")]
    UnknownKeyword {
        /// The unrecognized key.
        keyword: String,
        /// Schema location of the node carrying it.
        location: String,
    },

    /// `required` names a property missing from the node's `properties`.
    #[error("required property '{property}' at '{location}' is not declared in properties")]
    RequiredNotDeclared {
        /// The undeclared property name.
        property: String,
        /// Schema location of the node.
        location: String,
    },

    /// A `pattern` is not a valid regular expression.
    #[error("invalid pattern '{pattern}' at '{location}': {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Schema location of the node.
        location: String,
        /// Regex compiler message.
        reason: String,
    },

    /// A `format` names no registered format.
    #[error("unknown format '{format}' at '{location}'")]
    UnknownFormat {
        /// The format name.
        format: String,
        /// Schema location of the node.
        location: String,
    },

    /// A custom keyword binding's configuration failed its config schema.
    #[error("invalid configuration for keyword '{keyword}' at '{location}': {reason}")]
    InvalidKeywordConfig {
        /// The custom keyword name.
        keyword: String,
        /// Schema location of the node.
        location: String,
        /// Violations found in the configuration value.
        reason: String,
    },
}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(format!("invalid JSON: {e}"))
    }
}

impl From<serde_yaml::Error> for SchemaError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(format!("invalid YAML: {e}"))
    }
}

/// Failure inside a custom keyword's evaluation function.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeywordError {
    /// The keyword's configuration value has an unusable shape.
    #[error("malformed keyword configuration: {0}")]
    InvalidConfig(String),

    /// Any other evaluation failure.
    #[error("keyword evaluation failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keyword_display_names_keyword_and_location() {
        let err = SchemaError::UnknownKeyword {
            keyword: "asinRequired".into(),
            location: "#/properties/item".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("asinRequired"));
        assert!(msg.contains("#/properties/item"));
    }

    #[test]
    fn json_parse_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let err: SchemaError = parse.unwrap_err().into();
        assert!(matches!(err, SchemaError::Parse(ref m) if m.starts_with("invalid JSON")));
    }

    #[test]
    fn keyword_error_display() {
        let err = KeywordError::InvalidConfig("expected an array".into());
        assert_eq!(
            err.to_string(),
            "malformed keyword configuration: expected an array"
        );
    }
}
