//! # Validator Options
//!
//! Compile-time configuration. Every field has a default, so options can
//! be deserialized from a partial JSON/YAML document.

use serde::{Deserialize, Serialize};

/// Configuration applied when compiling a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Collect every violation in one pass. When false, evaluation stops
    /// after the first recorded violation.
    pub all_errors: bool,
    /// Enforce the `format` keyword.
    pub validate_formats: bool,
    /// Reject unknown keywords and unknown formats at compile time. When
    /// false they are ignored with a warning.
    pub strict: bool,
    /// Whether an absent property satisfies a `properties` check inside an
    /// `if` probe. When false, the probe fails for every declared property
    /// the value does not carry.
    pub absent_properties_satisfy_if: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            all_errors: true,
            validate_formats: true,
            strict: true,
            absent_properties_satisfy_if: true,
        }
    }
}

impl ValidatorOptions {
    /// Options with evaluation stopping at the first violation.
    pub fn first_error_only(mut self) -> Self {
        self.all_errors = false;
        self
    }

    /// Options that ignore unknown keywords and formats.
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_collect_all_and_strict() {
        let opts = ValidatorOptions::default();
        assert!(opts.all_errors);
        assert!(opts.validate_formats);
        assert!(opts.strict);
        assert!(opts.absent_properties_satisfy_if);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let opts: ValidatorOptions =
            serde_json::from_str(r#"{ "strict": false }"#).unwrap();
        assert!(!opts.strict);
        assert!(opts.all_errors);
    }

    #[test]
    fn yaml_options() {
        let opts: ValidatorOptions = serde_yaml::from_str(
            "all_errors: false\nabsent_properties_satisfy_if: false\n",
        )
        .unwrap();
        assert!(!opts.all_errors);
        assert!(!opts.absent_properties_satisfy_if);
        assert!(opts.validate_formats);
    }

    #[test]
    fn builders() {
        let opts = ValidatorOptions::default().first_error_only().lenient();
        assert!(!opts.all_errors);
        assert!(!opts.strict);
    }
}
