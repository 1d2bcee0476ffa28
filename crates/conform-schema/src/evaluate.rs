//! # Evaluator
//!
//! Walks a compiled plan against a value and records every violation.
//!
//! Two modes share one walker: `Collect` builds the user-facing report,
//! `Probe` only answers "does this value pass?" for `if` conditions and
//! stops at the first failure. A type mismatch skips the node's value,
//! object and array rules, but never the rest of the traversal.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::{json, Map, Value};

use crate::compile::{BoundKeyword, Check, CompiledNode, CompiledValidator};
use crate::keyword::KeywordContext;
use crate::options::ValidatorOptions;
use crate::path::InstancePath;
use crate::result::{ErrorKind, ValidationError, ValidationResult};
use crate::types::json_equal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Collect,
    Probe,
}

struct Evaluator<'o> {
    mode: Mode,
    /// Set while probing an `if` schema.
    in_condition: bool,
    options: &'o ValidatorOptions,
    errors: Vec<ValidationError>,
    failed: bool,
}

impl CompiledValidator {
    /// Validate a value, collecting every violation.
    pub fn validate(&self, value: &Value) -> ValidationResult {
        let mut eval = Evaluator::new(Mode::Collect, &self.options);
        eval.node(&self.root, value, &InstancePath::root());
        ValidationResult::from_errors(eval.errors)
    }

    /// Whether `value` passes, without building a report.
    pub fn is_valid(&self, value: &Value) -> bool {
        let mut eval = Evaluator::new(Mode::Probe, &self.options);
        eval.node(&self.root, value, &InstancePath::root());
        !eval.failed
    }
}

impl<'o> Evaluator<'o> {
    fn new(mode: Mode, options: &'o ValidatorOptions) -> Self {
        Self {
            mode,
            in_condition: false,
            options,
            errors: Vec::new(),
            failed: false,
        }
    }

    fn halted(&self) -> bool {
        self.failed && (self.mode == Mode::Probe || !self.options.all_errors)
    }

    fn record(&mut self, build: impl FnOnce() -> ValidationError) {
        self.failed = true;
        if self.mode == Mode::Collect {
            self.errors.push(build());
        }
    }

    fn node(&mut self, node: &CompiledNode, value: &Value, path: &InstancePath) {
        if self.halted() {
            return;
        }

        let type_ok = node
            .types
            .as_ref()
            .map_or(true, |types| types.iter().any(|t| t.matches(value)));

        if type_ok {
            self.checks(node, value, path);
            match value {
                Value::Object(map) => self.object(node, map, path),
                Value::Array(items) => self.array(node, items, path),
                _ => {}
            }
        } else {
            self.record(|| type_mismatch(node, path));
        }

        for member in &node.all_of {
            self.node(member, value, path);
        }

        if let Some(cond) = &node.conditional {
            if !self.halted() {
                let mut probe = Evaluator::new(Mode::Probe, self.options);
                probe.in_condition = true;
                probe.node(&cond.if_node, value, path);
                let branch = if probe.failed {
                    cond.else_node.as_ref()
                } else {
                    cond.then_node.as_ref()
                };
                if let Some(branch) = branch {
                    self.node(branch, value, path);
                }
            }
        }

        for bound in &node.keywords {
            if self.halted() {
                return;
            }
            self.keyword(node, bound, value, path);
        }
    }

    fn checks(&mut self, node: &CompiledNode, value: &Value, path: &InstancePath) {
        for check in &node.checks {
            if self.halted() {
                return;
            }
            match (check, value) {
                (Check::Minimum(limit), Value::Number(n)) => {
                    if n.as_f64().is_some_and(|x| x < *limit) {
                        self.record(|| {
                            violation(node, "minimum", path, format!("must be >= {limit}"), json!({"comparison": ">=", "limit": limit}))
                        });
                    }
                }
                (Check::Maximum(limit), Value::Number(n)) => {
                    if n.as_f64().is_some_and(|x| x > *limit) {
                        self.record(|| {
                            violation(node, "maximum", path, format!("must be <= {limit}"), json!({"comparison": "<=", "limit": limit}))
                        });
                    }
                }
                (Check::MinLength(limit), Value::String(s)) => {
                    if (s.chars().count() as u64) < *limit {
                        self.record(|| {
                            violation(node, "minLength", path, format!("must NOT have fewer than {limit} characters"), json!({"limit": limit}))
                        });
                    }
                }
                (Check::MaxLength(limit), Value::String(s)) => {
                    if s.chars().count() as u64 > *limit {
                        self.record(|| {
                            violation(node, "maxLength", path, format!("must NOT have more than {limit} characters"), json!({"limit": limit}))
                        });
                    }
                }
                (Check::Pattern { source, regex }, Value::String(s)) => {
                    if !regex.is_match(s) {
                        self.record(|| {
                            violation(node, "pattern", path, format!("must match pattern \"{source}\""), json!({"pattern": source}))
                        });
                    }
                }
                (Check::Format { name, definition }, Value::String(s)) => {
                    if !definition.is_valid(s) {
                        self.record(|| {
                            violation(node, "format", path, format!("must match format \"{name}\""), json!({"format": name}))
                        });
                    }
                }
                (Check::Enum(allowed), v) => {
                    if !allowed.iter().any(|a| json_equal(a, v)) {
                        self.record(|| {
                            violation(node, "enum", path, "must be equal to one of the allowed values", json!({"allowedValues": allowed}))
                        });
                    }
                }
                // Rule does not apply to this value's type.
                _ => {}
            }
        }
    }

    fn object(&mut self, node: &CompiledNode, map: &Map<String, Value>, path: &InstancePath) {
        let strict_probe = self.in_condition && !self.options.absent_properties_satisfy_if;
        for (name, sub) in &node.properties {
            if self.halted() {
                return;
            }
            match map.get(name) {
                Some(child) => self.node(sub, child, &path.property(name)),
                None if strict_probe => self.failed = true,
                None => {}
            }
        }

        for name in &node.required {
            if self.halted() {
                return;
            }
            if !map.contains_key(name) {
                self.record(|| {
                    ValidationError::new(
                        ErrorKind::RequiredMissing,
                        "required",
                        path,
                        &node.location,
                        format!("must have required property '{name}'"),
                        json!({"missingProperty": name}),
                    )
                });
            }
        }

        if !node.additional_properties {
            for key in map.keys() {
                if self.halted() {
                    return;
                }
                if !node.properties.iter().any(|(name, _)| name == key) {
                    self.record(|| {
                        ValidationError::new(
                            ErrorKind::AdditionalPropertyNotAllowed,
                            "additionalProperties",
                            &path.property(key),
                            &node.location,
                            "must NOT have additional properties",
                            json!({"additionalProperty": key}),
                        )
                    });
                }
            }
        }
    }

    fn array(&mut self, node: &CompiledNode, items: &[Value], path: &InstancePath) {
        if let Some(item_node) = &node.items {
            for (i, item) in items.iter().enumerate() {
                if self.halted() {
                    return;
                }
                self.node(item_node, item, &path.index(i));
            }
        }

        let len = items.len() as u64;
        if let Some(limit) = node.min_items {
            if len < limit && !self.halted() {
                self.record(|| {
                    violation(node, "minItems", path, format!("must NOT have fewer than {limit} items"), json!({"limit": limit}))
                });
            }
        }
        if let Some(limit) = node.max_items {
            if len > limit && !self.halted() {
                self.record(|| {
                    violation(node, "maxItems", path, format!("must NOT have more than {limit} items"), json!({"limit": limit}))
                });
            }
        }

        if node.unique_items && !self.halted() {
            if let Some((first, duplicate)) = first_duplicate(items) {
                self.record(|| {
                    violation(
                        node,
                        "uniqueItems",
                        path,
                        format!("must NOT have duplicate items (items at {first} and {duplicate} are identical)"),
                        json!({"first": first, "duplicate": duplicate}),
                    )
                });
            }
        }
    }

    fn keyword(&mut self, node: &CompiledNode, bound: &BoundKeyword, value: &Value, path: &InstancePath) {
        let definition = &bound.definition;
        if !definition.applies(value) {
            return;
        }

        let mut ctx = KeywordContext::new(
            &bound.name,
            &bound.config,
            path,
            &node.location,
            definition.default_message(),
        );
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            definition.evaluate(&bound.config, value, &mut ctx)
        }));

        let failure = match outcome {
            Ok(Ok(())) => {
                for error in ctx.into_errors() {
                    if self.halted() {
                        break;
                    }
                    self.record(|| error);
                }
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };

        tracing::warn!(keyword = %bound.name, path = %path, error = %failure, "custom keyword failed");
        self.record(|| {
            ValidationError::new(
                ErrorKind::KeywordInternalError,
                &bound.name,
                path,
                &node.location,
                format!("keyword \"{}\" failed: {failure}", bound.name),
                json!({"keyword": bound.name, "error": failure}),
            )
        });
    }
}

fn violation(
    node: &CompiledNode,
    keyword: &str,
    path: &InstancePath,
    message: impl Into<String>,
    params: Value,
) -> ValidationError {
    ValidationError::new(
        ErrorKind::ConstraintViolation,
        keyword,
        path,
        &node.location,
        message,
        params,
    )
}

fn type_mismatch(node: &CompiledNode, path: &InstancePath) -> ValidationError {
    let names: Vec<&str> = node
        .types
        .iter()
        .flatten()
        .map(|t| t.as_str())
        .collect();
    let expected = if names.len() == 1 {
        json!(names[0])
    } else {
        json!(names)
    };
    ValidationError::new(
        ErrorKind::TypeMismatch,
        "type",
        path,
        &node.location,
        format!("must be {}", names.join(" or ")),
        json!({"type": expected}),
    )
}

/// First `(i, j)` with `i < j` and equal items, scanning by `j`.
fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    (1..items.len()).find_map(|j| {
        (0..j)
            .find(|&i| json_equal(&items[i], &items[j]))
            .map(|i| (i, j))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeywordError;
    use crate::keyword::{KeywordDefinition, KeywordRegistry};
    use crate::types::InstanceType;

    fn validator(schema: Value) -> CompiledValidator {
        KeywordRegistry::new().compile(&schema).unwrap()
    }

    fn keywords(result: &ValidationResult) -> Vec<&str> {
        result.errors().iter().map(|e| e.keyword.as_str()).collect()
    }

    #[test]
    fn type_mismatch_skips_structural_checks() {
        let v = validator(json!({"type": "string", "minLength": 3, "enum": ["abc"]}));
        let r = v.validate(&json!(5));
        assert_eq!(keywords(&r), vec!["type"]);
        assert_eq!(r.errors()[0].kind, ErrorKind::TypeMismatch);
        assert_eq!(r.errors()[0].message, "must be string");
        assert!(r.errors()[0].instance_path.is_root());
    }

    #[test]
    fn type_union_message() {
        let v = validator(json!({"type": ["string", "null"]}));
        let r = v.validate(&json!(1));
        assert_eq!(r.errors()[0].message, "must be string or null");
        assert_eq!(r.errors()[0].params["type"], json!(["string", "null"]));
        assert!(v.validate(&json!(null)).is_valid());
    }

    #[test]
    fn scalar_constraints_are_independent() {
        let v = validator(json!({"type": "string", "minLength": 5, "pattern": "^[0-9]+$"}));
        let r = v.validate(&json!("ab"));
        assert_eq!(keywords(&r), vec!["minLength", "pattern"]);
    }

    #[test]
    fn numeric_bounds_inclusive() {
        let v = validator(json!({"type": "integer", "minimum": 18, "maximum": 120}));
        assert!(v.validate(&json!(18)).is_valid());
        assert!(v.validate(&json!(120)).is_valid());
        let low = v.validate(&json!(17));
        assert_eq!(low.errors()[0].message, "must be >= 18");
        assert_eq!(low.errors()[0].params["limit"], json!(18.0));
        assert_eq!(keywords(&v.validate(&json!(121))), vec!["maximum"]);
    }

    #[test]
    fn length_counts_characters() {
        let v = validator(json!({"maxLength": 3}));
        assert!(v.validate(&json!("日本語")).is_valid());
        assert!(!v.validate(&json!("日本語!")).is_valid());
    }

    #[test]
    fn pattern_is_full_match() {
        let v = validator(json!({"pattern": "[A-Z]{3}"}));
        assert!(v.validate(&json!("ABC")).is_valid());
        assert!(!v.validate(&json!("xABCx")).is_valid());
    }

    #[test]
    fn enum_uses_numeric_equality() {
        let v = validator(json!({"enum": [1, "one", {"n": 1}]}));
        assert!(v.validate(&json!(1.0)).is_valid());
        assert!(v.validate(&json!({"n": 1})).is_valid());
        let r = v.validate(&json!("two"));
        assert_eq!(r.errors()[0].params["allowedValues"], json!([1, "one", {"n": 1}]));
    }

    #[test]
    fn format_checked_on_strings_only() {
        let v = validator(json!({"format": "date"}));
        assert!(v.validate(&json!("2023-01-15")).is_valid());
        assert!(v.validate(&json!(20230115)).is_valid());
        let r = v.validate(&json!("15/01/2023"));
        assert_eq!(keywords(&r), vec!["format"]);
        assert_eq!(r.errors()[0].params["format"], "date");
    }

    #[test]
    fn object_rules() {
        let v = validator(json!({
            "type": "object",
            "properties": {"id": {"type": "integer"}, "name": {"type": "string"}},
            "required": ["id", "name"],
            "additionalProperties": false
        }));
        let r = v.validate(&json!({"id": "x", "extra": 1}));
        assert_eq!(keywords(&r), vec!["type", "required", "additionalProperties"]);
        assert_eq!(r.errors()[0].instance_path.pointer(), "/id");
        assert_eq!(r.errors()[1].params["missingProperty"], "name");
        assert!(r.errors()[1].instance_path.is_root());
        assert_eq!(r.errors()[2].instance_path.pointer(), "/extra");
        assert_eq!(r.errors()[2].kind, ErrorKind::AdditionalPropertyNotAllowed);
    }

    #[test]
    fn array_rules() {
        let v = validator(json!({
            "type": "array",
            "items": {"type": "string"},
            "minItems": 2,
            "maxItems": 3,
            "uniqueItems": true
        }));
        assert!(v.validate(&json!(["a", "b"])).is_valid());
        let r = v.validate(&json!([1]));
        assert_eq!(keywords(&r), vec!["type", "minItems"]);
        assert_eq!(r.errors()[0].instance_path.pointer(), "/0");
        assert_eq!(keywords(&v.validate(&json!(["a", "b", "c", "d"]))), vec!["maxItems"]);
    }

    #[test]
    fn unique_items_reports_second_occurrence() {
        let v = validator(json!({"uniqueItems": true}));
        let r = v.validate(&json!(["admin", "user", "admin", "user"]));
        assert_eq!(r.len(), 1);
        assert_eq!(r.errors()[0].params["first"], 0);
        assert_eq!(r.errors()[0].params["duplicate"], 2);
        assert!(r.errors()[0].message.contains('2'));
        assert!(v.validate(&json!([1, "1", [1]])).is_valid());
        assert!(!v.validate(&json!([1, 1.0])).is_valid());
    }

    #[test]
    fn conditional_then_and_else() {
        let v = validator(json!({
            "if": {"properties": {"kind": {"enum": ["book"]}}},
            "then": {"required": ["isbn"]},
            "else": {"required": ["sku"]}
        }));
        let book = v.validate(&json!({"kind": "book"}));
        assert_eq!(book.errors()[0].params["missingProperty"], "isbn");
        let other = v.validate(&json!({"kind": "lamp"}));
        assert_eq!(other.errors()[0].params["missingProperty"], "sku");
        assert!(v.validate(&json!({"kind": "book", "isbn": "x"})).is_valid());
    }

    #[test]
    fn if_errors_never_leak() {
        let v = validator(json!({"if": {"type": "string", "minLength": 100}, "then": {"maxLength": 1}}));
        assert!(v.validate(&json!("short")).is_valid());
    }

    #[test]
    fn absent_property_policy() {
        let schema = json!({
            "if": {"properties": {"age": {"type": "integer"}}},
            "then": {"required": ["name"]}
        });
        let default = validator(schema.clone());
        assert!(!default.validate(&json!({})).is_valid());

        let reg = KeywordRegistry::new();
        let opts = ValidatorOptions {
            absent_properties_satisfy_if: false,
            ..ValidatorOptions::default()
        };
        let present_only = crate::compile::Compiler::new(&reg)
            .with_options(opts)
            .compile(&crate::node::SchemaDocument::new(schema))
            .unwrap();
        assert!(present_only.validate(&json!({})).is_valid());
        let r = present_only.validate(&json!({"age": 30}));
        assert_eq!(r.errors()[0].params["missingProperty"], "name");
    }

    #[test]
    fn all_of_merges_every_member() {
        let v = validator(json!({"allOf": [{"minimum": 10}, {"type": "integer"}, {"maximum": 5}]}));
        let r = v.validate(&json!(7.5));
        assert_eq!(keywords(&r), vec!["minimum", "type", "maximum"]);
        assert_eq!(r.errors()[0].schema_path, "#/allOf/0");
        assert_eq!(r.errors()[2].schema_path, "#/allOf/2");
    }

    #[test]
    fn custom_keyword_receives_config_and_path() {
        let mut reg = KeywordRegistry::new();
        reg.register(
            "startsWith",
            KeywordDefinition::new(|config, value, ctx| {
                let prefix = config
                    .as_str()
                    .ok_or_else(|| KeywordError::InvalidConfig("expected a string".into()))?;
                if value.as_str().is_some_and(|s| !s.starts_with(prefix)) {
                    ctx.fail_with(format!("must start with {prefix}"), json!({"prefix": prefix}));
                }
                Ok(())
            })
            .applies_to(InstanceType::String),
        );
        let v = reg
            .compile(&json!({"properties": {"sku": {"startsWith": "AMZ-"}}}))
            .unwrap();
        let r = v.validate(&json!({"sku": "XYZ-1"}));
        assert_eq!(r.len(), 1);
        assert_eq!(r.errors()[0].keyword, "startsWith");
        assert_eq!(r.errors()[0].instance_path.pointer(), "/sku");
        assert_eq!(r.errors()[0].schema_path, "#/properties/sku");
        assert!(v.validate(&json!({"sku": 12})).is_valid());
    }

    #[test]
    fn failing_keyword_is_isolated() {
        let mut reg = KeywordRegistry::new();
        reg.register(
            "broken",
            KeywordDefinition::new(|_, _, ctx| {
                ctx.fail();
                Err(KeywordError::Failed("boom".into()))
            }),
        );
        reg.register(
            "explodes",
            KeywordDefinition::new(|_, _, _| panic!("keyword exploded")),
        );
        let v = reg
            .compile(&json!({"broken": true, "explodes": true, "properties": {"n": {"minimum": 1}}}))
            .unwrap();
        let r = v.validate(&json!({"n": 0}));
        assert_eq!(keywords(&r), vec!["minimum", "broken", "explodes"]);
        assert_eq!(r.errors()[1].kind, ErrorKind::KeywordInternalError);
        assert!(r.errors()[1].message.contains("boom"));
        assert_eq!(r.errors()[2].kind, ErrorKind::KeywordInternalError);
        assert!(r.errors()[2].message.contains("keyword exploded"));
    }

    #[test]
    fn first_error_mode_stops_early() {
        let reg = KeywordRegistry::new();
        let v = crate::compile::Compiler::new(&reg)
            .with_options(ValidatorOptions::default().first_error_only())
            .compile(&crate::node::SchemaDocument::new(json!({"required": ["a", "b", "c"]})))
            .unwrap();
        let r = v.validate(&json!({}));
        assert_eq!(r.len(), 1);
        assert_eq!(r.errors()[0].params["missingProperty"], "a");
    }

    #[test]
    fn is_valid_matches_validate() {
        let v = validator(json!({"type": "object", "required": ["id"]}));
        for value in [json!({}), json!({"id": 1}), json!([])] {
            assert_eq!(v.is_valid(&value), v.validate(&value).is_valid());
        }
    }
}
