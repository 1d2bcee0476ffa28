//! # Product-Type Keywords
//!
//! Custom keywords for Selling Partner API product listings.
//!
//! | Keyword                | Config              | Applies to | Rule                                              |
//! |------------------------|---------------------|------------|---------------------------------------------------|
//! | `asinRequired`         | `bool`              | objects    | `ASIN` must be present and non-empty              |
//! | `displayable`          | `bool`              | strings    | at most [`DISPLAY_LIMIT`] characters              |
//! | `amazonRecommendation` | `[string, ...]`     | any value  | value must be one of the recommended strings      |
//! | `conditionalRequire`   | `[field, trigger]`  | objects    | when `trigger` is present, `field` must be too    |
//!
//! A keyword configured with `false` is inert.

use conform_schema::{InstanceType, KeywordDefinition, KeywordError, KeywordRegistry, SchemaError};
use serde_json::{json, Value};

/// Maximum length of a displayable string, in characters.
pub const DISPLAY_LIMIT: usize = 100;

/// Names of every keyword in this pack.
pub const PRODUCT_KEYWORDS: &[&str] = &[
    "asinRequired",
    "displayable",
    "amazonRecommendation",
    "conditionalRequire",
];

/// Register the product-type keywords. Names already present in the
/// registry are left untouched. Returns how many were newly added.
///
/// # Errors
///
/// Fails only if a keyword's own configuration schema does not compile.
pub fn register_product_keywords(registry: &mut KeywordRegistry) -> Result<usize, SchemaError> {
    let definitions = [
        ("asinRequired", asin_required()?),
        ("displayable", displayable()?),
        ("amazonRecommendation", amazon_recommendation()?),
        ("conditionalRequire", conditional_require()?),
    ];
    let added = definitions
        .into_iter()
        .filter(|(name, def)| registry.register(*name, def.clone()))
        .count();
    tracing::debug!(added, "product keywords registered");
    Ok(added)
}

/// Present in the sense of the listing rules: not null, not `false`, not
/// zero, and not an empty string, array or object.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn asin_required() -> Result<KeywordDefinition, SchemaError> {
    KeywordDefinition::new(|config, value, ctx| {
        if config.as_bool() == Some(true) && !is_present(value.get("ASIN")) {
            ctx.fail_with(
                "product type requires an ASIN",
                json!({"missingProperty": "ASIN"}),
            );
        }
        Ok(())
    })
    .applies_to(InstanceType::Object)
    .message("product type requires an ASIN")
    .config_schema(json!({"type": "boolean"}))
}

fn displayable() -> Result<KeywordDefinition, SchemaError> {
    KeywordDefinition::new(|config, value, ctx| {
        let Some(s) = value.as_str() else {
            return Ok(());
        };
        if config.as_bool() == Some(true) && s.chars().count() > DISPLAY_LIMIT {
            ctx.fail_with(
                format!("displayable content must not exceed {DISPLAY_LIMIT} characters"),
                json!({"limit": DISPLAY_LIMIT}),
            );
        }
        Ok(())
    })
    .applies_to(InstanceType::String)
    .message("content does not meet display requirements")
    .config_schema(json!({"type": "boolean"}))
}

fn amazon_recommendation() -> Result<KeywordDefinition, SchemaError> {
    KeywordDefinition::new(|config, value, ctx| {
        let recommended = string_list(config)?;
        let accepted = value
            .as_str()
            .is_some_and(|v| recommended.iter().any(|r| *r == v));
        if !accepted {
            ctx.fail_with(
                format!(
                    "use one of the recommended values: {}",
                    recommended.join(", ")
                ),
                json!({"allowedValues": recommended}),
            );
        }
        Ok(())
    })
    .message("not a recommended value")
    .config_schema(json!({"type": "array", "items": {"type": "string"}, "minItems": 1}))
}

fn conditional_require() -> Result<KeywordDefinition, SchemaError> {
    KeywordDefinition::new(|config, value, ctx| {
        let [field, trigger] = string_list(config)?[..] else {
            return Err(KeywordError::InvalidConfig(
                "expected [field, trigger]".to_string(),
            ));
        };
        if is_present(value.get(trigger)) && !is_present(value.get(field)) {
            ctx.fail_with(
                format!("'{field}' is required when '{trigger}' is provided"),
                json!({"missingProperty": field, "trigger": trigger}),
            );
        }
        Ok(())
    })
    .applies_to(InstanceType::Object)
    .message("conditionally required field is missing")
    .config_schema(json!({
        "type": "array",
        "items": {"type": "string", "minLength": 1},
        "minItems": 2,
        "maxItems": 2
    }))
}

fn string_list(config: &Value) -> Result<Vec<&str>, KeywordError> {
    config
        .as_array()
        .ok_or_else(|| KeywordError::InvalidConfig("expected an array of strings".to_string()))?
        .iter()
        .map(|v| {
            v.as_str()
                .ok_or_else(|| KeywordError::InvalidConfig(format!("expected a string, got {v}")))
        })
        .collect()
}
