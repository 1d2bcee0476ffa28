//! # Product Listing Schema
//!
//! The listing schema used for product submissions: built-in structural
//! rules for each attribute plus the product-type keywords from
//! [`crate::keywords`].

use conform_schema::{CompiledValidator, Compiler, KeywordRegistry, SchemaDocument, SchemaError};
use serde_json::{json, Value};

use crate::keywords::register_product_keywords;

/// Schema identifier declared in `$id`.
pub const PRODUCT_SCHEMA_ID: &str = "amazon-product-schema";

/// Recommended product types.
pub const PRODUCT_TYPES: &[&str] = &["BOOK", "ELECTRONICS", "HOME_KITCHEN"];

/// Marketplace identifiers a listing may target (US and Brazil).
pub const MARKETPLACE_ID_PATTERN: &str = "^ATVPDKIKX0DER$|^A2Q3Y263D00KWC$";

/// The product listing schema document.
pub fn product_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": PRODUCT_SCHEMA_ID,
        "$vocabulary": {
            "https://json-schema.org/draft/2019-09/vocab/core": true,
            "https://json-schema.org/draft/2019-09/vocab/applicator": true,
            "https://json-schema.org/draft/2019-09/vocab/validation": true,
            "https://developer-docs.amazon.com/sp-api/vocabularies/product-type#": true
        },
        "title": "Amazon SP-API Product Schema",
        "type": "object",
        "properties": {
            "ASIN": {
                "type": "string",
                "pattern": "^[A-Z0-9]{10}$",
                "description": "Amazon Standard Identification Number"
            },
            "productType": {
                "type": "string",
                "amazonRecommendation": PRODUCT_TYPES
            },
            "brand": {
                "type": "string",
                "minLength": 2,
                "maxLength": 50
            },
            "merchantSKU": {
                "type": "string",
                "displayable": true
            },
            "marketplaceIds": {
                "type": "array",
                "items": {"type": "string", "pattern": MARKETPLACE_ID_PATTERN}
            },
            "releaseDate": {
                "type": "string",
                "format": "date"
            }
        },
        "required": ["brand", "productType"],
        "asinRequired": true,
        "conditionalRequire": ["merchantSKU", "marketplaceIds"]
    })
}

/// Compile [`product_schema`] against a registry holding the product
/// keywords.
pub fn product_validator() -> Result<CompiledValidator, SchemaError> {
    let mut registry = KeywordRegistry::new();
    register_product_keywords(&mut registry)?;
    product_validator_with(&registry)
}

/// Compile [`product_schema`] against a caller-supplied registry, which
/// must already contain the product keywords.
pub fn product_validator_with(registry: &KeywordRegistry) -> Result<CompiledValidator, SchemaError> {
    let validator = Compiler::new(registry).compile(&SchemaDocument::new(product_schema()))?;
    tracing::debug!(schema = PRODUCT_SCHEMA_ID, "product validator ready");
    Ok(validator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_needs_product_keywords() {
        let err = product_validator_with(&KeywordRegistry::new()).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownKeyword { .. }));
    }

    #[test]
    fn schema_compiles_with_keywords() {
        assert!(product_validator().is_ok());
    }

    #[test]
    fn release_date_format_enforced() {
        let v = product_validator().unwrap();
        let r = v.validate(&json!({
            "brand": "Acme",
            "productType": "BOOK",
            "ASIN": "B000000001",
            "releaseDate": "2023-02-30"
        }));
        assert_eq!(r.len(), 1);
        assert_eq!(r.errors()[0].keyword, "format");
        assert_eq!(r.errors()[0].instance_path.pointer(), "/releaseDate");
    }
}
