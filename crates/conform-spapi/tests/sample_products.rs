//! Integration tests: the three reference product submissions, plus
//! registry behaviour when keywords are already present.

use conform_schema::{ErrorKind, KeywordDefinition, KeywordRegistry};
use conform_spapi::{product_validator, product_validator_with, register_product_keywords};
use serde_json::json;

fn summary(result: &conform_schema::ValidationResult) -> Vec<(String, String)> {
    result
        .errors()
        .iter()
        .map(|e| (e.instance_path.pointer(), e.keyword.clone()))
        .collect()
}

#[test]
fn complete_listing_is_valid() {
    let validator = product_validator().unwrap();
    let result = validator.validate(&json!({
        "brand": "AmazonBasics",
        "productType": "ELECTRONICS",
        "ASIN": "B08N5WRWNW",
        "marketplaceIds": ["ATVPDKIKX0DER"],
        "merchantSKU": "AMZ-12345",
        "releaseDate": "2023-01-15"
    }));
    assert!(result.is_valid(), "got: {result}");
}

#[test]
fn listing_with_several_problems_reports_all() {
    let validator = product_validator().unwrap();
    let result = validator.validate(&json!({
        "brand": "A",
        "productType": "INVALID_TYPE",
        "marketplaceIds": ["INVALID_MARKET", "ATVPDKIKX0DER"],
        "merchantSKU": "This is a very long SKU that exceeds the displayable limit for demo purposes"
    }));

    assert_eq!(
        summary(&result),
        vec![
            ("/brand".to_string(), "minLength".to_string()),
            ("/marketplaceIds/0".to_string(), "pattern".to_string()),
            ("/productType".to_string(), "amazonRecommendation".to_string()),
            ("".to_string(), "asinRequired".to_string()),
        ],
        "got: {result}"
    );
    let recommendation = result.by_keyword("amazonRecommendation").next().unwrap();
    assert_eq!(
        recommendation.params["allowedValues"],
        json!(["BOOK", "ELECTRONICS", "HOME_KITCHEN"])
    );
}

#[test]
fn listing_missing_fields() {
    let validator = product_validator().unwrap();
    let result = validator.validate(&json!({
        "brand": "Sony",
        "marketplaceIds": ["A2Q3Y263D00KWC"]
    }));

    assert_eq!(
        summary(&result),
        vec![
            ("".to_string(), "required".to_string()),
            ("".to_string(), "asinRequired".to_string()),
            ("".to_string(), "conditionalRequire".to_string()),
        ],
        "got: {result}"
    );
    assert_eq!(result.errors()[0].kind, ErrorKind::RequiredMissing);
    assert_eq!(result.errors()[0].params["missingProperty"], "productType");
    assert_eq!(result.errors()[2].params["missingProperty"], "merchantSKU");
}

#[test]
fn long_sku_is_not_displayable() {
    let validator = product_validator().unwrap();
    let result = validator.validate(&json!({
        "brand": "Sony",
        "productType": "BOOK",
        "ASIN": "B08N5WRWNW",
        "merchantSKU": "S".repeat(101)
    }));
    assert_eq!(summary(&result), vec![("/merchantSKU".to_string(), "displayable".to_string())]);
}

#[test]
fn existing_keyword_is_kept() {
    let mut registry = KeywordRegistry::new();
    let first = KeywordDefinition::new(|_, _, _| Ok(())).message("always passes");
    assert!(registry.register("displayable", first));

    assert_eq!(register_product_keywords(&mut registry).unwrap(), 3);
    assert_eq!(
        registry.lookup("displayable").unwrap().default_message(),
        "always passes"
    );

    let validator = product_validator_with(&registry).unwrap();
    let result = validator.validate(&json!({
        "brand": "Sony",
        "productType": "BOOK",
        "ASIN": "B08N5WRWNW",
        "merchantSKU": "S".repeat(500)
    }));
    assert!(result.is_valid(), "got: {result}");
}

#[test]
fn validator_is_shareable_across_threads() {
    let validator = std::sync::Arc::new(product_validator().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let v = std::sync::Arc::clone(&validator);
            std::thread::spawn(move || {
                v.is_valid(&json!({
                    "brand": format!("Brand{i}"),
                    "productType": "BOOK",
                    "ASIN": "B08N5WRWNW"
                }))
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
}
