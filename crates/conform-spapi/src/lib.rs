//! # conform-spapi — Product-Type Rules
//!
//! Custom keywords and the listing schema for Selling Partner API product
//! submissions, built on [`conform_schema`].
//!
//! ```
//! use conform_spapi::product_validator;
//! use serde_json::json;
//!
//! let validator = product_validator().unwrap();
//! let report = validator.validate(&json!({"brand": "Sony"}));
//! assert!(!report.is_valid());
//! ```
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - Keywords register append-only; existing names are never replaced.

pub mod keywords;
pub mod product;

pub use keywords::{is_present, register_product_keywords, DISPLAY_LIMIT, PRODUCT_KEYWORDS};
pub use product::{product_schema, product_validator, product_validator_with};
