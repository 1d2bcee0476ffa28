//! # conform-schema — Rule-Based Document Validation
//!
//! Compiles JSON-Schema-style documents into reusable validators and
//! evaluates JSON values against them, producing a complete report of
//! every violated rule in a single pass.
//!
//! ## Workflow
//!
//! 1. Populate a [`KeywordRegistry`] with custom keywords
//!    ([`KeywordDefinition`]) and formats ([`FormatDefinition`]).
//! 2. Compile a [`SchemaDocument`] with a [`Compiler`]. Unknown keywords,
//!    undeclared `required` names, bad patterns and malformed keyword
//!    values fail here with a [`SchemaError`].
//! 3. Call [`CompiledValidator::validate`] per value. Data problems never
//!    surface as `Err`; they are collected in a [`ValidationResult`].
//!
//! ```
//! use conform_schema::KeywordRegistry;
//! use serde_json::json;
//!
//! let registry = KeywordRegistry::new();
//! let validator = registry
//!     .compile(&json!({
//!         "type": "object",
//!         "properties": {"id": {"type": "integer", "minimum": 1}},
//!         "required": ["id"]
//!     }))
//!     .unwrap();
//!
//! assert!(validator.validate(&json!({"id": 7})).is_valid());
//! let report = validator.validate(&json!({"id": 0}));
//! assert_eq!(report.errors()[0].keyword, "minimum");
//! ```
//!
//! ## Vocabulary
//!
//! `type, properties, items, required, additionalProperties, minimum,
//! maximum, minLength, maxLength, pattern, format, enum, minItems,
//! maxItems, uniqueItems, allOf, if, then, else`, plus registered custom
//! keywords. Metadata keys such as `$schema`, `$id` and `title` are
//! accepted and ignored.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Compiled validators are immutable and `Send + Sync`.

pub mod compile;
pub mod error;
pub mod evaluate;
pub mod format;
pub mod keyword;
pub mod node;
pub mod options;
pub mod path;
pub mod result;
pub mod types;

pub use compile::{CompiledValidator, Compiler};
pub use error::{KeywordError, SchemaError};
pub use format::{FormatDefinition, BUILTIN_FORMATS};
pub use keyword::{KeywordContext, KeywordDefinition, KeywordRegistry};
pub use node::{Conditional, SchemaDocument, SchemaNode, ANNOTATION_KEYWORDS, BUILTIN_KEYWORDS};
pub use options::ValidatorOptions;
pub use path::{InstancePath, PathSegment};
pub use result::{ErrorKind, ValidationError, ValidationResult};
pub use types::{json_equal, InstanceType};
