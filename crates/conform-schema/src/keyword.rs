//! # Keyword Registry
//!
//! Custom keywords are pure evaluation functions registered by name before
//! any schema that uses them is compiled. The registry is append-only:
//! re-registering a name (including a built-in keyword name) logs a warning
//! and keeps the existing definition.
//!
//! Compiled validators hold `Arc` handles to the definitions they resolved,
//! so a validator keeps working unchanged however the registry grows later.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::compile::{CompiledValidator, Compiler};
use crate::error::{KeywordError, SchemaError};
use crate::format::{builtin_format, FormatDefinition, BUILTIN_FORMATS};
use crate::node::{SchemaDocument, ANNOTATION_KEYWORDS, BUILTIN_KEYWORDS};
use crate::path::InstancePath;
use crate::result::{ErrorKind, ValidationError};
use crate::types::InstanceType;

type KeywordFn =
    dyn Fn(&Value, &Value, &mut KeywordContext<'_>) -> Result<(), KeywordError> + Send + Sync;

/// Evaluation context handed to a custom keyword.
///
/// Emitting errors through the context is the only side effect a keyword
/// may have. Every error lands at the current instance path.
pub struct KeywordContext<'a> {
    keyword: &'a str,
    config: &'a Value,
    path: &'a InstancePath,
    schema_path: &'a str,
    default_message: &'a str,
    emitted: Vec<ValidationError>,
}

impl<'a> KeywordContext<'a> {
    pub(crate) fn new(
        keyword: &'a str,
        config: &'a Value,
        path: &'a InstancePath,
        schema_path: &'a str,
        default_message: &'a str,
    ) -> Self {
        Self {
            keyword,
            config,
            path,
            schema_path,
            default_message,
            emitted: Vec::new(),
        }
    }

    /// Name the keyword was bound under.
    pub fn keyword(&self) -> &str {
        self.keyword
    }

    /// The keyword's schema-time configuration value.
    pub fn config(&self) -> &Value {
        self.config
    }

    /// Path of the value being checked.
    pub fn path(&self) -> &InstancePath {
        self.path
    }

    /// Emit a violation with the definition's default message.
    pub fn fail(&mut self) {
        let message = self.default_message.to_string();
        self.fail_with(message, Value::Null);
    }

    /// Emit a violation with a specific message and parameters.
    pub fn fail_with(&mut self, message: impl Into<String>, params: Value) {
        self.emitted.push(ValidationError::new(
            ErrorKind::ConstraintViolation,
            self.keyword,
            self.path,
            self.schema_path,
            message,
            params,
        ));
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationError> {
        self.emitted
    }
}

/// A registered custom keyword.
#[derive(Clone)]
pub struct KeywordDefinition {
    applies_to: Vec<InstanceType>,
    message: String,
    config_schema: Option<CompiledValidator>,
    evaluate: Arc<KeywordFn>,
}

impl KeywordDefinition {
    /// Define a keyword from its evaluation function. The function receives
    /// the binding's configuration, the value, and the context.
    pub fn new(
        evaluate: impl Fn(&Value, &Value, &mut KeywordContext<'_>) -> Result<(), KeywordError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            applies_to: Vec::new(),
            message: String::new(),
            config_schema: None,
            evaluate: Arc::new(evaluate),
        }
    }

    /// Restrict the keyword to values of the given type. May be called
    /// repeatedly; without any call the keyword applies to every value.
    pub fn applies_to(mut self, ty: InstanceType) -> Self {
        self.applies_to.push(ty);
        self
    }

    /// Default message used by [`KeywordContext::fail`].
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Schema every binding's configuration must satisfy. Compiled here,
    /// against built-in keywords only.
    pub fn config_schema(mut self, schema: Value) -> Result<Self, SchemaError> {
        let builtins = KeywordRegistry::new();
        let validator = Compiler::new(&builtins).compile(&SchemaDocument::new(schema))?;
        self.config_schema = Some(validator);
        Ok(self)
    }

    /// Default message.
    pub fn default_message(&self) -> &str {
        &self.message
    }

    /// Whether the keyword runs for `value`.
    pub fn applies(&self, value: &Value) -> bool {
        self.applies_to.is_empty() || self.applies_to.iter().any(|t| t.matches(value))
    }

    pub(crate) fn config_validator(&self) -> Option<&CompiledValidator> {
        self.config_schema.as_ref()
    }

    pub(crate) fn evaluate(
        &self,
        config: &Value,
        value: &Value,
        ctx: &mut KeywordContext<'_>,
    ) -> Result<(), KeywordError> {
        (self.evaluate)(config, value, ctx)
    }
}

impl fmt::Debug for KeywordDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordDefinition")
            .field("applies_to", &self.applies_to)
            .field("message", &self.message)
            .field("has_config_schema", &self.config_schema.is_some())
            .finish_non_exhaustive()
    }
}

/// Append-only map of custom keywords and formats.
#[derive(Debug, Clone, Default)]
pub struct KeywordRegistry {
    keywords: BTreeMap<String, Arc<KeywordDefinition>>,
    formats: BTreeMap<String, FormatDefinition>,
}

impl KeywordRegistry {
    /// A registry holding only the built-in vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom keyword. Returns false, logs a warning, and keeps
    /// the existing definition when the name is already taken.
    pub fn register(&mut self, name: impl Into<String>, definition: KeywordDefinition) -> bool {
        let name = name.into();
        if is_builtin_keyword(&name) || self.keywords.contains_key(&name) {
            tracing::warn!(keyword = %name, "keyword already defined, skipping re-registration");
            return false;
        }
        tracing::debug!(keyword = %name, "registered custom keyword");
        self.keywords.insert(name, Arc::new(definition));
        true
    }

    /// Look up a custom keyword.
    pub fn lookup(&self, name: &str) -> Option<&KeywordDefinition> {
        self.keywords.get(name).map(Arc::as_ref)
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<Arc<KeywordDefinition>> {
        self.keywords.get(name).cloned()
    }

    /// Register a custom format, with the same no-overwrite rule as
    /// keywords. Built-in format names are taken.
    pub fn register_format(&mut self, name: impl Into<String>, definition: FormatDefinition) -> bool {
        let name = name.into();
        if BUILTIN_FORMATS.contains(&name.as_str()) || self.formats.contains_key(&name) {
            tracing::warn!(format = %name, "format already defined, skipping re-registration");
            return false;
        }
        self.formats.insert(name, definition);
        true
    }

    /// Look up a format, custom registrations first, then built-ins.
    pub fn lookup_format(&self, name: &str) -> Option<FormatDefinition> {
        self.formats
            .get(name)
            .cloned()
            .or_else(|| builtin_format(name))
    }

    /// Whether `name` is a built-in or registered keyword.
    pub fn contains(&self, name: &str) -> bool {
        is_builtin_keyword(name) || self.keywords.contains_key(name)
    }

    /// The full vocabulary: built-in keywords, annotations and custom
    /// keywords, sorted.
    pub fn keywords(&self) -> Vec<&str> {
        let mut names: Vec<&str> = BUILTIN_KEYWORDS
            .iter()
            .chain(ANNOTATION_KEYWORDS)
            .copied()
            .chain(self.keywords.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names
    }

    /// Compile a schema value against this registry with default options.
    pub fn compile(&self, schema: &Value) -> Result<CompiledValidator, SchemaError> {
        Compiler::new(self).compile(&SchemaDocument::new(schema.clone()))
    }
}

fn is_builtin_keyword(name: &str) -> bool {
    BUILTIN_KEYWORDS.contains(&name) || ANNOTATION_KEYWORDS.contains(&name)
}
