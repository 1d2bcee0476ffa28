//! # Compiler
//!
//! Turns a [`SchemaDocument`] into a [`CompiledValidator`] without looking
//! at any data. Compilation resolves custom keywords and formats against
//! the registry, compiles patterns, checks that `required` names are
//! declared, and validates each custom keyword binding's configuration.
//! Any failure aborts the whole compile; nothing is partially built.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::error::SchemaError;
use crate::format::FormatDefinition;
use crate::keyword::{KeywordDefinition, KeywordRegistry};
use crate::node::{SchemaDocument, SchemaNode, ROOT_LOCATION};
use crate::options::ValidatorOptions;
use crate::types::InstanceType;

/// Value-level rule of a compiled node.
#[derive(Debug, Clone)]
pub(crate) enum Check {
    Minimum(f64),
    Maximum(f64),
    MinLength(u64),
    MaxLength(u64),
    Pattern { source: String, regex: Regex },
    Format { name: String, definition: FormatDefinition },
    Enum(Vec<Value>),
}

/// A custom keyword bound to its configuration.
#[derive(Debug, Clone)]
pub(crate) struct BoundKeyword {
    pub(crate) name: String,
    pub(crate) config: Value,
    pub(crate) definition: Arc<KeywordDefinition>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledConditional {
    pub(crate) if_node: CompiledNode,
    pub(crate) then_node: Option<CompiledNode>,
    pub(crate) else_node: Option<CompiledNode>,
}

/// Executable mirror of a [`SchemaNode`].
#[derive(Debug, Clone)]
pub(crate) struct CompiledNode {
    pub(crate) location: String,
    pub(crate) types: Option<Vec<InstanceType>>,
    pub(crate) checks: Vec<Check>,
    pub(crate) properties: Vec<(String, CompiledNode)>,
    pub(crate) required: Vec<String>,
    pub(crate) additional_properties: bool,
    pub(crate) items: Option<Box<CompiledNode>>,
    pub(crate) min_items: Option<u64>,
    pub(crate) max_items: Option<u64>,
    pub(crate) unique_items: bool,
    pub(crate) all_of: Vec<CompiledNode>,
    pub(crate) conditional: Option<Box<CompiledConditional>>,
    pub(crate) keywords: Vec<BoundKeyword>,
}

/// Reusable, immutable validation routine for one schema.
///
/// ## Thread Safety
///
/// `CompiledValidator` is `Send + Sync` and cheap to clone; the compiled
/// plan is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CompiledValidator {
    pub(crate) root: Arc<CompiledNode>,
    pub(crate) options: ValidatorOptions,
}

impl CompiledValidator {
    /// Options the validator was compiled with.
    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }
}

/// Compiles schema documents against a keyword registry.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'r> {
    registry: &'r KeywordRegistry,
    options: ValidatorOptions,
}

impl<'r> Compiler<'r> {
    /// A compiler with default options.
    pub fn new(registry: &'r KeywordRegistry) -> Self {
        Self {
            registry,
            options: ValidatorOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Compile a schema document.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found; see its variants.
    pub fn compile(&self, document: &SchemaDocument) -> Result<CompiledValidator, SchemaError> {
        let node = SchemaNode::parse(document.as_value(), ROOT_LOCATION)?;
        self.compile_node(&node)
    }

    /// Compile an already parsed schema tree.
    pub fn compile_node(&self, node: &SchemaNode) -> Result<CompiledValidator, SchemaError> {
        let root = self.build(node)?;
        tracing::debug!(
            location = %node.location,
            strict = self.options.strict,
            "compiled schema"
        );
        Ok(CompiledValidator {
            root: Arc::new(root),
            options: self.options,
        })
    }

    fn build(&self, node: &SchemaNode) -> Result<CompiledNode, SchemaError> {
        let location = node.location.as_str();

        if let Some(props) = &node.properties {
            if let Some(missing) = node
                .required
                .iter()
                .find(|name| !props.iter().any(|(p, _)| p == *name))
            {
                return Err(SchemaError::RequiredNotDeclared {
                    property: missing.clone(),
                    location: location.to_string(),
                });
            }
        }

        let properties = match &node.properties {
            Some(props) => props
                .iter()
                .map(|(name, sub)| Ok((name.clone(), self.build(sub)?)))
                .collect::<Result<Vec<_>, SchemaError>>()?,
            None => Vec::new(),
        };

        let items = node
            .items
            .as_deref()
            .map(|sub| self.build(sub).map(Box::new))
            .transpose()?;

        let all_of = node
            .all_of
            .iter()
            .map(|m| self.build(m))
            .collect::<Result<Vec<_>, _>>()?;

        let conditional = match &node.conditional {
            Some(cond) => Some(Box::new(CompiledConditional {
                if_node: self.build(&cond.if_schema)?,
                then_node: cond.then_schema.as_ref().map(|n| self.build(n)).transpose()?,
                else_node: cond.else_schema.as_ref().map(|n| self.build(n)).transpose()?,
            })),
            None => None,
        };

        Ok(CompiledNode {
            location: location.to_string(),
            types: node.types.clone(),
            checks: self.checks(node)?,
            properties,
            required: node.required.clone(),
            additional_properties: node.additional_properties,
            items,
            min_items: node.min_items,
            max_items: node.max_items,
            unique_items: node.unique_items,
            all_of,
            conditional,
            keywords: self.bind_keywords(node)?,
        })
    }

    fn checks(&self, node: &SchemaNode) -> Result<Vec<Check>, SchemaError> {
        let mut checks = Vec::new();
        if let Some(min) = node.minimum {
            checks.push(Check::Minimum(min));
        }
        if let Some(max) = node.maximum {
            checks.push(Check::Maximum(max));
        }
        if let Some(n) = node.min_length {
            checks.push(Check::MinLength(n));
        }
        if let Some(n) = node.max_length {
            checks.push(Check::MaxLength(n));
        }
        if let Some(source) = &node.pattern {
            // Patterns must match the whole string.
            let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
                SchemaError::InvalidPattern {
                    pattern: source.clone(),
                    location: node.location.clone(),
                    reason: e.to_string(),
                }
            })?;
            checks.push(Check::Pattern {
                source: source.clone(),
                regex,
            });
        }
        if let Some(name) = &node.format {
            if self.options.validate_formats {
                match self.registry.lookup_format(name) {
                    Some(definition) => checks.push(Check::Format {
                        name: name.clone(),
                        definition,
                    }),
                    None if self.options.strict => {
                        return Err(SchemaError::UnknownFormat {
                            format: name.clone(),
                            location: node.location.clone(),
                        })
                    }
                    None => {
                        tracing::warn!(format = %name, location = %node.location, "unknown format ignored");
                    }
                }
            }
        }
        if let Some(values) = &node.enumeration {
            checks.push(Check::Enum(values.clone()));
        }
        Ok(checks)
    }

    fn bind_keywords(&self, node: &SchemaNode) -> Result<Vec<BoundKeyword>, SchemaError> {
        let mut bound = Vec::with_capacity(node.custom.len());
        for (name, config) in &node.custom {
            let Some(definition) = self.registry.resolve(name) else {
                if self.options.strict {
                    return Err(SchemaError::UnknownKeyword {
                        keyword: name.clone(),
                        location: node.location.clone(),
                    });
                }
                tracing::warn!(keyword = %name, location = %node.location, "unknown keyword ignored");
                continue;
            };

            if let Some(meta) = definition.config_validator() {
                let verdict = meta.validate(config);
                if !verdict.is_valid() {
                    let reason = verdict
                        .errors()
                        .iter()
                        .map(|e| format!("{}: {}", e.instance_path, e.message))
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(SchemaError::InvalidKeywordConfig {
                        keyword: name.clone(),
                        location: node.location.clone(),
                        reason,
                    });
                }
            }

            bound.push(BoundKeyword {
                name: name.clone(),
                config: config.clone(),
                definition,
            });
        }
        Ok(bound)
    }
}
