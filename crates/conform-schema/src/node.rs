//! # Schema Documents and Nodes
//!
//! A [`SchemaDocument`] is the raw JSON value a caller hands in (optionally
//! read from YAML). [`SchemaNode::parse`] turns it into a typed tree,
//! rejecting malformed keyword values. Keys outside the built-in vocabulary
//! and the annotation list are kept as custom keyword bindings; whether
//! they are registered is decided by the compiler.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::types::InstanceType;

/// Keywords with built-in evaluation semantics.
pub const BUILTIN_KEYWORDS: &[&str] = &[
    "type",
    "properties",
    "items",
    "required",
    "additionalProperties",
    "minimum",
    "maximum",
    "minLength",
    "maxLength",
    "pattern",
    "format",
    "enum",
    "minItems",
    "maxItems",
    "uniqueItems",
    "allOf",
    "if",
    "then",
    "else",
];

/// Keys carrying metadata only. Accepted anywhere and never evaluated.
pub const ANNOTATION_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$vocabulary",
    "$comment",
    "title",
    "description",
    "default",
    "examples",
    "deprecated",
    "readOnly",
    "writeOnly",
];

/// Location of the document root.
pub const ROOT_LOCATION: &str = "#";

/// A schema as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    root: Value,
}

impl SchemaDocument {
    /// Wrap an in-memory schema value.
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse a JSON schema document.
    pub fn from_json_str(s: &str) -> Result<Self, SchemaError> {
        Ok(Self::new(serde_json::from_str(s)?))
    }

    /// Parse a YAML schema document. Only the JSON-compatible subset of
    /// YAML is accepted.
    pub fn from_yaml_str(s: &str) -> Result<Self, SchemaError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(s)?;
        Ok(Self::new(yaml_to_json_value(&yaml).map_err(SchemaError::Parse)?))
    }

    /// The raw schema value.
    pub fn as_value(&self) -> &Value {
        &self.root
    }
}

impl From<Value> for SchemaDocument {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

/// `if` / `then` / `else` attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    /// Probe schema.
    pub if_schema: SchemaNode,
    /// Applied when the probe passes.
    pub then_schema: Option<SchemaNode>,
    /// Applied when the probe fails.
    pub else_schema: Option<SchemaNode>,
}

/// Typed, immutable form of one schema object.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// JSON-pointer fragment locating this node in its document.
    pub location: String,
    /// Accepted instance types; `None` accepts any.
    pub types: Option<Vec<InstanceType>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub enumeration: Option<Vec<Value>>,
    /// Declared properties in document order. `None` when the node has no
    /// `properties` keyword at all.
    pub properties: Option<Vec<(String, SchemaNode)>>,
    pub required: Vec<String>,
    pub additional_properties: bool,
    pub items: Option<Box<SchemaNode>>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub all_of: Vec<SchemaNode>,
    pub conditional: Option<Box<Conditional>>,
    /// Non-built-in keys with their configuration values.
    pub custom: Vec<(String, Value)>,
}

impl SchemaNode {
    fn empty(location: &str) -> Self {
        Self {
            location: location.to_string(),
            types: None,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            pattern: None,
            format: None,
            enumeration: None,
            properties: None,
            required: Vec::new(),
            additional_properties: true,
            items: None,
            min_items: None,
            max_items: None,
            unique_items: false,
            all_of: Vec::new(),
            conditional: None,
            custom: Vec::new(),
        }
    }

    /// Parse a schema value rooted at `location`.
    pub fn parse(value: &Value, location: &str) -> Result<Self, SchemaError> {
        let Value::Object(obj) = value else {
            return Err(malformed(location, "schema must be an object"));
        };
        let mut node = Self::empty(location);

        for (key, v) in obj {
            match key.as_str() {
                "type" => node.types = Some(parse_types(v, location)?),
                "minimum" => node.minimum = Some(number(v, location, key)?),
                "maximum" => node.maximum = Some(number(v, location, key)?),
                "minLength" => node.min_length = Some(count(v, location, key)?),
                "maxLength" => node.max_length = Some(count(v, location, key)?),
                "minItems" => node.min_items = Some(count(v, location, key)?),
                "maxItems" => node.max_items = Some(count(v, location, key)?),
                "pattern" => node.pattern = Some(string(v, location, key)?),
                "format" => node.format = Some(string(v, location, key)?),
                "uniqueItems" => node.unique_items = boolean(v, location, key)?,
                "additionalProperties" => {
                    node.additional_properties = boolean(v, location, key)?
                }
                "enum" => match v {
                    Value::Array(values) if !values.is_empty() => {
                        node.enumeration = Some(values.clone())
                    }
                    _ => return Err(malformed(location, "enum must be a non-empty array")),
                },
                "required" => node.required = parse_required(v, location)?,
                "properties" => node.properties = Some(parse_properties(v, location)?),
                "items" => {
                    let loc = format!("{location}/items");
                    node.items = Some(Box::new(Self::parse(v, &loc)?));
                }
                "allOf" => node.all_of = parse_all_of(v, location)?,
                // Conditional keys are assembled after the loop.
                "if" | "then" | "else" => {}
                k if ANNOTATION_KEYWORDS.contains(&k) => {}
                _ => node.custom.push((key.clone(), v.clone())),
            }
        }

        node.conditional = parse_conditional(obj, location)?;
        Ok(node)
    }

    /// Property schema by name.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .as_ref()?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }
}

fn malformed(location: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::Malformed {
        location: location.to_string(),
        reason: reason.into(),
    }
}

fn escape(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

fn parse_types(v: &Value, location: &str) -> Result<Vec<InstanceType>, SchemaError> {
    let one = |s: &Value| -> Result<InstanceType, SchemaError> {
        s.as_str()
            .ok_or_else(|| malformed(location, "type names must be strings"))?
            .parse()
            .map_err(|e: String| malformed(location, e))
    };
    match v {
        Value::String(_) => Ok(vec![one(v)?]),
        Value::Array(names) if !names.is_empty() => names.iter().map(one).collect(),
        _ => Err(malformed(
            location,
            "type must be a string or a non-empty array of strings",
        )),
    }
}

fn number(v: &Value, location: &str, key: &str) -> Result<f64, SchemaError> {
    v.as_f64()
        .ok_or_else(|| malformed(location, format!("{key} must be a number")))
}

fn count(v: &Value, location: &str, key: &str) -> Result<u64, SchemaError> {
    v.as_u64()
        .or_else(|| {
            v.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
        .ok_or_else(|| malformed(location, format!("{key} must be a non-negative integer")))
}

fn string(v: &Value, location: &str, key: &str) -> Result<String, SchemaError> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(location, format!("{key} must be a string")))
}

fn boolean(v: &Value, location: &str, key: &str) -> Result<bool, SchemaError> {
    v.as_bool()
        .ok_or_else(|| malformed(location, format!("{key} must be a boolean")))
}

fn parse_required(v: &Value, location: &str) -> Result<Vec<String>, SchemaError> {
    let Value::Array(names) = v else {
        return Err(malformed(location, "required must be an array of strings"));
    };
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name
            .as_str()
            .ok_or_else(|| malformed(location, "required must be an array of strings"))?;
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    Ok(out)
}

fn parse_properties(
    v: &Value,
    location: &str,
) -> Result<Vec<(String, SchemaNode)>, SchemaError> {
    let Value::Object(props) = v else {
        return Err(malformed(location, "properties must be an object"));
    };
    props
        .iter()
        .map(|(name, sub)| {
            let loc = format!("{location}/properties/{}", escape(name));
            Ok((name.clone(), SchemaNode::parse(sub, &loc)?))
        })
        .collect()
}

fn parse_all_of(v: &Value, location: &str) -> Result<Vec<SchemaNode>, SchemaError> {
    match v {
        Value::Array(members) if !members.is_empty() => members
            .iter()
            .enumerate()
            .map(|(i, m)| SchemaNode::parse(m, &format!("{location}/allOf/{i}")))
            .collect(),
        _ => Err(malformed(location, "allOf must be a non-empty array of schemas")),
    }
}

fn parse_conditional(
    obj: &Map<String, Value>,
    location: &str,
) -> Result<Option<Box<Conditional>>, SchemaError> {
    let branch = |key: &str| -> Result<Option<SchemaNode>, SchemaError> {
        obj.get(key)
            .map(|v| SchemaNode::parse(v, &format!("{location}/{key}")))
            .transpose()
    };
    // `then`/`else` without `if` have no effect, but are still checked.
    let then_schema = branch("then")?;
    let else_schema = branch("else")?;
    let Some(if_schema) = branch("if")? else {
        return Ok(None);
    };
    Ok(Some(Box::new(Conditional {
        if_schema,
        then_schema,
        else_schema,
    })))
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Schema documents use only the JSON-compatible subset of YAML; tags are
/// dropped and non-string map keys are stringified.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
