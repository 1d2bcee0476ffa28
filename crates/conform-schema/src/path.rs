//! # Instance Paths
//!
//! Location of a value inside the validated document, as a sequence of
//! property names and array indices. Rendered as a JSON Pointer, with the
//! empty (root) path rendered as `(root)`.

use std::fmt;

use serde::{Serialize, Serializer};

/// One step into a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member.
    Property(String),
    /// Array element.
    Index(usize),
}

/// Path from the document root to a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InstancePath {
    segments: Vec<PathSegment>,
}

impl InstancePath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// A child path naming an object member.
    pub fn property(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Property(name.to_string()));
        Self { segments }
    }

    /// A child path naming an array element.
    pub fn index(&self, i: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(i));
        Self { segments }
    }

    /// True for the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// RFC 6901 JSON Pointer form. The root is the empty string.
    pub fn pointer(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            out.push('/');
            match seg {
                PathSegment::Property(name) => {
                    out.push_str(&name.replace('~', "~0").replace('/', "~1"))
                }
                PathSegment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("(root)")
        } else {
            f.write_str(&self.pointer())
        }
    }
}

impl Serialize for InstancePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.pointer())
    }
}
