use std::collections::HashMap;

use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn from_tag_name(name: &[u8]) -> Option<ElementKind> {
        match name {
            b"node" => Some(ElementKind::Node),
            b"way" => Some(ElementKind::Way),
            b"relation" => Some(ElementKind::Relation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

/// One sub-tag of an element, exactly as it appears in the document.
#[derive(Debug, Clone)]
pub struct RawTag {
    pub key: String,
    pub value: String,
}

/// One `<member>` entry of a relation.
#[derive(Debug, Clone)]
pub struct RawMember {
    pub member_ref: String,
    pub role: String,
    pub member_type: String,
}

/// One element subtree lifted out of the source document. Materialized by the
/// stream driver for a single iteration, consumed by the shaper, then dropped.
#[derive(Debug)]
pub struct RawElement {
    pub kind: ElementKind,
    pub attributes: HashMap<String, String>,
    pub tags: Vec<RawTag>,
    /// Ordered `<nd ref=...>` entries of a way.
    pub node_refs: Vec<String>,
    /// Ordered `<member>` entries of a relation.
    pub members: Vec<RawMember>,
}

impl RawElement {
    pub fn new(kind: ElementKind) -> RawElement {
        RawElement {
            kind,
            attributes: HashMap::new(),
            tags: Vec::new(),
            node_refs: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Result<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| {
                format!(
                    "{} element missing required attribute '{}'",
                    self.kind.as_str(),
                    name
                )
                .into()
            })
    }
}
