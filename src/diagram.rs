//! Read-only snapshot of a database diagram as handed over by the editor.
//!
//! The snapshot mirrors the editor's object graph: an ordered list of shapes,
//! each with a kind tag, a property bag, its connection points and its
//! handles. Nothing here interprets the graph; see [`crate::adapter`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::error::Error;

pub const TABLE_KIND: &str = "Database - Table";
pub const REFERENCE_KIND: &str = "Database - Reference";
pub const COMPOUND_KIND: &str = "Database - Compound";

/// Identifier of a shape inside one diagram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub String);

impl ShapeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The whole diagram, shapes in the editor's iteration order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagramModel {
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl DiagramModel {
    /// Parse a JSON snapshot.
    pub fn from_json(source: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(source)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub connections: Vec<ConnectionPoint>,
    #[serde(default)]
    pub handles: Vec<Handle>,
}

impl Shape {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// A loosely typed property value. Attribute lists are nested `List`s.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Editor flags are stored as `0|1`; only an exact `1` (or `true`) is set.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Null => Some(false),
            Self::Bool(b) => Some(*b),
            Self::Int(n) => Some(*n == 1),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Optional text: `Null` and the empty string both mean "none".
    pub fn as_optional_text(&self) -> Option<Option<&str>> {
        match self {
            Self::Null => Some(None),
            Self::Str(s) if s.is_empty() => Some(None),
            Self::Str(s) => Some(Some(s)),
            _ => None,
        }
    }
}

/// A connection slot on a shape. Its index is its position in
/// [`Shape::connections`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionPoint {
    #[serde(default)]
    pub connected: bool,
}

/// A control point of a shape, possibly attached to another shape's slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Handle {
    #[serde(default)]
    pub connect_type: u8,
    #[serde(default)]
    pub connected_to: Option<SlotRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlotRef {
    pub shape: ShapeId,
    pub slot: usize,
}
