//! Typed view of a table shape.

use super::ShapeError;
use super::slots::{FieldSlots, SlotLayout};
use crate::diagram::{PropertyValue, Shape};
use crate::schema::{Column, Table};

/// Attribute record layout: name, type, comment, primary, nullable, unique, default.
const ATTRIBUTE_ARITY: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct TableShape {
    pub name: String,
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    pub slots: FieldSlots,
}

impl TableShape {
    pub fn from_shape(shape: &Shape, layout: &SlotLayout) -> Result<Self, ShapeError> {
        let name = shape
            .property("name")
            .ok_or(ShapeError::MissingProperty("name"))?
            .as_str()
            .ok_or(ShapeError::WrongType("name"))?;
        if name.is_empty() {
            return Err(ShapeError::EmptyName);
        }

        let comment = match shape.property("comment") {
            None => None,
            Some(value) => value
                .as_optional_text()
                .ok_or(ShapeError::WrongType("comment"))?
                .map(str::to_owned),
        };

        let columns = match shape.property("attributes") {
            None | Some(PropertyValue::Null) => Vec::new(),
            Some(value) => value
                .as_list()
                .ok_or(ShapeError::WrongType("attributes"))?
                .iter()
                .enumerate()
                .map(|(index, record)| parse_column(index, record))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let fields = columns.iter().map(|c| c.name.clone()).collect();
        let slots = FieldSlots::new(fields, shape.connections.len(), layout);

        Ok(Self {
            name: name.to_string(),
            comment,
            columns,
            slots,
        })
    }

    /// Unresolved table, before references and keys are linked.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(self.name.clone(), self.columns.clone());
        table.comment = self.comment.clone();
        table
    }
}

fn parse_column(index: usize, record: &PropertyValue) -> Result<Column, ShapeError> {
    let malformed = |reason| ShapeError::MalformedAttribute { index, reason };

    let fields = record.as_list().ok_or(malformed("not a list"))?;
    if fields.len() < ATTRIBUTE_ARITY {
        return Err(malformed("expected seven fields"));
    }

    let text = |pos: usize, what| fields[pos].as_str().ok_or(malformed(what));
    let optional = |pos: usize, what| {
        fields[pos]
            .as_optional_text()
            .map(|s| s.map(str::to_owned))
            .ok_or(malformed(what))
    };
    let flag = |pos: usize, what| fields[pos].as_flag().ok_or(malformed(what));

    Ok(Column {
        name: text(0, "name is not text")?.to_string(),
        type_name: text(1, "type is not text")?.to_string(),
        comment: optional(2, "comment is not text")?,
        is_primary: flag(3, "primary flag is not 0 or 1")?,
        is_nullable: flag(4, "nullable flag is not 0 or 1")?,
        is_unique: flag(5, "unique flag is not 0 or 1")?,
        default: optional(6, "default is not text")?,
    })
}
