//! Typed views of reference and compound-key connectors.

use crate::schema::{DeleteAction, FieldRef};

/// Handle bound to the referenced (target) table.
pub const REFERENCED_HANDLE: usize = 0;
/// Handle bound to the referencing table, the owner of the foreign key.
pub const REFERENCING_HANDLE: usize = 1;

/// A reference arrow. Each end is `None` when its handle is not attached to
/// a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceShape {
    pub referenced: Option<FieldRef>,
    pub referencing: Option<FieldRef>,
    pub one_to_one: bool,
    pub on_delete: DeleteAction,
}

/// A compound-key connector: one entry per table anchor, in handle order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundKeyShape {
    pub anchors: Vec<Option<FieldRef>>,
}

impl CompoundKeyShape {
    /// Table names of the anchors, `?` for an unattached one.
    pub fn describe(&self) -> String {
        let names: Vec<&str> = self
            .anchors
            .iter()
            .map(|a| a.as_ref().map_or("?", |f| f.table.as_str()))
            .collect();
        format!("({})", names.join(", "))
    }
}
