//! Typed views over raw diagram shapes.
//!
//! The adapter classifies every shape by its kind tag and turns the loose
//! property bags into typed records once, up front. Table shapes are indexed
//! by shape id so that handle endpoints can be mapped to `(table, field)`
//! pairs through each table's [`FieldSlots`].

mod reference;
pub mod slots;
mod table;

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

pub use reference::{CompoundKeyShape, REFERENCED_HANDLE, REFERENCING_HANDLE, ReferenceShape};
pub use slots::{FieldSlots, SlotLayout};
pub use table::TableShape;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::diagram::{
    COMPOUND_KIND, DiagramModel, Handle, PropertyValue, REFERENCE_KIND, Shape, ShapeId, TABLE_KIND,
};
use crate::schema::{DeleteAction, FieldRef};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("missing property `{0}`")]
    MissingProperty(&'static str),
    #[error("property `{0}` has the wrong type")]
    WrongType(&'static str),
    #[error("table name is empty")]
    EmptyName,
    #[error("attribute {index} is malformed: {reason}")]
    MalformedAttribute { index: usize, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeView<'a> {
    Table(&'a TableShape),
    Reference(ReferenceShape),
    Compound(CompoundKeyShape),
    Unknown { kind: &'a str },
}

pub struct Adapter<'m> {
    model: &'m DiagramModel,
    layout: SlotLayout,
    tables: HashMap<&'m ShapeId, TableShape>,
}

impl<'m> Adapter<'m> {
    /// Builds the typed table views. Invalid table shapes are reported and
    /// left out; handles attached to them count as unattached.
    pub fn new(model: &'m DiagramModel, layout: SlotLayout, sink: &mut impl DiagnosticSink) -> Self {
        let mut tables = HashMap::new();

        for shape in model.shapes.iter().filter(|s| s.kind == TABLE_KIND) {
            match TableShape::from_shape(shape, &layout) {
                Ok(table) => {
                    debug!(shape = shape.id.0, table = table.name, columns = table.columns.len(); "Table shape");
                    tables.insert(&shape.id, table);
                }
                Err(err) => sink.report(Diagnostic::warning(format!(
                    "Invalid table shape {}: {err}.",
                    shape.id
                ))),
            }
        }

        Self {
            model,
            layout,
            tables,
        }
    }

    /// One view per shape, in diagram order. Invalid tables are skipped.
    pub fn views(&self) -> impl Iterator<Item = ShapeView<'_>> {
        self.model.shapes.iter().filter_map(|shape| self.view(shape))
    }

    fn view<'a>(&'a self, shape: &'a Shape) -> Option<ShapeView<'a>> {
        match shape.kind.as_str() {
            TABLE_KIND => self.tables.get(&shape.id).map(ShapeView::Table),
            REFERENCE_KIND => Some(ShapeView::Reference(self.reference(shape))),
            COMPOUND_KIND => Some(ShapeView::Compound(self.compound(shape))),
            kind => Some(ShapeView::Unknown { kind }),
        }
    }

    /// Resolves a handle to the table and field it is attached to.
    pub fn endpoint(&self, handle: &Handle) -> Option<FieldRef> {
        let target = handle.connected_to.as_ref()?;
        let table = self.tables.get(&target.shape)?;
        Some(FieldRef::new(table.name.clone(), table.slots.field(target.slot)))
    }

    fn reference(&self, shape: &Shape) -> ReferenceShape {
        let endpoint = |index: usize| shape.handles.get(index).and_then(|h| self.endpoint(h));
        ReferenceShape {
            referenced: endpoint(REFERENCED_HANDLE),
            referencing: endpoint(REFERENCING_HANDLE),
            one_to_one: shape
                .property("end_point_desc")
                .and_then(PropertyValue::as_int)
                == Some(1),
            on_delete: DeleteAction::default(),
        }
    }

    fn compound(&self, shape: &Shape) -> CompoundKeyShape {
        // Elbow handles sit between the anchors; only anchors attach to tables.
        let anchors = shape
            .handles
            .iter()
            .filter(|h| h.connect_type == self.layout.anchor_connect_type)
            .map(|h| self.endpoint(h))
            .collect();
        CompoundKeyShape { anchors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::diagram::testing::{col, compound, model, reference, slot, table};

    fn shop() -> DiagramModel {
        model(vec![
            table("T1", "users", vec![col("id", "int").pk(), col("email", "text")]),
            table("T2", "orders", vec![col("id", "int"), col("user_id", "int")]),
            reference("R1", Some(("T1", slot(0))), Some(("T2", slot(1) + 1))),
            compound("C1", &[Some(("T2", slot(0))), Some(("T2", slot(1)))]),
        ])
    }

    #[test]
    fn test_classification() {
        let model = shop();
        let mut sink: Vec<Diagnostic> = Vec::new();
        let adapter = Adapter::new(&model, SlotLayout::default(), &mut sink);
        let views: Vec<_> = adapter.views().collect();

        assert!(sink.is_empty());
        assert_eq!(views.len(), 4);
        assert!(matches!(views[0], ShapeView::Table(t) if t.name == "users"));
        assert!(matches!(views[1], ShapeView::Table(t) if t.name == "orders"));
        assert!(matches!(views[2], ShapeView::Reference(_)));
        assert!(matches!(views[3], ShapeView::Compound(_)));
    }

    #[test]
    fn test_reference_endpoints() {
        let model = shop();
        let adapter = Adapter::new(&model, SlotLayout::default(), &mut Vec::<Diagnostic>::new());
        let Some(ShapeView::Reference(r)) = adapter.views().nth(2) else {
            panic!("expected a reference view");
        };

        assert_eq!(r.referenced, Some(FieldRef::new("users", Some("id"))));
        assert_eq!(r.referencing, Some(FieldRef::new("orders", Some("user_id"))));
        assert!(!r.one_to_one);
        assert_eq!(r.on_delete, DeleteAction::Restrict);
    }

    #[test]
    fn test_compound_skips_elbow_handles() {
        let model = shop();
        let adapter = Adapter::new(&model, SlotLayout::default(), &mut Vec::<Diagnostic>::new());
        let Some(ShapeView::Compound(c)) = adapter.views().nth(3) else {
            panic!("expected a compound view");
        };

        assert_eq!(
            c.anchors,
            vec![
                Some(FieldRef::new("orders", Some("id"))),
                Some(FieldRef::new("orders", Some("user_id"))),
            ]
        );
    }

    #[test]
    fn test_out_of_range_slot_keeps_table() {
        let model = model(vec![
            table("T1", "users", vec![col("id", "int")]),
            reference("R1", Some(("T1", 3)), Some(("T1", slot(5)))),
        ]);
        let adapter = Adapter::new(&model, SlotLayout::default(), &mut Vec::<Diagnostic>::new());
        let Some(ShapeView::Reference(r)) = adapter.views().nth(1) else {
            panic!("expected a reference view");
        };

        assert_eq!(r.referenced, Some(FieldRef::new("users", None)));
        assert_eq!(r.referencing, Some(FieldRef::new("users", None)));
    }

    #[test]
    fn test_handle_on_non_table_is_absent() {
        let model = model(vec![
            table("T1", "users", vec![col("id", "int")]),
            compound("C1", &[]),
            reference("R1", Some(("C1", 0)), Some(("missing", 0))),
        ]);
        let adapter = Adapter::new(&model, SlotLayout::default(), &mut Vec::<Diagnostic>::new());
        let Some(ShapeView::Reference(r)) = adapter.views().nth(2) else {
            panic!("expected a reference view");
        };

        assert_eq!(r.referenced, None);
        assert_eq!(r.referencing, None);
    }

    #[test]
    fn test_unknown_and_invalid_shapes() {
        let mut broken = table("T2", "broken", vec![]);
        broken.properties.remove("name");
        let mut note = table("N1", "", vec![]);
        note.kind = "Standard - Text".into();

        let model = model(vec![table("T1", "users", vec![]), broken, note]);
        let mut sink: Vec<Diagnostic> = Vec::new();
        let adapter = Adapter::new(&model, SlotLayout::default(), &mut sink);
        let views: Vec<_> = adapter.views().collect();

        assert_eq!(sink.len(), 1);
        assert!(sink[0].message.starts_with("Invalid table shape T2"));
        assert_eq!(views.len(), 2);
        assert_eq!(views[1], ShapeView::Unknown { kind: "Standard - Text" });
    }

    #[test]
    fn test_one_to_one() {
        let mut shape = reference("R1", None, None);
        shape
            .properties
            .insert("end_point_desc".into(), PropertyValue::Int(1));
        let model = model(vec![shape]);
        let adapter = Adapter::new(&model, SlotLayout::default(), &mut Vec::<Diagnostic>::new());
        let Some(ShapeView::Reference(r)) = adapter.views().next() else {
            panic!("expected a reference view");
        };
        assert!(r.one_to_one);
    }
}
