//! Links references and compound keys to their tables and settles each
//! table's primary key.
//!
//! Tables are indexed first; references and compound keys are then linked in
//! diagram order. Nothing here aborts: malformed connectors are reported and
//! dropped, conflicting primary flags are reported and degraded.

use indexmap::IndexMap;
use log::{debug, info};

use crate::adapter::{Adapter, CompoundKeyShape, ReferenceShape, ShapeView, TableShape};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::schema::{CompoundKey, FieldRef, PrimaryKey, Reference, Schema, Table};

/// Resolve every view of `adapter` into a [`Schema`].
pub fn resolve(adapter: &Adapter<'_>, sink: &mut impl DiagnosticSink) -> Schema {
    let mut resolver = Resolver::default();

    for view in adapter.views() {
        if let ShapeView::Table(table) = view {
            resolver.add_table(table, sink);
        }
    }

    for view in adapter.views() {
        match view {
            ShapeView::Table(_) => {}
            ShapeView::Reference(reference) => resolver.link_reference(reference, sink),
            ShapeView::Compound(compound) => resolver.attach_compound(compound, sink),
            ShapeView::Unknown { kind } => {
                sink.report(Diagnostic::warning(format!("Unknown type: {kind}.")))
            }
        }
    }

    let schema = resolver.finish(sink);
    info!(
        tables = schema.tables.len(),
        references = schema.references.len();
        "Resolved schema"
    );
    schema
}

#[derive(Default)]
struct Resolver {
    tables: IndexMap<String, Table>,
    references: Vec<Reference>,
}

impl Resolver {
    fn add_table(&mut self, shape: &TableShape, sink: &mut impl DiagnosticSink) {
        // Insertion keeps the first position of a name; the later shape wins.
        if self.tables.insert(shape.name.clone(), shape.to_table()).is_some() {
            sink.report(Diagnostic::warning(format!(
                "Duplicate table name {}; the later table replaces the earlier one.",
                shape.name
            )));
        }
    }

    fn link_reference(&mut self, shape: ReferenceShape, sink: &mut impl DiagnosticSink) {
        let (referencing, referenced) = match (shape.referencing, shape.referenced) {
            (Some(referencing), Some(referenced)) => (referencing, referenced),
            (Some(referencing), None) => {
                sink.report(Diagnostic::warning(format!(
                    "Disconnected reference to {}.",
                    referencing.table
                )));
                return;
            }
            (None, Some(referenced)) => {
                sink.report(Diagnostic::warning(format!(
                    "Disconnected reference from {}.",
                    referenced.table
                )));
                return;
            }
            (None, None) => {
                sink.report(Diagnostic::warning("Diagram contains disconnected reference."));
                return;
            }
        };

        for end in [&referencing, &referenced] {
            report_unresolved_field(end, "Reference", sink);
        }

        let reference = Reference {
            referencing,
            referenced,
            one_to_one: shape.one_to_one,
            on_delete: shape.on_delete,
        };
        debug!(
            from = reference.referencing.to_string(),
            to = reference.referenced.to_string();
            "Linked reference"
        );

        if let Some(table) = self.tables.get_mut(&reference.referenced.table) {
            table.references.push(reference.clone());
        }
        self.references.push(reference);
    }

    fn attach_compound(&mut self, shape: CompoundKeyShape, sink: &mut impl DiagnosticSink) {
        let description = shape.describe();
        let anchors: Option<Vec<FieldRef>> = shape.anchors.into_iter().collect();

        let anchors = match anchors {
            Some(anchors) if !anchors.is_empty() => anchors,
            _ => {
                sink.report(Diagnostic::warning(format!(
                    "Disconnected compound key {description}."
                )));
                return;
            }
        };

        let table_name = anchors[0].table.clone();
        if anchors.iter().any(|a| a.table != table_name) {
            sink.report(Diagnostic::warning(format!(
                "Compound key connected to more than one table {description}."
            )));
            return;
        }

        for anchor in &anchors {
            report_unresolved_field(anchor, "Compound key", sink);
        }

        let Some(table) = self.tables.get_mut(&table_name) else {
            return;
        };
        if table.compound_key().is_some() {
            sink.report(Diagnostic::warning(format!(
                "Table {table_name} already has a compound key; the later one replaces it."
            )));
        }

        debug!(table = table_name, fields = anchors.len(); "Attached compound key");
        table.primary_key = PrimaryKey::Compound(CompoundKey {
            table: table_name,
            fields: anchors.into_iter().map(|a| a.field).collect(),
        });
    }

    fn finish(mut self, sink: &mut impl DiagnosticSink) -> Schema {
        for table in self.tables.values_mut() {
            settle_primary_column(table, sink);
        }

        Schema {
            tables: self.tables,
            references: self.references,
        }
    }
}

/// Without a compound key, the first column flagged primary is the key.
fn settle_primary_column(table: &mut Table, sink: &mut impl DiagnosticSink) {
    if table.compound_key().is_some() {
        return;
    }

    let mut flagged = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_primary);

    let Some((first, first_column)) = flagged.next() else {
        return;
    };

    for (_, column) in flagged {
        sink.report(Diagnostic::warning(format!(
            "Multiple keys with no compound definition in {}. Previous '{}' current '{}'.",
            table.name, first_column.name, column.name
        )));
    }

    table.primary_key = PrimaryKey::Column(first);
}

fn report_unresolved_field(end: &FieldRef, what: &str, sink: &mut impl DiagnosticSink) {
    if end.field.is_none() {
        sink.report(Diagnostic::notice(format!(
            "{what} attached to table `{}` at a slot outside any field; rendering an empty field name.",
            end.table
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SlotLayout;
    use crate::ddl::create_table_sql;
    use crate::diagnostics::{Diagnostic, Severity};
    use crate::diagram::DiagramModel;
    use crate::diagram::testing::{col, compound, model, reference, slot, table};

    fn run(model: &DiagramModel) -> (Schema, Vec<Diagnostic>) {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let adapter = Adapter::new(model, SlotLayout::default(), &mut sink);
        let schema = resolve(&adapter, &mut sink);
        (schema, sink)
    }

    fn warnings(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.message.as_str())
            .collect()
    }

    fn users_and_orders(extra: Vec<crate::diagram::Shape>) -> DiagramModel {
        let mut shapes = vec![
            table("T1", "users", vec![col("id", "int").pk(), col("email", "text")]),
            table("T2", "orders", vec![col("id", "int"), col("user_id", "int")]),
        ];
        shapes.extend(extra);
        model(shapes)
    }

    #[test]
    fn test_well_formed_reference() {
        let model = users_and_orders(vec![reference(
            "R1",
            Some(("T1", slot(0))),
            Some(("T2", slot(1))),
        )]);
        let (schema, diagnostics) = run(&model);

        assert!(diagnostics.is_empty());
        assert_eq!(schema.references.len(), 1);
        let r = &schema.references[0];
        assert_eq!(r.referencing, FieldRef::new("orders", Some("user_id")));
        assert_eq!(r.referenced, FieldRef::new("users", Some("id")));
        assert_eq!(schema.tables["users"].references, vec![r.clone()]);
        assert!(schema.tables["orders"].references.is_empty());
    }

    #[test]
    fn test_reference_before_tables() {
        let model = model(vec![
            reference("R1", Some(("T1", slot(0))), Some(("T2", slot(0)))),
            table("T1", "a", vec![col("id", "int")]),
            table("T2", "b", vec![col("a_id", "int")]),
        ]);
        let (schema, diagnostics) = run(&model);

        assert!(diagnostics.is_empty());
        assert_eq!(schema.references.len(), 1);
    }

    #[test]
    fn test_disconnected_references() {
        let model = users_and_orders(vec![
            reference("R1", None, Some(("T2", slot(1)))),
            reference("R2", Some(("T1", slot(0))), None),
            reference("R3", None, None),
            reference("R4", Some(("T1", slot(0))), Some(("T2", slot(1)))),
        ]);
        let (schema, diagnostics) = run(&model);

        assert_eq!(
            warnings(&diagnostics),
            vec![
                "Disconnected reference to orders.",
                "Disconnected reference from users.",
                "Diagram contains disconnected reference.",
            ]
        );
        // Every reference shape is either rendered or warned about.
        assert_eq!(schema.references.len() + warnings(&diagnostics).len(), 4);
    }

    #[test]
    fn test_reference_with_unresolved_field() {
        let model = users_and_orders(vec![reference(
            "R1",
            Some(("T1", 2)),
            Some(("T2", slot(1))),
        )]);
        let (schema, diagnostics) = run(&model);

        assert_eq!(schema.references.len(), 1);
        assert_eq!(schema.references[0].referenced.field, None);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Notice);
    }

    #[test]
    fn test_compound_key_attached() {
        let model = users_and_orders(vec![compound(
            "C1",
            &[Some(("T2", slot(1))), Some(("T2", slot(0) + 1))],
        )]);
        let (schema, diagnostics) = run(&model);

        assert!(diagnostics.is_empty());
        let key = schema.tables["orders"].compound_key().unwrap();
        assert_eq!(key.field_names().collect::<Vec<_>>(), vec!["user_id", "id"]);
    }

    #[test]
    fn test_compound_key_with_unresolved_field() {
        let model = users_and_orders(vec![compound(
            "C1",
            &[Some(("T2", slot(0))), Some(("T2", 3))],
        )]);
        let (schema, diagnostics) = run(&model);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Notice);
        assert_eq!(
            diagnostics[0].message,
            "Compound key attached to table `orders` at a slot outside any field; \
             rendering an empty field name."
        );

        let orders = &schema.tables["orders"];
        let key = orders.compound_key().unwrap();
        assert_eq!(key.fields, vec![Some("id".to_string()), None]);
        assert!(create_table_sql(orders).contains("\tPRIMARY KEY (id, )\n"));
    }

    #[test]
    fn test_compound_key_across_tables() {
        let model = users_and_orders(vec![compound(
            "C1",
            &[Some(("T1", slot(0))), Some(("T2", slot(0)))],
        )]);
        let (schema, diagnostics) = run(&model);

        assert_eq!(
            warnings(&diagnostics),
            vec!["Compound key connected to more than one table (users, orders)."]
        );
        assert!(schema.tables["orders"].compound_key().is_none());
        assert!(schema.tables["users"].compound_key().is_none());
        // users keeps its single primary column.
        assert_eq!(schema.tables["users"].primary_key, PrimaryKey::Column(0));
    }

    #[test]
    fn test_disconnected_compound_key() {
        let model = users_and_orders(vec![
            compound("C1", &[Some(("T2", slot(0))), None]),
            compound("C2", &[]),
        ]);
        let (schema, diagnostics) = run(&model);

        assert_eq!(
            warnings(&diagnostics),
            vec![
                "Disconnected compound key (orders, ?).",
                "Disconnected compound key ().",
            ]
        );
        assert!(schema.tables["orders"].compound_key().is_none());
    }

    #[test]
    fn test_compound_key_replaced() {
        let model = users_and_orders(vec![
            compound("C1", &[Some(("T2", slot(0)))]),
            compound("C2", &[Some(("T2", slot(1)))]),
        ]);
        let (schema, diagnostics) = run(&model);

        assert_eq!(
            warnings(&diagnostics),
            vec!["Table orders already has a compound key; the later one replaces it."]
        );
        let key = schema.tables["orders"].compound_key().unwrap();
        assert_eq!(key.field_names().collect::<Vec<_>>(), vec!["user_id"]);
    }

    #[test]
    fn test_compound_key_overrides_primary_flag() {
        let model = users_and_orders(vec![compound(
            "C1",
            &[Some(("T1", slot(0))), Some(("T1", slot(1)))],
        )]);
        let (schema, _) = run(&model);

        assert!(schema.tables["users"].primary_column().is_none());
        assert!(schema.tables["users"].compound_key().is_some());
    }

    #[test]
    fn test_multiple_primary_flags() {
        let model = model(vec![table(
            "T1",
            "pairs",
            vec![col("a", "int").pk(), col("b", "int").pk(), col("c", "int").pk()],
        )]);
        let (schema, diagnostics) = run(&model);

        assert_eq!(
            warnings(&diagnostics),
            vec![
                "Multiple keys with no compound definition in pairs. Previous 'a' current 'b'.",
                "Multiple keys with no compound definition in pairs. Previous 'a' current 'c'.",
            ]
        );
        assert_eq!(schema.tables["pairs"].primary_key, PrimaryKey::Column(0));
    }

    #[test]
    fn test_duplicate_table_name() {
        let model = model(vec![
            table("T1", "users", vec![col("id", "int")]),
            table("T2", "orders", vec![]),
            table("T3", "users", vec![col("uid", "int")]),
        ]);
        let (schema, diagnostics) = run(&model);

        assert_eq!(warnings(&diagnostics).len(), 1);
        let names: Vec<_> = schema.tables.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["users", "orders"]);
        assert_eq!(schema.tables["users"].columns[0].name, "uid");
    }

    #[test]
    fn test_unknown_shape() {
        let mut note = table("N1", "", vec![]);
        note.kind = "Standard - Text".into();
        let (schema, diagnostics) = run(&model(vec![note]));

        assert!(schema.tables.is_empty());
        assert_eq!(warnings(&diagnostics), vec!["Unknown type: Standard - Text."]);
    }
}
