//! PostgreSQL DDL rendering of a resolved [`Schema`].

use crate::measure::{max_width, pad_right};
use crate::schema::{Column, PrimaryKey, Reference, Schema, Table};

/// Leading comment block of the script.
#[derive(Debug, Clone, Copy, Default)]
pub struct Header<'a> {
    pub generated_at: &'a str,
    pub source: Option<&'a str>,
}

/// Render the whole script.
pub fn render(schema: &Schema, header: &Header<'_>) -> String {
    let mut sql = header_sql(header);

    sql.push_str(&drop_tables_sql(schema.tables.keys().map(String::as_str)));

    for table in schema.tables.values() {
        sql.push_str(&create_table_sql(table));
        sql.push_str("\n\n");
    }

    sql.push_str(&foreign_keys_sql(&schema.references));
    sql
}

pub fn header_sql(header: &Header<'_>) -> String {
    let mut sql = String::from("\n");
    if let Some(source) = header.source {
        sql.push_str(&format!("-- Generated from {source}\n"));
    }
    sql.push_str(&format!("-- Generated at {}\n\n", header.generated_at));
    sql
}

pub fn drop_tables_sql<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut sql = String::new();
    for name in names {
        sql.push_str(&format!("DROP TABLE IF EXISTS {name} CASCADE;\n"));
    }
    sql.push('\n');
    sql
}

/// `CREATE TABLE` statement, ending at `);` with no trailing newline.
pub fn create_table_sql(table: &Table) -> String {
    let mut sql = String::new();
    if let Some(comment) = &table.comment {
        sql.push_str(&format!("-- {comment}\n"));
    }
    sql.push_str(&format!("CREATE TABLE {} (\n", table.name));

    let width = max_width(table.columns.iter().map(|c| c.name.as_str()));
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| column_sql(column, width, table.primary_key.is_column(i)))
        .collect();

    if let PrimaryKey::Compound(key) = &table.primary_key {
        let fields: Vec<&str> = key.field_names().collect();
        lines.push(format!("\tPRIMARY KEY ({})", fields.join(", ")));
    }

    sql.push_str(&lines.join(",\n"));
    sql.push_str("\n);");
    sql
}

fn column_sql(column: &Column, width: usize, is_primary_key: bool) -> String {
    let mut line = String::new();
    if let Some(comment) = &column.comment {
        line.push_str(&format!("\t-- {comment}\n"));
    }
    line.push_str(&format!(
        "\t{}\t{}\t",
        pad_right(&column.name, width),
        column.type_name
    ));

    if is_primary_key {
        line.push_str("PRIMARY KEY ");
    } else {
        if column.is_unique {
            line.push_str("UNIQUE ");
        }
        if !column.is_nullable {
            line.push_str("NOT NULL ");
        }
    }

    if let Some(default) = &column.default {
        line.push_str(&format!("DEFAULT {default} "));
    }
    line
}

/// One `ALTER TABLE` per reference, as a single batch closed by `;`.
pub fn foreign_keys_sql(references: &[Reference]) -> String {
    let statements: Vec<String> = references.iter().map(foreign_key_sql).collect();
    format!("{};\n\n", statements.join(";\n"))
}

// TODO: render `ON DELETE` once the diagram carries a delete policy per reference.
fn foreign_key_sql(reference: &Reference) -> String {
    format!(
        "ALTER TABLE ONLY {} ADD FOREIGN KEY ({}) REFERENCES {} ({})",
        reference.referencing.table,
        reference.referencing.field_name(),
        reference.referenced.table,
        reference.referenced.field_name()
    )
}
