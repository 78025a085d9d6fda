use std::fmt;

use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Tables keyed by name, in first-seen order.
    pub tables: IndexMap<String, Table>,
    /// Well-formed references only, in diagram order.
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    pub primary_key: PrimaryKey,
    /// References pointing at this table.
    pub references: Vec<Reference>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            columns,
            primary_key: PrimaryKey::None,
            references: Vec::new(),
        }
    }

    pub fn compound_key(&self) -> Option<&CompoundKey> {
        match &self.primary_key {
            PrimaryKey::Compound(key) => Some(key),
            _ => None,
        }
    }

    pub fn primary_column(&self) -> Option<&Column> {
        match self.primary_key {
            PrimaryKey::Column(index) => self.columns.get(index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub type_name: String,
    pub comment: Option<String>,
    pub is_primary: bool,
    pub is_nullable: bool,
    pub is_unique: bool,
    pub default: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            comment: None,
            is_primary: false,
            is_nullable: true,
            is_unique: false,
            default: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PrimaryKey {
    #[default]
    None,
    /// Index into [`Table::columns`].
    Column(usize),
    Compound(CompoundKey),
}

impl PrimaryKey {
    pub fn is_column(&self, index: usize) -> bool {
        matches!(self, PrimaryKey::Column(i) if *i == index)
    }
}

/// One end of a connection: a table and, if the slot maps to one, a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub table: String,
    pub field: Option<String>,
}

impl FieldRef {
    pub fn new(table: impl Into<String>, field: Option<&str>) -> Self {
        Self {
            table: table.into(),
            field: field.map(str::to_owned),
        }
    }

    /// Field name as rendered; an unresolved field renders empty.
    pub fn field_name(&self) -> &str {
        self.field.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.field_name())
    }
}

/// Multi-column primary key; every field belongs to `table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundKey {
    pub table: String,
    pub fields: Vec<Option<String>>,
}

impl CompoundKey {
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.as_deref().unwrap_or_default())
    }
}

/// Foreign key edge from `referencing` (the owner) to `referenced`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub referencing: FieldRef,
    pub referenced: FieldRef,
    pub one_to_one: bool,
    pub on_delete: DeleteAction,
}

/// Delete policy of a foreign key. Always `Restrict` for now, and not
/// rendered into the statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteAction {
    #[default]
    Restrict,
    Cascade,
    NoAction,
    SetNull,
    SetDefault,
}

impl fmt::Display for DeleteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeleteAction::Restrict => "RESTRICT",
            DeleteAction::Cascade => "CASCADE",
            DeleteAction::NoAction => "NO ACTION",
            DeleteAction::SetNull => "SET NULL",
            DeleteAction::SetDefault => "SET DEFAULT",
        };
        f.write_str(s)
    }
}
