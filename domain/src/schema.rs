//! Table declarations for persisted entities.
//!
//! An [`Entity`] describes the relational shape it needs. The storage layer
//! compares these declarations with the live database and adds whatever is
//! missing; nothing here knows about SQL dialects or connections.

/// Column types supported in table declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing integer key
    Serial,
    /// Variable-length text with an upper bound
    Text { max_len: u32 },
    Bool,
    Timestamp,
}

/// Default value applied by the database when a column is omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDefault {
    Bool(bool),
    Text(String),
    /// Current timestamp at insert time
    Now,
}

/// Definition of a column in a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub default: Option<ColumnDefault>,
}

impl ColumnDef {
    /// Create a new NOT NULL column.
    pub fn required(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            primary_key: false,
            default: None,
        }
    }

    /// Create a new nullable column.
    pub fn optional(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            nullable: true,
            ..Self::required(name, column_type)
        }
    }

    /// Create an auto-incrementing primary key column.
    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            primary_key: true,
            ..Self::required(name, ColumnType::Serial)
        }
    }

    /// Builder-style method to attach a default value.
    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }
}

/// Definition of a secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexDef {
    /// Create a unique index named `idx_<table>_<columns>`.
    pub fn unique(table: &str, columns: &[&str]) -> Self {
        Self {
            name: format!("idx_{}_{}", table, columns.join("_")),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: true,
        }
    }
}

/// Declared shape of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDef>,
    pub indexes: Vec<IndexDef>,
}

impl TableSchema {
    /// Create a new table declaration.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
            indexes: Vec::new(),
        }
    }

    /// Builder-style method to add an index.
    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }
}

/// A type persisted in its own table.
pub trait Entity {
    /// The relational shape this entity requires.
    fn table_schema() -> TableSchema;
}
