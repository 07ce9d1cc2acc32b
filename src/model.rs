//! Canonical diagram graph shared by every parser and generator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Int,
    Bigint,
    Serial,
    Varchar,
    Text,
    Boolean,
    Date,
    Timestamp,
    Float,
    Decimal,
    Uuid,
    Json,
    Blob,
}

impl ColumnType {
    pub const ALL: [ColumnType; 13] = [
        Self::Int,
        Self::Bigint,
        Self::Serial,
        Self::Varchar,
        Self::Text,
        Self::Boolean,
        Self::Date,
        Self::Timestamp,
        Self::Float,
        Self::Decimal,
        Self::Uuid,
        Self::Json,
        Self::Blob,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Bigint => "BIGINT",
            Self::Serial => "SERIAL",
            Self::Varchar => "VARCHAR",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::Float => "FLOAT",
            Self::Decimal => "DECIMAL",
            Self::Uuid => "UUID",
            Self::Json => "JSON",
            Self::Blob => "BLOB",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent constraint flags of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub is_primary_key: bool,
    pub is_nullable: bool,
    pub is_unique: bool,
    pub is_foreign_key: bool,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            is_primary_key: false,
            is_nullable: true,
            is_unique: false,
            is_foreign_key: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub typ: ColumnType,
    pub constraints: Constraints,
}

/// Layout hint only; positions carry no uniqueness invariant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Case-insensitive lookup by column name.
    pub fn column_named(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn column_named_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:M")]
    ManyToMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToMany => "N:M",
        }
    }

    /// 1:1 and 1:N relationships become foreign keys; N:M needs a junction table.
    pub fn is_foreign_key(&self) -> bool {
        !matches!(self, Self::ManyToMany)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a relationship: a column inside a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub table_id: String,
    pub column_id: String,
}

impl Endpoint {
    pub fn new(table_id: impl Into<String>, column_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            column_id: column_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RelationshipRecord", into = "RelationshipRecord")]
pub struct Relationship {
    pub id: String,
    pub cardinality: Cardinality,
    pub source: Endpoint,
    pub target: Endpoint,
}

/// Flat on-disk shape of a relationship.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationshipRecord {
    id: String,
    #[serde(rename = "type")]
    cardinality: Cardinality,
    source_table_id: String,
    source_column_id: String,
    target_table_id: String,
    target_column_id: String,
}

impl From<RelationshipRecord> for Relationship {
    fn from(r: RelationshipRecord) -> Self {
        Self {
            id: r.id,
            cardinality: r.cardinality,
            source: Endpoint::new(r.source_table_id, r.source_column_id),
            target: Endpoint::new(r.target_table_id, r.target_column_id),
        }
    }
}

impl From<Relationship> for RelationshipRecord {
    fn from(r: Relationship) -> Self {
        Self {
            id: r.id,
            cardinality: r.cardinality,
            source_table_id: r.source.table_id,
            source_column_id: r.source.column_id,
            target_table_id: r.target.table_id,
            target_column_id: r.target.column_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagramSchema {
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
}

impl DiagramSchema {
    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn resolve(&self, endpoint: &Endpoint) -> Option<(&Table, &Column)> {
        let table = self.table(&endpoint.table_id)?;
        let column = table.column(&endpoint.column_id)?;
        Some((table, column))
    }
}

/// A line-numbered parser message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Best-effort result of a parser run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParseOutput {
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
    pub errors: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn into_schema(self) -> DiagramSchema {
        DiagramSchema {
            tables: self.tables,
            relationships: self.relationships,
        }
    }
}

/// Deterministic id source for freshly parsed graphs.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    tables: usize,
    relationships: usize,
}

impl IdAllocator {
    pub fn table(&mut self) -> String {
        self.tables += 1;
        format!("table-{}", self.tables)
    }

    pub fn column(index: usize) -> String {
        format!("col-{}", index + 1)
    }

    pub fn relationship(&mut self) -> String {
        self.relationships += 1;
        format!("rel-{}", self.relationships)
    }
}
