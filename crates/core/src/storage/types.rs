use chrono::{DateTime, Utc};

use super::RepositoryError;

/// Column holding the record's creation timestamp.
pub const CREATED_AT_COLUMN: &str = "created_at";

/// Column holding the optimistic concurrency version.
pub const VERSION_COLUMN: &str = "version";

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
    /// Stored as RFC 3339 text.
    Timestamp,
}

/// A single column of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Integer,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Text,
        }
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Timestamp,
        }
    }
}

/// A first-level child relation, eager-loaded together with its parent.
///
/// `foreign_key` lists the child's columns matching the parent's key
/// columns, in the parent's key order.
#[derive(Debug, PartialEq, Eq)]
pub struct RelationSpec {
    pub name: &'static str,
    pub table: &'static TableSpec,
    pub foreign_key: &'static [&'static str],
}

/// Static description of how an entity type is laid out in a durable store.
///
/// `key` is the ordered composite key. Its order is used both to build store
/// predicates and to compose cache keys, so it must never change for a type.
#[derive(Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
    pub key: &'static [&'static str],
    /// Key column holding the owning player id.
    pub owner_column: &'static str,
    pub relations: &'static [RelationSpec],
}

impl TableSpec {
    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns true if `name` is part of the composite key.
    pub fn is_key_column(&self, name: &str) -> bool {
        self.key.contains(&name)
    }

    /// Columns that are not part of the key, in declaration order.
    pub fn non_key_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| !self.is_key_column(c.name))
    }

    /// Position of the owner column within the composite key.
    pub fn owner_ordinal(&self) -> Option<usize> {
        self.key.iter().position(|k| *k == self.owner_column)
    }

    /// True if this table declares nested child relations.
    pub fn has_relations(&self) -> bool {
        !self.relations.is_empty()
    }
}

/// A single column value exchanged with a durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// A row of named column values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<(&'static str, FieldValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column value, builder style.
    pub fn with(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.push(column, value);
        self
    }

    /// Sets a column value, replacing any previous value for that column.
    pub fn push(&mut self, column: &'static str, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    pub fn integer(&self, column: &str) -> Result<i64, RepositoryError> {
        match self.get(column) {
            Some(FieldValue::Integer(value)) => Ok(*value),
            other => Err(unexpected(column, "integer", other)),
        }
    }

    pub fn text(&self, column: &str) -> Result<String, RepositoryError> {
        match self.get(column) {
            Some(FieldValue::Text(value)) => Ok(value.clone()),
            other => Err(unexpected(column, "text", other)),
        }
    }

    /// Like [`Row::text`] but maps SQL NULL to `None`.
    pub fn optional_text(&self, column: &str) -> Result<Option<String>, RepositoryError> {
        match self.get(column) {
            Some(FieldValue::Null) => Ok(None),
            _ => self.text(column).map(Some),
        }
    }

    pub fn timestamp(&self, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
        match self.get(column) {
            Some(FieldValue::Timestamp(value)) => Ok(*value),
            other => Err(unexpected(column, "timestamp", other)),
        }
    }
}

fn unexpected(column: &str, expected: &str, found: Option<&FieldValue>) -> RepositoryError {
    match found {
        None => RepositoryError::InvalidData(format!("missing column {column}")),
        Some(value) => RepositoryError::InvalidData(format!(
            "column {column}: expected {expected}, found {value:?}"
        )),
    }
}

/// A materialized parent row with its eager-loaded first-level children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub row: Row,
    pub children: Vec<(&'static str, Vec<Row>)>,
}

impl Record {
    pub fn new(row: Row) -> Self {
        Self {
            row,
            children: Vec::new(),
        }
    }

    /// Rows loaded for the named relation; empty if none were loaded.
    pub fn children(&self, relation: &str) -> &[Row] {
        self.children
            .iter()
            .find(|(name, _)| *name == relation)
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[])
    }
}
