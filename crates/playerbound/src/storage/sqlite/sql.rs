//! SQL generation from table descriptors.
//!
//! Every statement binds key columns in declared key order, so callers pass
//! composite key values unchanged.

use playerbound_core::storage::{ColumnSpec, RelationSpec, TableSpec, VERSION_COLUMN};

fn column_list(columns: &[ColumnSpec]) -> String {
    columns
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `a = ?n AND b = ?n+1 ...` starting at placeholder `first`.
fn equality_predicate(columns: &[&str], first: usize) -> String {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ?{}", first + i))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Selects one row by its full composite key.
pub fn select_by_key(table: &TableSpec) -> String {
    format!(
        "SELECT {} FROM {} WHERE {}",
        column_list(table.columns),
        table.name,
        equality_predicate(table.key, 1)
    )
}

/// Selects the children of one parent, binding the parent's key values.
pub fn select_children(relation: &RelationSpec) -> String {
    let child = relation.table;
    let order = column_list(
        &child
            .columns
            .iter()
            .filter(|c| child.is_key_column(c.name))
            .copied()
            .collect::<Vec<_>>(),
    );
    format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {}",
        column_list(child.columns),
        child.name,
        equality_predicate(relation.foreign_key, 1),
        order
    )
}

/// Inserts every declared column in declaration order.
pub fn insert(table: &TableSpec) -> String {
    let placeholders = (1..=table.columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name,
        column_list(table.columns),
        placeholders
    )
}

/// Rewrites the non-key columns (version included) of the row matching the
/// key and the expected version.
///
/// Binds non-key values first, then key values, then the expected version.
pub fn update_versioned(table: &TableSpec) -> String {
    let assignments: Vec<&str> = table.non_key_columns().map(|c| c.name).collect();
    let set = assignments
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let key_start = assignments.len() + 1;
    let version_slot = key_start + table.key.len();
    format!(
        "UPDATE {} SET {} WHERE {} AND {VERSION_COLUMN} = ?{version_slot}",
        table.name,
        set,
        equality_predicate(table.key, key_start)
    )
}

/// Deletes the row matching the key and the expected version.
pub fn delete_versioned(table: &TableSpec) -> String {
    let version_slot = table.key.len() + 1;
    format!(
        "DELETE FROM {} WHERE {} AND {VERSION_COLUMN} = ?{version_slot}",
        table.name,
        equality_predicate(table.key, 1)
    )
}
