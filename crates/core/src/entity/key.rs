use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::{FieldValue, TableSpec};

use super::{EntityError, Result};

/// One component of a composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Integer(i64),
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Integer(value) => write!(f, "{value}"),
            KeyValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Integer(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Text(value)
    }
}

impl From<&KeyValue> for FieldValue {
    fn from(value: &KeyValue) -> Self {
        match value {
            KeyValue::Integer(v) => FieldValue::Integer(*v),
            KeyValue::Text(v) => FieldValue::Text(v.clone()),
        }
    }
}

/// The ordered tuple of values identifying one entity instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(Vec<KeyValue>);

impl CompositeKey {
    pub fn new(values: Vec<KeyValue>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs each key column of `table` with its value.
    pub fn columns<'a>(
        &'a self,
        table: &'static TableSpec,
    ) -> impl Iterator<Item = (&'static str, &'a KeyValue)> {
        table.key.iter().copied().zip(self.0.iter())
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// Rebuilds the full composite key of `table` by inserting `owner_id` at
/// the owner column's position among the remaining key values.
pub fn compose_key(
    entity_type: &'static str,
    table: &TableSpec,
    owner_id: i64,
    others: Vec<KeyValue>,
) -> Result<CompositeKey> {
    let ordinal = table.owner_ordinal().ok_or_else(|| EntityError::InvalidKey {
        entity_type,
        reason: format!("owner column {} is not part of the key", table.owner_column),
    })?;

    let expected = table.key.len() - 1;
    if others.len() != expected {
        return Err(EntityError::InvalidKey {
            entity_type,
            reason: format!(
                "expected {expected} secondary key values, got {}",
                others.len()
            ),
        });
    }

    let mut values = others;
    values.insert(ordinal, KeyValue::Integer(owner_id));
    Ok(CompositeKey(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ColumnSpec;

    static OWNER_FIRST: TableSpec = TableSpec {
        name: "player_auth",
        columns: &[ColumnSpec::integer("player_id"), ColumnSpec::text("device_id")],
        key: &["player_id", "device_id"],
        owner_column: "player_id",
        relations: &[],
    };

    static OWNER_LAST: TableSpec = TableSpec {
        name: "decks",
        columns: &[ColumnSpec::text("deck_name"), ColumnSpec::integer("player_id")],
        key: &["deck_name", "player_id"],
        owner_column: "player_id",
        relations: &[],
    };

    #[test]
    fn test_compose_key_owner_first() {
        let key = compose_key("PlayerAuth", &OWNER_FIRST, 9, vec!["dev-1".into()]).unwrap();
        assert_eq!(
            key.values(),
            &[KeyValue::Integer(9), KeyValue::Text("dev-1".to_string())]
        );
    }

    #[test]
    fn test_compose_key_owner_last() {
        let key = compose_key("Deck", &OWNER_LAST, 9, vec!["main".into()]).unwrap();
        assert_eq!(key.to_string(), "main:9");
    }

    #[test]
    fn test_compose_key_rejects_wrong_arity() {
        let result = compose_key("PlayerAuth", &OWNER_FIRST, 9, vec![]);
        assert!(matches!(result, Err(EntityError::InvalidKey { .. })));
    }

    #[test]
    fn test_columns_pairs_key_order() {
        let key = compose_key("PlayerAuth", &OWNER_FIRST, 3, vec!["d".into()]).unwrap();
        let pairs: Vec<_> = key.columns(&OWNER_FIRST).map(|(c, v)| (c, v.clone())).collect();
        assert_eq!(
            pairs,
            vec![
                ("player_id", KeyValue::Integer(3)),
                ("device_id", KeyValue::Text("d".to_string())),
            ]
        );
    }
}
