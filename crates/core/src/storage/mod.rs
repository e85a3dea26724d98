mod error;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use traits::{EntityStore, StoreConnector, StoreTransaction};
pub use types::{
    ColumnKind, ColumnSpec, FieldValue, Record, RelationSpec, Row, TableSpec, CREATED_AT_COLUMN,
    VERSION_COLUMN,
};
