pub mod tables;
pub mod types;

pub use tables::{resolve_table, table_schema, TableSchema};
pub use types::{FieldType, NULL_SENTINEL};
