//! Schema definitions for `ClickHouse` tables

/// Table schema definition
#[derive(Debug)]
pub struct TableSchema {
    /// Table name
    pub name: &'static str,
    /// Column definitions
    pub columns: &'static str,
    /// ORDER BY clause
    pub order_by: &'static str,
}

/// Names of all tables
pub const TABLES: &[&str] = &["photos"];

/// Schema definitions for tables
pub const TABLE_SCHEMAS: &[TableSchema] = &[TableSchema {
    name: "photos",
    columns: "name String,
             year Nullable(UInt16),
             city Nullable(String),
             year_options Array(String),
             city_options Array(String),
             inserted_at DateTime64(3) DEFAULT now64()",
    order_by: "name",
}];
