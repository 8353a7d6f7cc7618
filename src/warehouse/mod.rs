//! Destination tables in the `raw` staging schema.
//!
//! Every row type that can be loaded implements [`TableRow`], which declares
//! its table name and typed columns. A [`Warehouse`] writes batches of rows in
//! one of two [`WriteMode`]s and resolves surrogate keys for the two
//! dimension tables.
//!
//! # Implementations
//!
//! | Backend | Module | Used for |
//! |---------|--------|----------|
//! | PostgreSQL | [`postgres`] | Normal runs |
//! | In-memory | [`memory`] | `--dry-run` and tests |

pub mod memory;
pub mod postgres;

pub use memory::MemoryWarehouse;
pub use postgres::PgWarehouse;

use crate::dimensions::UrlFeatures;
use crate::error::Result;

/// Schema that every table lives in.
pub const RAW_SCHEMA: &str = "raw";

/// SQL column type. Stands in for dataframe type inference: each row type
/// states its own column types up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `TEXT`
    Text,
    /// `BIGINT`, used for keys, counts and years.
    BigInt,
    /// `DOUBLE PRECISION`, used for percentages and rates.
    Double,
    /// `BOOLEAN`
    Boolean,
}

impl ColumnType {
    /// The type as written in `CREATE TABLE`.
    pub fn sql(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Boolean => "BOOLEAN",
        }
    }
}

/// One column of a staging table.
///
/// # Fields
///
/// * `name` - Column name, used verbatim in SQL
/// * `ty` - SQL type of the column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: &'static str,
    /// Column type.
    pub ty: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty }
    }
}

/// A single value in a row.
///
/// The variant must agree with the [`ColumnType`] of its column; `Null`
/// is allowed in any column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Cell {
    /// The value of an `Int` cell, `None` for every other variant.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(*v),
            _ => None,
        }
    }
}

/// A row that maps onto one table in the staging schema.
///
/// Implementors are plain structs; the table is created from
/// [`TableRow::columns`] the first time a row is written.
pub trait TableRow {
    /// Table name inside the [`RAW_SCHEMA`] schema.
    const TABLE: &'static str;

    /// Column names and types, in insert order.
    fn columns() -> &'static [Column];

    /// Values in the same order as [`TableRow::columns`].
    fn cells(&self) -> Vec<Cell>;
}

/// How a batch is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create the table if missing and add rows. No deduplication.
    Append,
    /// Drop the table, recreate it and insert the batch.
    Replace,
}

/// Storage backend for the loaders.
///
/// Dimension resolution is lookup-then-insert: an exact match returns the
/// stored key, otherwise a row is inserted with `max(existing key) + 1`.
pub trait Warehouse {
    /// Write a batch of rows.
    ///
    /// # Arguments
    ///
    /// * `rows` - The batch; may be empty
    /// * `mode` - [`WriteMode::Append`] or [`WriteMode::Replace`]
    ///
    /// # Returns
    ///
    /// The number of rows inserted. With `Replace` and an empty batch the
    /// table is left empty with its columns defined.
    async fn write<R: TableRow + Sync>(&self, rows: &[R], mode: WriteMode) -> Result<u64>;

    /// Surrogate key for a domain name in `dim_domains`.
    ///
    /// # Arguments
    ///
    /// * `domain_name` - Lowercased host, see [`crate::dimensions::domain_name`]
    ///
    /// # Returns
    ///
    /// The stored key when the name exists, otherwise the key of a newly
    /// inserted row.
    async fn resolve_domain(&self, domain_name: &str) -> Result<i64>;

    /// Surrogate key for a feature tuple in `dim_url_features`.
    ///
    /// All three features must match for an existing row to be reused.
    async fn resolve_features(&self, features: &UrlFeatures) -> Result<i64>;
}

/// `raw.<table>`. Table names are compile-time constants, never user input.
pub fn qualified(table: &str) -> String {
    format!("{RAW_SCHEMA}.{table}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_sql() {
        assert_eq!(ColumnType::Text.sql(), "TEXT");
        assert_eq!(ColumnType::BigInt.sql(), "BIGINT");
        assert_eq!(ColumnType::Double.sql(), "DOUBLE PRECISION");
        assert_eq!(ColumnType::Boolean.sql(), "BOOLEAN");
    }

    #[test]
    fn test_qualified() {
        assert_eq!(qualified("dim_domains"), "raw.dim_domains");
    }

    #[test]
    fn test_cell_as_int() {
        assert_eq!(Cell::Int(7).as_int(), Some(7));
        assert_eq!(Cell::Text("7".into()).as_int(), None);
    }
}
