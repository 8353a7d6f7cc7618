//! In-process warehouse.
//!
//! Holds tables as vectors of cells. Used by `--dry-run` to exercise the
//! full pipeline without a database, and by the unit tests.

use super::{Cell, Column, TableRow, Warehouse, WriteMode};
use crate::dimensions::{next_key, UrlFeatures};
use crate::error::Result;
use crate::models::{DomainRow, FeatureRow};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug)]
struct MemoryTable {
    columns: &'static [Column],
    rows: Vec<Vec<Cell>>,
}

impl MemoryTable {
    fn new(columns: &'static [Column]) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    tables: Mutex<BTreeMap<&'static str, MemoryTable>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<&'static str, MemoryTable>> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Log the row count of every table.
    pub fn log_summary(&self) {
        for (name, table) in self.lock().iter() {
            info!(
                table = %name,
                columns = table.columns.len(),
                rows = table.rows.len(),
                "Dry-run table contents"
            );
        }
    }

    /// Lookup-then-insert against an in-memory dimension table. The key is
    /// always the first cell of a row.
    fn get_or_insert<F, M>(
        &self,
        table: &'static str,
        columns: &'static [Column],
        matches: F,
        make: M,
    ) -> i64
    where
        F: Fn(&[Cell]) -> bool,
        M: FnOnce(i64) -> Vec<Cell>,
    {
        let mut tables = self.lock();
        let entry = tables
            .entry(table)
            .or_insert_with(|| MemoryTable::new(columns));

        if let Some(id) = entry
            .rows
            .iter()
            .find(|row| matches(row))
            .and_then(|row| row.first().and_then(Cell::as_int))
        {
            debug!(table, id, "Reusing dimension key");
            return id;
        }

        let id = next_key(entry.rows.iter().filter_map(|row| row.first().and_then(Cell::as_int)));
        entry.rows.push(make(id));
        debug!(table, id, "Inserted dimension row");
        id
    }
}

// Inspection helpers for tests.
#[cfg(test)]
impl MemoryWarehouse {
    /// Rows currently stored in `table`, empty if the table does not exist.
    pub fn rows(&self, table: &str) -> Vec<Vec<Cell>> {
        self.lock()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().get(table).map_or(0, |t| t.rows.len())
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.lock().contains_key(table)
    }

    /// Column names of `table`, if it exists.
    pub fn column_names(&self, table: &str) -> Option<Vec<&'static str>> {
        self.lock()
            .get(table)
            .map(|t| t.columns.iter().map(|c| c.name).collect())
    }
}

impl Warehouse for MemoryWarehouse {
    async fn write<R: TableRow + Sync>(&self, rows: &[R], mode: WriteMode) -> Result<u64> {
        let mut tables = self.lock();
        if mode == WriteMode::Replace {
            tables.remove(R::TABLE);
        }
        let table = tables
            .entry(R::TABLE)
            .or_insert_with(|| MemoryTable::new(R::columns()));
        for row in rows {
            let cells = row.cells();
            debug!(table = R::TABLE, ?cells, "Dry-run row");
            table.rows.push(cells);
        }
        Ok(rows.len() as u64)
    }

    async fn resolve_domain(&self, domain_name: &str) -> Result<i64> {
        let id = self.get_or_insert(
            DomainRow::TABLE,
            DomainRow::columns(),
            |row| matches!(row.get(1), Some(Cell::Text(name)) if name == domain_name),
            |domain_id| {
                DomainRow {
                    domain_id,
                    domain_name: domain_name.to_string(),
                }
                .cells()
            },
        );
        Ok(id)
    }

    async fn resolve_features(&self, features: &UrlFeatures) -> Result<i64> {
        let wanted = FeatureRow {
            feature_id: 0,
            features: *features,
        }
        .cells();
        let id = self.get_or_insert(
            FeatureRow::TABLE,
            FeatureRow::columns(),
            |row| row.get(1..) == wanted.get(1..),
            |feature_id| {
                FeatureRow {
                    feature_id,
                    features: *features,
                }
                .cells()
            },
        );
        Ok(id)
    }
}
