use crate::domain::row::ScanRow;
use anyhow::ensure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column-oriented scan result: one header, rows of cells in header order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> anyhow::Result<()> {
        ensure!(
            row.len() <= self.columns.len(),
            "row has {} cells but table has {} columns",
            row.len(),
            self.columns.len()
        );
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One record per row, keyed by column name. Short rows leave trailing columns out.
    pub fn into_records(self) -> anyhow::Result<Vec<ScanRow>> {
        let Table { columns, rows } = self;
        let mut out: Vec<ScanRow> = Vec::with_capacity(rows.len());
        for (idx, cells) in rows.into_iter().enumerate() {
            ensure!(
                cells.len() <= columns.len(),
                "row {idx} has {} cells but table has {} columns",
                cells.len(),
                columns.len()
            );
            out.push(columns.iter().cloned().zip(cells).collect());
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanMetadata {
    /// Matches on the provider side, which may exceed the rows returned.
    pub total_count: u64,
    pub fetched_at: DateTime<Utc>,
}

/// Providers return either a bare table or a table with metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanResult {
    Plain(Table),
    WithMetadata(ScanMetadata, Table),
}

impl ScanResult {
    pub fn metadata(&self) -> Option<&ScanMetadata> {
        match self {
            ScanResult::Plain(_) => None,
            ScanResult::WithMetadata(meta, _) => Some(meta),
        }
    }

    pub fn into_table(self) -> Table {
        match self {
            ScanResult::Plain(table) | ScanResult::WithMetadata(_, table) => table,
        }
    }
}
