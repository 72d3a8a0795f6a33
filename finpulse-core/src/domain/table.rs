//! Date-indexed columnar tables.
//!
//! `DailyTable` backs both the cleaned price table and the derived return
//! table. Columns are stored per instrument; missing cells are `NaN`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Table of adjusted closing prices, one column per instrument.
pub type PriceTable = DailyTable;

/// Table of daily log-returns, one column per instrument.
pub type ReturnTable = DailyTable;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("column '{instrument}' has {got} values, expected {expected}")]
    ColumnLength {
        instrument: String,
        got: usize,
        expected: usize,
    },

    #[error("{instruments} instrument names for {columns} columns")]
    ColumnCount { instruments: usize, columns: usize },

    #[error("duplicate instrument '{0}'")]
    DuplicateInstrument(String),

    #[error("dates not strictly increasing at row {row} ({date})")]
    UnorderedDates { row: usize, date: NaiveDate },

    #[error("matrix is not square: {rows} rows for {instruments} instruments")]
    NotSquare { rows: usize, instruments: usize },
}

/// Columnar `f64` table indexed by trading day.
///
/// Deserialization goes through [`DailyTable::new`], so a decoded table
/// satisfies the same shape and ordering checks as a constructed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableParts")]
pub struct DailyTable {
    dates: Vec<NaiveDate>,
    instruments: Vec<String>,
    columns: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct TableParts {
    dates: Vec<NaiveDate>,
    instruments: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl TryFrom<TableParts> for DailyTable {
    type Error = TableError;

    fn try_from(parts: TableParts) -> Result<Self, Self::Error> {
        DailyTable::new(parts.dates, parts.instruments, parts.columns)
    }
}

impl DailyTable {
    /// Build a table, validating shape and date ordering.
    pub fn new(
        dates: Vec<NaiveDate>,
        instruments: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, TableError> {
        if instruments.len() != columns.len() {
            return Err(TableError::ColumnCount {
                instruments: instruments.len(),
                columns: columns.len(),
            });
        }
        for (i, name) in instruments.iter().enumerate() {
            if instruments[..i].contains(name) {
                return Err(TableError::DuplicateInstrument(name.clone()));
            }
        }
        for (name, col) in instruments.iter().zip(&columns) {
            if col.len() != dates.len() {
                return Err(TableError::ColumnLength {
                    instrument: name.clone(),
                    got: col.len(),
                    expected: dates.len(),
                });
            }
        }
        for (row, pair) in dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(TableError::UnorderedDates {
                    row: row + 1,
                    date: pair[1],
                });
            }
        }
        Ok(Self {
            dates,
            instruments,
            columns,
        })
    }

    /// A table with the given columns and no rows.
    pub fn empty(instruments: Vec<String>) -> Self {
        let columns = vec![Vec::new(); instruments.len()];
        Self {
            dates: Vec::new(),
            instruments,
            columns,
        }
    }

    /// Construct without validation. Callers guarantee the invariants.
    pub(crate) fn from_parts(
        dates: Vec<NaiveDate>,
        instruments: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert_eq!(instruments.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == dates.len()));
        Self {
            dates,
            instruments,
            columns,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Number of rows (trading days).
    pub fn height(&self) -> usize {
        self.dates.len()
    }

    /// Number of instrument columns.
    pub fn width(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, instrument: &str) -> Option<&[f64]> {
        self.position(instrument).map(|i| self.columns[i].as_slice())
    }

    pub fn value(&self, row: usize, instrument: &str) -> Option<f64> {
        self.column(instrument).and_then(|c| c.get(row).copied())
    }

    /// Most recent value for an instrument.
    pub fn last(&self, instrument: &str) -> Option<f64> {
        self.column(instrument).and_then(|c| c.last().copied())
    }

    /// Values across all instruments for one row.
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.height() {
            return None;
        }
        Some(self.columns.iter().map(|c| c[row]).collect())
    }

    /// The last `n` rows (or all rows if fewer).
    /// Values of the latest row, in instrument order.
    pub fn last_row(&self) -> Option<Vec<f64>> {
        self.height().checked_sub(1).and_then(|i| self.row(i))
    }

    pub fn tail(&self, n: usize) -> DailyTable {
        let start = self.height().saturating_sub(n);
        Self {
            dates: self.dates[start..].to_vec(),
            instruments: self.instruments.clone(),
            columns: self.columns.iter().map(|c| c[start..].to_vec()).collect(),
        }
    }

    /// True when every cell holds a finite value.
    pub fn is_complete(&self) -> bool {
        self.columns.iter().flatten().all(|v| v.is_finite())
    }

    fn position(&self, instrument: &str) -> Option<usize> {
        self.instruments.iter().position(|s| s == instrument)
    }
}
