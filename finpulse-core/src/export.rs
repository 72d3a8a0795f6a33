//! Parquet export of computed tables.
//!
//! Layout: `{output_dir}/{name}.parquet`, one file per table.
//!
//! - The output directory is created on first use
//! - Writes are atomic (write to .tmp, rename into place), so re-exporting
//!   under the same name overwrites
//! - Every filesystem or Parquet failure is returned as an `ExportError`

use crate::domain::{CorrelationMatrix, DailyTable, TableError, VolatilityVector};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extension of exported tables.
pub const EXTENSION: &str = "parquet";

const DATE_COLUMN: &str = "date";
const INSTRUMENT_COLUMN: &str = "instrument";
const VOLATILITY_COLUMN: &str = "volatility";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid table name '{0}'")]
    InvalidName(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("table error: {0}")]
    Table(#[from] TableError),
}

/// Conversion of a table into a Polars DataFrame for writing.
pub trait ToFrame {
    fn to_frame(&self) -> Result<DataFrame, ExportError>;
}

/// Reconstruction of a table from a DataFrame read back from disk.
pub trait FromFrame: Sized {
    fn from_frame(df: &DataFrame) -> Result<Self, ExportError>;
}

/// Writes and reads tables under a fixed output directory.
#[derive(Debug, Clone)]
pub struct ParquetExporter {
    output_dir: PathBuf,
}

impl ParquetExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the file backing `name`: `{output_dir}/{name}.parquet`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, ExportError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ExportError::InvalidName(name.to_string()));
        }
        Ok(self.output_dir.join(format!("{name}.{EXTENSION}")))
    }

    /// Write `table` as `name`, replacing any previous export of that name.
    pub fn export<T: ToFrame + ?Sized>(&self, table: &T, name: &str) -> Result<PathBuf, ExportError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut df = table.to_frame()?;
        let tmp_path = path.with_extension(format!("{EXTENSION}.tmp"));
        let written = write_parquet(&mut df, &tmp_path).and_then(|()| {
            fs::rename(&tmp_path, &path).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })
        });
        // No partial file may survive a failed write or rename.
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written?;

        tracing::info!(path = %path.display(), rows = df.height(), "table saved");
        Ok(path)
    }

    /// Read a previously exported table back.
    pub fn load<T: FromFrame>(&self, name: &str) -> Result<T, ExportError> {
        let path = self.path_for(name)?;
        let df = read_parquet(&path)?;
        T::from_frame(&df)
    }

    /// Shorthand for loading a date-indexed table.
    pub fn load_table(&self, name: &str) -> Result<DailyTable, ExportError> {
        self.load(name)
    }

    pub fn load_volatility(&self, name: &str) -> Result<VolatilityVector, ExportError> {
        self.load(name)
    }

    pub fn load_correlation(&self, name: &str) -> Result<CorrelationMatrix, ExportError> {
        self.load(name)
    }
}

// ── Frame conversions ───────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

impl ToFrame for DailyTable {
    fn to_frame(&self) -> Result<DataFrame, ExportError> {
        if self.instruments().iter().any(|s| s == DATE_COLUMN) {
            return Err(ExportError::Schema(format!(
                "instrument name '{DATE_COLUMN}' collides with the index column"
            )));
        }

        let epoch = epoch();
        let days: Vec<i32> = self
            .dates()
            .iter()
            .map(|d| (*d - epoch).num_days() as i32)
            .collect();

        let mut columns = Vec::with_capacity(self.width() + 1);
        columns.push(
            Column::new(DATE_COLUMN.into(), days)
                .cast(&DataType::Date)
                .map_err(|e| ExportError::Parquet(format!("date cast: {e}")))?,
        );
        for (name, values) in self.instruments().iter().zip(self.columns()) {
            columns.push(Column::new(name.as_str().into(), values.as_slice()));
        }

        DataFrame::new(columns).map_err(|e| ExportError::Parquet(format!("dataframe creation: {e}")))
    }
}

impl FromFrame for DailyTable {
    fn from_frame(df: &DataFrame) -> Result<Self, ExportError> {
        let date_ca = df
            .column(DATE_COLUMN)
            .and_then(|c| c.date())
            .map_err(|e| ExportError::Schema(format!("date column: {e}")))?;

        let epoch = epoch();
        let mut dates = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let days = date_ca
                .get(i)
                .ok_or_else(|| ExportError::Schema(format!("null date at row {i}")))?;
            dates.push(epoch + chrono::Duration::days(days as i64));
        }

        let mut instruments = Vec::new();
        let mut columns = Vec::new();
        for name in df.get_column_names() {
            if name.as_str() == DATE_COLUMN {
                continue;
            }
            instruments.push(name.to_string());
            columns.push(f64_values(df, name.as_str())?);
        }

        Ok(DailyTable::new(dates, instruments, columns)?)
    }
}

impl ToFrame for VolatilityVector {
    fn to_frame(&self) -> Result<DataFrame, ExportError> {
        let names: Vec<&str> = self.instruments().iter().map(String::as_str).collect();
        DataFrame::new(vec![
            Column::new(INSTRUMENT_COLUMN.into(), names),
            Column::new(VOLATILITY_COLUMN.into(), self.values()),
        ])
        .map_err(|e| ExportError::Parquet(format!("dataframe creation: {e}")))
    }
}

impl FromFrame for VolatilityVector {
    fn from_frame(df: &DataFrame) -> Result<Self, ExportError> {
        let instruments = string_values(df, INSTRUMENT_COLUMN)?;
        let values = f64_values(df, VOLATILITY_COLUMN)?;
        Ok(VolatilityVector::new(instruments, values)?)
    }
}

impl ToFrame for CorrelationMatrix {
    fn to_frame(&self) -> Result<DataFrame, ExportError> {
        if self.instruments().iter().any(|s| s == INSTRUMENT_COLUMN) {
            return Err(ExportError::Schema(format!(
                "instrument name '{INSTRUMENT_COLUMN}' collides with the index column"
            )));
        }

        let names: Vec<&str> = self.instruments().iter().map(String::as_str).collect();
        let mut columns = Vec::with_capacity(self.len() + 1);
        columns.push(Column::new(INSTRUMENT_COLUMN.into(), names));
        // Column j holds corr(row_i, instrument_j)
        for (j, name) in self.instruments().iter().enumerate() {
            let values: Vec<f64> = self.rows().iter().map(|row| row[j]).collect();
            columns.push(Column::new(name.as_str().into(), values));
        }

        DataFrame::new(columns).map_err(|e| ExportError::Parquet(format!("dataframe creation: {e}")))
    }
}

impl FromFrame for CorrelationMatrix {
    fn from_frame(df: &DataFrame) -> Result<Self, ExportError> {
        let instruments = string_values(df, INSTRUMENT_COLUMN)?;
        let by_column: Vec<Vec<f64>> = instruments
            .iter()
            .map(|name| f64_values(df, name))
            .collect::<Result<_, _>>()?;

        let n = instruments.len();
        let rows = (0..n)
            .map(|i| by_column.iter().map(|col| col[i]).collect())
            .collect();

        Ok(CorrelationMatrix::new(instruments, rows)?)
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, ExportError> {
    let ca = df
        .column(name)
        .and_then(|c| c.f64())
        .map_err(|e| ExportError::Schema(format!("column '{name}': {e}")))?;
    Ok(ca.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<String>, ExportError> {
    let ca = df
        .column(name)
        .and_then(|c| c.str())
        .map_err(|e| ExportError::Schema(format!("column '{name}': {e}")))?;
    ca.iter()
        .enumerate()
        .map(|(i, v)| {
            v.map(str::to_string)
                .ok_or_else(|| ExportError::Schema(format!("null {name} at row {i}")))
        })
        .collect()
}

/// Write a DataFrame to a Parquet file.
fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), ExportError> {
    let file = fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| ExportError::Parquet(format!("write {}: {e}", path.display())))?;
    Ok(())
}

/// Read a Parquet file into a DataFrame.
fn read_parquet(path: &Path) -> Result<DataFrame, ExportError> {
    let file = fs::File::open(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| ExportError::Parquet(format!("read {}: {e}", path.display())))
}
