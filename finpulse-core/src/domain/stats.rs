//! Per-instrument statistics derived from a return table.

use super::table::TableError;
use serde::{Deserialize, Serialize};

/// Annualized volatility, one scalar per instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VolatilityParts")]
pub struct VolatilityVector {
    instruments: Vec<String>,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct VolatilityParts {
    instruments: Vec<String>,
    values: Vec<f64>,
}

impl TryFrom<VolatilityParts> for VolatilityVector {
    type Error = TableError;

    fn try_from(parts: VolatilityParts) -> Result<Self, Self::Error> {
        VolatilityVector::new(parts.instruments, parts.values)
    }
}

impl VolatilityVector {
    pub fn new(instruments: Vec<String>, values: Vec<f64>) -> Result<Self, TableError> {
        if instruments.len() != values.len() {
            return Err(TableError::ColumnCount {
                instruments: instruments.len(),
                columns: values.len(),
            });
        }
        Ok(Self {
            instruments,
            values,
        })
    }

    pub(crate) fn from_parts(instruments: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(instruments.len(), values.len());
        Self {
            instruments,
            values,
        }
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, instrument: &str) -> Option<f64> {
        self.instruments
            .iter()
            .position(|s| s == instrument)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.instruments
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Instrument with the largest finite volatility.
    ///
    /// Ties resolve to the earliest instrument.
    pub fn most_volatile(&self) -> Option<(&str, f64)> {
        self.iter()
            .filter(|(_, v)| v.is_finite())
            .fold(None, |best, (name, v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((name, v)),
            })
    }
}

/// Pairwise Pearson correlation of daily returns.
///
/// Square, instrument by instrument, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CorrelationParts")]
pub struct CorrelationMatrix {
    instruments: Vec<String>,
    values: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct CorrelationParts {
    instruments: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl TryFrom<CorrelationParts> for CorrelationMatrix {
    type Error = TableError;

    fn try_from(parts: CorrelationParts) -> Result<Self, Self::Error> {
        CorrelationMatrix::new(parts.instruments, parts.values)
    }
}

impl CorrelationMatrix {
    pub fn new(instruments: Vec<String>, values: Vec<Vec<f64>>) -> Result<Self, TableError> {
        if values.len() != instruments.len() {
            return Err(TableError::NotSquare {
                rows: values.len(),
                instruments: instruments.len(),
            });
        }
        for (name, row) in instruments.iter().zip(&values) {
            if row.len() != instruments.len() {
                return Err(TableError::ColumnLength {
                    instrument: name.clone(),
                    got: row.len(),
                    expected: instruments.len(),
                });
            }
        }
        Ok(Self {
            instruments,
            values,
        })
    }

    pub(crate) fn from_parts(instruments: Vec<String>, values: Vec<Vec<f64>>) -> Self {
        debug_assert!(values.iter().all(|r| r.len() == instruments.len()));
        Self {
            instruments,
            values,
        }
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index(a)?;
        let j = self.index(b)?;
        Some(self.values[i][j])
    }

    pub fn row(&self, instrument: &str) -> Option<&[f64]> {
        self.index(instrument).map(|i| self.values[i].as_slice())
    }

    /// Symmetric within `tol`; a pair of `NaN`s counts as equal.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let n = self.len();
        (0..n).all(|i| {
            (0..n).all(|j| {
                let (a, b) = (self.values[i][j], self.values[j][i]);
                (a.is_nan() && b.is_nan()) || (a - b).abs() <= tol
            })
        })
    }

    fn index(&self, instrument: &str) -> Option<usize> {
        self.instruments.iter().position(|s| s == instrument)
    }
}
