//! Return, volatility, correlation and relative-performance statistics, as
//! pure functions.
//!
//! Everything here takes a table in and hands a derived value back, with no
//! I/O. Undefined inputs (non-positive prices, too few samples, zero variance)
//! produce NaN rather than an error.

use crate::domain::{CorrelationMatrix, DailyTable, PriceTable, ReturnTable, VolatilityVector};
use serde::{Deserialize, Serialize};

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// The derived outputs of a price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub returns: ReturnTable,
    /// Prices rebased so the first row is 100.
    pub rebased: DailyTable,
    pub volatility: VolatilityVector,
    pub correlation: CorrelationMatrix,
}

/// Compute returns, then volatility and correlation from them.
///
/// Volatility and correlation do not depend on each other and run on the
/// rayon pool. The result is deterministic for a given input.
pub fn transform(prices: &PriceTable) -> Analytics {
    tracing::info!(
        instruments = prices.width(),
        rows = prices.height(),
        "computing financial metrics"
    );

    let returns = log_returns(prices);
    if returns.height() < 2 {
        tracing::warn!(
            return_rows = returns.height(),
            "too few returns, volatility and correlation are undefined"
        );
    }

    let (volatility, correlation) = rayon::join(
        || annualized_volatility(&returns),
        || correlation_matrix(&returns),
    );

    Analytics {
        returns,
        rebased: rebased(prices),
        volatility,
        correlation,
    }
}

/// Daily log-returns: `ln(p[d] / p[d-1])`, first row dropped.
///
/// A pair involving a non-positive or non-finite price yields NaN.
pub fn log_returns(prices: &PriceTable) -> ReturnTable {
    if prices.height() < 2 {
        return ReturnTable::empty(prices.instruments().to_vec());
    }

    let columns = prices
        .columns()
        .iter()
        .map(|col| col.windows(2).map(|w| log_return(w[0], w[1])).collect())
        .collect();

    ReturnTable::from_parts(
        prices.dates()[1..].to_vec(),
        prices.instruments().to_vec(),
        columns,
    )
}

fn log_return(prev: f64, curr: f64) -> f64 {
    if prev > 0.0 && curr > 0.0 && prev.is_finite() && curr.is_finite() {
        (curr / prev).ln()
    } else {
        f64::NAN
    }
}

/// Relative performance: each column divided by its first value, times 100.
///
/// A column whose first price is non-positive or non-finite has no base and
/// is NaN throughout. An empty table stays empty.
pub fn rebased(prices: &PriceTable) -> DailyTable {
    let columns = prices
        .columns()
        .iter()
        .map(|col| match col.first() {
            Some(&base) if base > 0.0 && base.is_finite() => {
                col.iter().map(|p| p / base * 100.0).collect()
            }
            _ => vec![f64::NAN; col.len()],
        })
        .collect();

    DailyTable::from_parts(
        prices.dates().to_vec(),
        prices.instruments().to_vec(),
        columns,
    )
}

/// Sample standard deviation of each return column times `sqrt(252)`.
pub fn annualized_volatility(returns: &ReturnTable) -> VolatilityVector {
    let factor = TRADING_DAYS_PER_YEAR.sqrt();
    let values = returns
        .columns()
        .iter()
        .map(|col| std_dev(col) * factor)
        .collect();

    VolatilityVector::from_parts(returns.instruments().to_vec(), values)
}

/// Pearson correlation between every pair of return columns.
///
/// An instrument whose returns have zero or undefined variance gets NaN for
/// its whole row and column, diagonal included. Defined entries are clamped
/// to [-1, 1] and the matrix is exactly symmetric.
pub fn correlation_matrix(returns: &ReturnTable) -> CorrelationMatrix {
    let cols = returns.columns();
    let n = cols.len();
    let devs: Vec<Option<Vec<f64>>> = cols.iter().map(|c| centered(c)).collect();

    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        let Some(x) = &devs[i] else { continue };
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let Some(y) = &devs[j] else { continue };
            let r = pearson(x, y);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix::from_parts(returns.instruments().to_vec(), values)
}

/// Deviations from the mean, or None when the variance is not positive.
fn centered(values: &[f64]) -> Option<Vec<f64>> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean_f64(values);
    let dev: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let ss: f64 = dev.iter().map(|d| d * d).sum();
    (ss.is_finite() && ss > 0.0).then_some(dev)
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sxx: f64 = x.iter().map(|a| a * a).sum();
    let syy: f64 = y.iter().map(|b| b * b).sum();
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Percent change between the last two rows, per instrument.
///
/// This is what summary consumers show next to the latest price. NaN when
/// the table has fewer than two rows.
pub fn day_change_pct(prices: &PriceTable) -> Vec<(String, f64)> {
    let h = prices.height();
    prices
        .instruments()
        .iter()
        .zip(prices.columns())
        .map(|(name, col)| {
            let pct = if h >= 2 {
                (col[h - 1] / col[h - 2] - 1.0) * 100.0
            } else {
                f64::NAN
            };
            (name.clone(), pct)
        })
        .collect()
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1). NaN below two samples.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
