//! Multi-symbol time alignment.
//!
//! Given bars for multiple symbols, align them to a common timeline.
//! Dates a symbol did not trade on get NaN; cleaning decides what to do
//! with them afterwards.

use super::provider::RawBar;
use crate::domain::DailyTable;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Which field a symbol's price series was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    AdjClose,
    Close,
}

/// Pick the price series for one symbol.
///
/// The adjusted close is used whenever the provider exposed it for any bar;
/// otherwise the raw close. The choice is per series, never per cell, so a
/// single symbol never mixes adjusted and unadjusted prices.
pub fn select_prices(bars: &[RawBar]) -> (PriceField, BTreeMap<NaiveDate, f64>) {
    let field = if bars.iter().any(|b| b.adj_close.is_some()) {
        PriceField::AdjClose
    } else {
        PriceField::Close
    };

    // Later observations for the same date win.
    let prices = bars
        .iter()
        .map(|b| {
            let value = match field {
                PriceField::AdjClose => b.adj_close,
                PriceField::Close => b.close,
            };
            (b.date, value.unwrap_or(f64::NAN))
        })
        .collect();

    (field, prices)
}

/// Align multiple symbols to a common timeline.
///
/// The date axis is the sorted union of every symbol's dates. Columns keep
/// the order of `symbol_bars`.
pub fn align_symbols(symbol_bars: &[(String, Vec<RawBar>)]) -> DailyTable {
    let series: Vec<(String, BTreeMap<NaiveDate, f64>)> = symbol_bars
        .iter()
        .map(|(symbol, bars)| {
            let (field, prices) = select_prices(bars);
            tracing::debug!(%symbol, ?field, observations = prices.len(), "selected price series");
            (symbol.clone(), prices)
        })
        .collect();

    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|(_, prices)| prices.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut instruments = Vec::with_capacity(series.len());
    let mut columns = Vec::with_capacity(series.len());
    for (symbol, prices) in series {
        columns.push(
            dates
                .iter()
                .map(|date| prices.get(date).copied().unwrap_or(f64::NAN))
                .collect(),
        );
        instruments.push(symbol);
    }

    DailyTable::from_parts(dates, instruments, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> RawBar {
        RawBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            close: Some(close),
            adj_close: Some(close),
        }
    }

    #[test]
    fn align_fills_missing_with_nan() {
        let input = vec![
            (
                "SPY".to_string(),
                vec![
                    bar("2024-01-02", 100.0),
                    bar("2024-01-03", 101.0),
                    bar("2024-01-04", 102.0),
                ],
            ),
            (
                "QQQ".to_string(),
                vec![
                    bar("2024-01-02", 200.0),
                    // QQQ missing 2024-01-03
                    bar("2024-01-04", 202.0),
                ],
            ),
        ];

        let aligned = align_symbols(&input);

        assert_eq!(aligned.height(), 3);
        assert_eq!(aligned.instruments(), &["SPY", "QQQ"]);
        assert_eq!(aligned.value(1, "SPY"), Some(101.0));
        assert!(aligned.value(1, "QQQ").unwrap().is_nan());
    }

    #[test]
    fn unsorted_and_duplicate_dates_are_normalized() {
        let input = vec![(
            "SPY".to_string(),
            vec![
                bar("2024-01-03", 101.0),
                bar("2024-01-02", 100.0),
                bar("2024-01-03", 101.5),
            ],
        )];

        let aligned = align_symbols(&input);
        assert_eq!(aligned.height(), 2);
        assert_eq!(aligned.column("SPY"), Some(&[100.0, 101.5][..]));
    }

    #[test]
    fn adjusted_series_preferred_over_close() {
        let bars = vec![
            RawBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                close: Some(10.0),
                adj_close: Some(9.0),
            },
            RawBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                close: Some(11.0),
                adj_close: None,
            },
        ];
        let (field, prices) = select_prices(&bars);
        assert_eq!(field, PriceField::AdjClose);
        let values: Vec<f64> = prices.values().copied().collect();
        assert_eq!(values[0], 9.0);
        assert!(values[1].is_nan(), "no per-cell fallback to raw close");
    }

    #[test]
    fn close_used_when_no_adjusted_field() {
        let bars = vec![RawBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            close: Some(42.0),
            adj_close: None,
        }];
        let (field, prices) = select_prices(&bars);
        assert_eq!(field, PriceField::Close);
        assert_eq!(prices.values().next(), Some(&42.0));
    }
}
