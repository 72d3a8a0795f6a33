//! End-to-end pipeline tests against an in-memory provider.
//!
//! Covers the scenarios the pipeline promises to consumers:
//! 1. Three instruments over six days (trend, constant, random walk)
//! 2. A one-row price table (degenerate, not an error)
//! 3. Export of the return table and reload from disk
//! 4. Fetch failures surfacing as errors, not empty tables

use chrono::NaiveDate;
use finpulse_core::config::{ExportConfig, ExportTable, PipelineConfig};
use finpulse_core::data::{DataError, DataSource, FetchResult, Lookback, PriceProvider, RawBar};
use finpulse_core::{InstrumentSet, ParquetExporter, Pipeline, PipelineError};
use std::collections::HashMap;

// ── Mock provider ────────────────────────────────────────────────────

struct StaticProvider {
    series: HashMap<String, Vec<f64>>,
    outage: bool,
}

impl StaticProvider {
    fn new(series: &[(&str, &[f64])]) -> Self {
        Self {
            series: series
                .iter()
                .map(|(s, v)| (s.to_string(), v.to_vec()))
                .collect(),
            outage: false,
        }
    }
}

impl PriceProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self, symbol: &str, _lookback: Lookback) -> Result<FetchResult, DataError> {
        if self.outage {
            return Err(DataError::RateLimited {
                retry_after_secs: 60,
            });
        }
        let prices = self.series.get(symbol).ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: prices
                .iter()
                .enumerate()
                .map(|(i, &p)| RawBar {
                    date: start + chrono::Duration::days(i as i64),
                    close: Some(p * 1.01),
                    adj_close: Some(p),
                })
                .collect(),
            source: DataSource::Synthetic,
        })
    }
}

const A: &[f64] = &[100.0, 101.0, 102.0, 103.0, 104.0, 105.0];
const B: &[f64] = &[50.0; 6];
const C: &[f64] = &[20.0, 20.5, 19.8, 20.1, 21.0, 20.7];

fn config(symbols: &[&str]) -> PipelineConfig {
    PipelineConfig {
        instruments: InstrumentSet::new(symbols),
        lookback: Lookback::OneMonth,
        ..PipelineConfig::default()
    }
}

// ── 1. Three instruments × six days ──────────────────────────────────

#[test]
fn three_by_six_scenario() {
    let provider = StaticProvider::new(&[("A", A), ("B", B), ("C", C)]);
    let out = Pipeline::new(&provider, config(&["A", "B", "C"])).run().unwrap();

    assert_eq!(out.prices.height(), 6);
    assert_eq!(out.prices.value(0, "A"), Some(100.0), "adjusted close is used");

    let returns = &out.analytics.returns;
    assert_eq!(returns.height(), 5);
    for d in 1..6 {
        let expected = A[d].ln() - A[d - 1].ln();
        assert!((returns.value(d - 1, "A").unwrap() - expected).abs() < 1e-12);
    }

    let vol = &out.analytics.volatility;
    assert_eq!(vol.get("B"), Some(0.0));
    assert!(vol.get("A").unwrap() > 0.0);
    assert!(vol.get("C").unwrap() > vol.get("A").unwrap());

    let corr = &out.analytics.correlation;
    assert!(corr.row("B").unwrap().iter().all(|v| v.is_nan()));
    assert!(corr.get("A", "B").unwrap().is_nan());
    assert_eq!(corr.get("A", "A"), Some(1.0));
    assert_eq!(corr.get("C", "C"), Some(1.0));
    assert!(corr.is_symmetric(0.0));
    let ac = corr.get("A", "C").unwrap();
    assert!((-1.0..=1.0).contains(&ac));

    let rebased = &out.analytics.rebased;
    assert_eq!(rebased.height(), 6);
    assert_eq!(rebased.row(0), Some(vec![100.0, 100.0, 100.0]));
    assert!((rebased.last("A").unwrap() - 105.0).abs() < 1e-9);
    assert_eq!(rebased.last("B"), Some(100.0));

    assert!(out.exported.is_empty());
    assert_eq!(out.dataset_hash.len(), 64);
}

// ── 2. Degenerate input ──────────────────────────────────────────────

#[test]
fn single_row_is_degenerate_not_error() {
    let provider = StaticProvider::new(&[("A", &[100.0]), ("B", &[50.0])]);
    let out = Pipeline::new(&provider, config(&["A", "B"])).run().unwrap();

    assert_eq!(out.prices.height(), 1);
    assert_eq!(out.analytics.returns.height(), 0);
    assert!(out.analytics.volatility.values().iter().all(|v| v.is_nan()));
    assert!(out
        .analytics
        .correlation
        .rows()
        .iter()
        .flatten()
        .all(|v| v.is_nan()));
}

// ── 3. Export round-trip ─────────────────────────────────────────────

#[test]
fn daily_returns_export_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("data_output");
    let provider = StaticProvider::new(&[("A", A), ("C", C)]);

    let cfg = PipelineConfig {
        export: ExportConfig {
            output_dir: output_dir.clone(),
            tables: vec![ExportTable::DailyReturns],
        },
        ..config(&["A", "C"])
    };

    let out = Pipeline::new(&provider, cfg).run().unwrap();

    let expected_path = output_dir.join("daily_returns.parquet");
    assert_eq!(out.exported, vec![(ExportTable::DailyReturns, expected_path.clone())]);
    assert!(expected_path.exists());

    let reloaded = ParquetExporter::new(&output_dir)
        .load_table("daily_returns")
        .unwrap();
    assert_eq!(reloaded, out.analytics.returns);
}

#[test]
fn rebased_export_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StaticProvider::new(&[("A", A), ("C", C)]);
    let cfg = PipelineConfig {
        export: ExportConfig {
            output_dir: dir.path().to_path_buf(),
            tables: vec![ExportTable::Rebased],
        },
        ..config(&["A", "C"])
    };

    let out = Pipeline::new(&provider, cfg).run().unwrap();
    assert_eq!(out.exported[0].1, dir.path().join("rebased.parquet"));

    let reloaded = ParquetExporter::new(dir.path())
        .load_table("rebased")
        .unwrap();
    assert_eq!(reloaded, out.analytics.rebased);
}

#[test]
fn rerun_overwrites_export() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StaticProvider::new(&[("A", A)]);
    let cfg = PipelineConfig {
        export: ExportConfig {
            output_dir: dir.path().to_path_buf(),
            tables: vec![ExportTable::Prices, ExportTable::Volatility],
        },
        ..config(&["A"])
    };

    let first = Pipeline::new(&provider, cfg.clone()).run().unwrap();
    let second = Pipeline::new(&provider, cfg).run().unwrap();

    assert_eq!(first.exported, second.exported);
    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 2);
}

#[test]
fn export_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let provider = StaticProvider::new(&[("A", A)]);
    let cfg = PipelineConfig {
        export: ExportConfig {
            output_dir: blocker,
            tables: vec![ExportTable::DailyReturns],
        },
        ..config(&["A"])
    };

    let err = Pipeline::new(&provider, cfg).run().unwrap_err();
    assert!(matches!(err, PipelineError::Export(_)));
}

// ── 4. Fetch failures ────────────────────────────────────────────────

#[test]
fn provider_outage_is_a_fetch_failure() {
    let mut provider = StaticProvider::new(&[("A", A)]);
    provider.outage = true;

    let err = Pipeline::new(&provider, config(&["A"])).run().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Data(DataError::RateLimited { .. })
    ));
}

#[test]
fn unknown_symbol_is_omitted_from_all_outputs() {
    let provider = StaticProvider::new(&[("A", A), ("C", C)]);
    let out = Pipeline::new(&provider, config(&["A", "ZZZ", "C"]))
        .run()
        .unwrap();

    assert_eq!(out.prices.instruments(), &["A", "C"]);
    assert_eq!(out.analytics.volatility.instruments(), &["A", "C"]);
    assert_eq!(out.analytics.correlation.len(), 2);
}

#[test]
fn empty_instrument_list_fails() {
    let provider = StaticProvider::new(&[]);
    let err = Pipeline::new(&provider, config(&[])).run().unwrap_err();
    assert!(matches!(err, PipelineError::Data(DataError::EmptyInstrumentSet)));
}

#[test]
fn runs_are_independent() {
    let provider = StaticProvider::new(&[("A", A), ("C", C)]);
    let pipeline = Pipeline::new(&provider, config(&["A", "C"]));

    let first = pipeline.run().unwrap();
    let second = pipeline.run().unwrap();

    assert_eq!(first.dataset_hash, second.dataset_hash);
    assert_eq!(first.analytics, second.analytics);
}
