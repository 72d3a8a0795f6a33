//! Extractor: fetch every requested instrument and produce a clean PriceTable.
//!
//! Batch semantics: a symbol the provider does not know is dropped from the
//! table (logged at warn). Any other provider failure fails the whole batch,
//! so callers never see a table built from a partial outage.

use super::align::align_symbols;
use super::clean::clean;
use super::provider::{DataError, Lookback, PriceProvider, RawBar};
use crate::domain::{InstrumentSet, PriceTable};

/// Pulls daily prices from a provider and applies the cleaning policy.
pub struct Extractor<'a> {
    provider: &'a dyn PriceProvider,
}

impl<'a> Extractor<'a> {
    pub fn new(provider: &'a dyn PriceProvider) -> Self {
        Self { provider }
    }

    /// Fetch, align and clean prices for `instruments` over `lookback`.
    ///
    /// Returns an error when the set is empty, when any fetch fails for a
    /// reason other than an unknown symbol, or when nothing usable remains
    /// after cleaning.
    pub fn extract(
        &self,
        instruments: &InstrumentSet,
        lookback: Lookback,
    ) -> Result<PriceTable, DataError> {
        if instruments.is_empty() {
            return Err(DataError::EmptyInstrumentSet);
        }

        tracing::info!(
            provider = self.provider.name(),
            %instruments,
            %lookback,
            "extracting prices"
        );

        let mut fetched: Vec<(String, Vec<RawBar>)> = Vec::with_capacity(instruments.len());
        for symbol in instruments.iter() {
            match self.provider.fetch(symbol, lookback) {
                Ok(result) => {
                    tracing::debug!(%symbol, bars = result.bars.len(), source = ?result.source, "fetched");
                    fetched.push((symbol.to_string(), result.bars));
                }
                Err(DataError::SymbolNotFound { symbol }) => {
                    tracing::warn!(%symbol, "symbol not found, omitting column");
                }
                Err(e) => {
                    tracing::error!(%symbol, error = %e, "extraction failed");
                    return Err(e);
                }
            }
        }

        if fetched.is_empty() {
            return Err(DataError::NoData {
                instruments: instruments.to_string(),
            });
        }

        let aligned = align_symbols(&fetched);
        let prices = clean(&aligned);

        if prices.is_empty() {
            return Err(DataError::NoData {
                instruments: instruments.to_string(),
            });
        }

        tracing::info!(
            instruments = prices.width(),
            rows = prices.height(),
            first = %prices.dates()[0],
            last = %prices.dates()[prices.height() - 1],
            "price table ready"
        );

        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{DataSource, FetchResult};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned provider: symbol → bars or error factory.
    struct MockProvider {
        series: HashMap<String, Vec<(u32, f64)>>,
        failing: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                series: HashMap::new(),
                failing: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with(mut self, symbol: &str, points: &[(u32, f64)]) -> Self {
            self.series.insert(symbol.into(), points.to_vec());
            self
        }
    }

    impl PriceProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn fetch(&self, symbol: &str, _lookback: Lookback) -> Result<FetchResult, DataError> {
            self.calls.lock().unwrap().push(symbol.to_string());
            if self.failing.as_deref() == Some(symbol) {
                return Err(DataError::NetworkUnreachable("connection reset".into()));
            }
            let points = self
                .series
                .get(symbol)
                .ok_or_else(|| DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })?;
            Ok(FetchResult {
                symbol: symbol.to_string(),
                bars: points
                    .iter()
                    .map(|&(day, price)| RawBar {
                        date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                        close: Some(price),
                        adj_close: None,
                    })
                    .collect(),
                source: DataSource::Synthetic,
            })
        }
    }

    #[test]
    fn empty_set_is_rejected_before_fetching() {
        let provider = MockProvider::new();
        let err = Extractor::new(&provider)
            .extract(&InstrumentSet::default(), Lookback::OneYear)
            .unwrap_err();
        assert!(matches!(err, DataError::EmptyInstrumentSet));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_symbol_is_dropped() {
        let provider = MockProvider::new().with("AAPL", &[(4, 170.0), (5, 171.0)]);
        let prices = Extractor::new(&provider)
            .extract(&InstrumentSet::new(["AAPL", "NOPE"]), Lookback::OneMonth)
            .unwrap();
        assert_eq!(prices.instruments(), &["AAPL"]);
        assert_eq!(prices.height(), 2);
    }

    #[test]
    fn all_symbols_unknown_is_no_data() {
        let provider = MockProvider::new();
        let err = Extractor::new(&provider)
            .extract(&InstrumentSet::new(["X", "Y"]), Lookback::OneYear)
            .unwrap_err();
        assert!(matches!(err, DataError::NoData { .. }));
    }

    #[test]
    fn network_failure_fails_whole_batch() {
        let mut provider = MockProvider::new()
            .with("AAPL", &[(4, 170.0)])
            .with("MSFT", &[(4, 400.0)]);
        provider.failing = Some("MSFT".into());

        let err = Extractor::new(&provider)
            .extract(&InstrumentSet::new(["AAPL", "MSFT"]), Lookback::OneYear)
            .unwrap_err();
        assert!(matches!(err, DataError::NetworkUnreachable(_)));
    }

    #[test]
    fn exchange_holidays_are_forward_filled() {
        // GC=F does not trade on the 6th; BTC-USD trades every day
        let provider = MockProvider::new()
            .with("BTC-USD", &[(4, 60000.0), (5, 61000.0), (6, 62000.0), (7, 61500.0)])
            .with("GC=F", &[(4, 2100.0), (5, 2110.0), (7, 2120.0)]);

        let prices = Extractor::new(&provider)
            .extract(&InstrumentSet::new(["BTC-USD", "GC=F"]), Lookback::FiveDays)
            .unwrap();

        assert_eq!(prices.height(), 4);
        assert_eq!(prices.value(2, "GC=F"), Some(2110.0));
    }

    #[test]
    fn late_listing_trims_leading_rows() {
        let provider = MockProvider::new()
            .with("OLD", &[(4, 1.0), (5, 2.0), (6, 3.0)])
            .with("NEW", &[(6, 10.0)]);

        let prices = Extractor::new(&provider)
            .extract(&InstrumentSet::new(["OLD", "NEW"]), Lookback::OneMonth)
            .unwrap();

        assert_eq!(prices.height(), 1);
        assert_eq!(prices.row(0), Some(vec![3.0, 10.0]));
    }
}
